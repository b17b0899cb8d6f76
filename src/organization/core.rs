use rusqlite::{Connection, Row};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{ChartTemplate, seed_chart_of_accounts},
    auth::UserID,
};

pub type OrganizationId = i64;

/// An isolated set of books.
#[derive(Debug, Clone, PartialEq)]
pub struct Organization {
    pub id: OrganizationId,
    pub name: String,
    /// The last day of the most recently closed period.
    ///
    /// Nothing may be posted on or before this date.
    pub lock_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

/// The logged in user and the organization whose books they are working in.
///
/// The auth middleware inserts this into every protected request, and every
/// query for business data is scoped by `organization_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tenant {
    pub user_id: UserID,
    pub organization_id: OrganizationId,
}

pub fn create_organization_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS organization (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            lock_date TEXT,
            created_at TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_organization(row: &Row) -> Result<Organization, rusqlite::Error> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        lock_date: row.get(2)?,
        created_at: row.get(3)?,
    })
}

/// Create an organization and seed its chart of accounts from `template`.
///
/// Both happen in one transaction.
///
/// # Errors
///
/// Returns [Error::EmptyField] if `name` is blank, or an SQL error.
pub fn create_organization(
    name: &str,
    template: ChartTemplate,
    connection: &Connection,
) -> Result<Organization, Error> {
    let transaction = connection.unchecked_transaction()?;
    let organization = insert_organization_with_chart(name, template, &transaction)?;
    transaction.commit()?;

    Ok(organization)
}

/// Insert the organization and its chart of accounts without starting a transaction.
///
/// Callers that need to write other rows atomically with the organization,
/// e.g. the owner's user account, wrap this in their own transaction.
pub(crate) fn insert_organization_with_chart(
    name: &str,
    template: ChartTemplate,
    connection: &Connection,
) -> Result<Organization, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyField("Organization name"));
    }

    let created_at = OffsetDateTime::now_utc();
    connection.execute(
        "INSERT INTO organization (name, lock_date, created_at) VALUES (?1, NULL, ?2)",
        (name, created_at),
    )?;
    let id = connection.last_insert_rowid();

    seed_chart_of_accounts(id, template, connection)?;

    Ok(Organization {
        id,
        name: name.to_owned(),
        lock_date: None,
        created_at,
    })
}

pub fn get_organization(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Organization, Error> {
    connection
        .query_row(
            "SELECT id, name, lock_date, created_at FROM organization WHERE id = ?1",
            (organization_id,),
            map_row_to_organization,
        )
        .map_err(Error::from)
}

pub fn rename_organization(
    organization_id: OrganizationId,
    name: &str,
    connection: &Connection,
) -> Result<(), Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyField("Organization name"));
    }

    let rows_affected = connection.execute(
        "UPDATE organization SET name = ?1 WHERE id = ?2",
        (name, organization_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Close the books up to and including `through`.
///
/// # Errors
///
/// - [Error::FutureDate] if `through` is after `today`.
/// - [Error::LockDateBackwards] if the books are already closed past `through`.
pub fn close_period(
    organization_id: OrganizationId,
    through: Date,
    today: Date,
    connection: &Connection,
) -> Result<Organization, Error> {
    if through > today {
        return Err(Error::FutureDate(through));
    }

    let organization = get_organization(organization_id, connection)?;
    if let Some(lock_date) = organization.lock_date {
        if through < lock_date {
            return Err(Error::LockDateBackwards(lock_date));
        }
    }

    // The condition guards against a concurrent close moving the date further.
    let rows_affected = connection.execute(
        "UPDATE organization SET lock_date = ?1
        WHERE id = ?2 AND (lock_date IS NULL OR lock_date <= ?1)",
        (through, organization_id),
    )?;

    if rows_affected == 0 {
        let current = get_organization(organization_id, connection)?;
        return Err(Error::LockDateBackwards(current.lock_date.unwrap_or(through)));
    }

    Ok(Organization {
        lock_date: Some(through),
        ..organization
    })
}

/// Check that `date` falls in an open period.
///
/// # Errors
///
/// Returns [Error::PeriodLocked] if `date` is on or before the lock date.
pub fn ensure_period_open(
    organization_id: OrganizationId,
    date: Date,
    connection: &Connection,
) -> Result<(), Error> {
    let lock_date: Option<Date> = connection.query_row(
        "SELECT lock_date FROM organization WHERE id = ?1",
        (organization_id,),
        |row| row.get(0),
    )?;

    match lock_date {
        Some(lock_date) if date <= lock_date => Err(Error::PeriodLocked(lock_date)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod organization_tests {
    use rusqlite::Connection;
    use time::macros::date;

    use crate::{
        Error,
        account::{AccountRole, ChartTemplate, get_account_by_role},
        db::initialize,
        organization::{
            close_period, create_organization, ensure_period_open, get_organization,
            rename_organization,
        },
    };

    fn get_connection() -> Connection {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        connection
    }

    #[test]
    fn create_seeds_chart_of_accounts() {
        let connection = get_connection();

        let organization =
            create_organization("Corner Store", ChartTemplate::Retail, &connection).unwrap();

        assert_eq!(organization.name, "Corner Store");
        assert_eq!(organization.lock_date, None);
        assert!(
            get_account_by_role(organization.id, AccountRole::Inventory, &connection).is_ok()
        );
    }

    #[test]
    fn create_rejects_blank_name() {
        let connection = get_connection();

        let result = create_organization("   ", ChartTemplate::Standard, &connection);

        assert_eq!(result, Err(Error::EmptyField("Organization name")));
    }

    #[test]
    fn rename_trims_name() {
        let connection = get_connection();
        let organization =
            create_organization("Old", ChartTemplate::Standard, &connection).unwrap();

        rename_organization(organization.id, "  New  ", &connection).unwrap();

        let got = get_organization(organization.id, &connection).unwrap();
        assert_eq!(got.name, "New");
    }

    #[test]
    fn close_period_sets_lock_date() {
        let connection = get_connection();
        let organization =
            create_organization("Acme", ChartTemplate::Standard, &connection).unwrap();

        let got = close_period(
            organization.id,
            date!(2025 - 03 - 31),
            date!(2025 - 04 - 02),
            &connection,
        )
        .unwrap();

        assert_eq!(got.lock_date, Some(date!(2025 - 03 - 31)));
        assert_eq!(
            get_organization(organization.id, &connection)
                .unwrap()
                .lock_date,
            Some(date!(2025 - 03 - 31))
        );
    }

    #[test]
    fn close_period_cannot_move_backwards() {
        let connection = get_connection();
        let organization =
            create_organization("Acme", ChartTemplate::Standard, &connection).unwrap();
        let today = date!(2025 - 06 - 01);
        close_period(organization.id, date!(2025 - 03 - 31), today, &connection).unwrap();

        let result = close_period(organization.id, date!(2025 - 02 - 28), today, &connection);

        assert_eq!(result, Err(Error::LockDateBackwards(date!(2025 - 03 - 31))));
    }

    #[test]
    fn close_period_rejects_future_dates() {
        let connection = get_connection();
        let organization =
            create_organization("Acme", ChartTemplate::Standard, &connection).unwrap();

        let result = close_period(
            organization.id,
            date!(2025 - 06 - 02),
            date!(2025 - 06 - 01),
            &connection,
        );

        assert_eq!(result, Err(Error::FutureDate(date!(2025 - 06 - 02))));
    }

    #[test]
    fn dates_on_lock_date_are_locked() {
        let connection = get_connection();
        let organization =
            create_organization("Acme", ChartTemplate::Standard, &connection).unwrap();
        close_period(
            organization.id,
            date!(2025 - 03 - 31),
            date!(2025 - 06 - 01),
            &connection,
        )
        .unwrap();

        assert_eq!(
            ensure_period_open(organization.id, date!(2025 - 03 - 31), &connection),
            Err(Error::PeriodLocked(date!(2025 - 03 - 31)))
        );
        assert_eq!(
            ensure_period_open(organization.id, date!(2025 - 04 - 01), &connection),
            Ok(())
        );
    }
}
