//! Customers and vendors.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error, auth::normalize_email, organization::OrganizationId, sql_enum::sql_text_enum,
};

pub type ContactId = i64;

/// Whether a contact is invoiced (customer) or billed by (vendor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactKind {
    Customer,
    Vendor,
}

impl ContactKind {
    pub const ALL: [ContactKind; 2] = [ContactKind::Customer, ContactKind::Vendor];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContactKind::Customer => "customer",
            ContactKind::Vendor => "vendor",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ContactKind::Customer => "Customer",
            ContactKind::Vendor => "Vendor",
        }
    }
}

sql_text_enum!(ContactKind);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub organization_id: OrganizationId,
    pub name: String,
    pub email: Option<String>,
    pub kind: ContactKind,
}

pub fn create_contact_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS contact (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            name TEXT NOT NULL,
            email TEXT,
            kind TEXT NOT NULL
        )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_contact_organization ON contact(organization_id, kind)",
        (),
    )?;

    Ok(())
}

fn map_row_to_contact(row: &Row) -> Result<Contact, rusqlite::Error> {
    Ok(Contact {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        email: row.get(3)?,
        kind: row.get(4)?,
    })
}

/// Add a customer or vendor.
///
/// # Errors
///
/// - [Error::EmptyField] if the trimmed name is empty.
/// - [Error::InvalidEmail] if an email is given but is not an email address.
pub fn create_contact(
    organization_id: OrganizationId,
    name: &str,
    email: Option<&str>,
    kind: ContactKind,
    connection: &Connection,
) -> Result<Contact, Error> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::EmptyField("Contact name"));
    }

    let email = email
        .map(str::trim)
        .filter(|email| !email.is_empty())
        .map(normalize_email)
        .transpose()?;

    connection.execute(
        "INSERT INTO contact (organization_id, name, email, kind) VALUES (?1, ?2, ?3, ?4)",
        (organization_id, name, &email, kind),
    )?;

    Ok(Contact {
        id: connection.last_insert_rowid(),
        organization_id,
        name: name.to_owned(),
        email,
        kind,
    })
}

pub fn get_contact(
    organization_id: OrganizationId,
    contact_id: ContactId,
    connection: &Connection,
) -> Result<Contact, Error> {
    connection
        .query_row(
            "SELECT id, organization_id, name, email, kind FROM contact
            WHERE id = ?1 AND organization_id = ?2",
            (contact_id, organization_id),
            map_row_to_contact,
        )
        .map_err(Error::from)
}

/// Get a contact and check that it is of the expected kind.
///
/// # Errors
///
/// Returns [Error::InvalidContact] if the contact does not exist in the
/// organization or is of another kind.
pub fn get_contact_of_kind(
    organization_id: OrganizationId,
    contact_id: ContactId,
    kind: ContactKind,
    connection: &Connection,
) -> Result<Contact, Error> {
    let contact = match get_contact(organization_id, contact_id, connection) {
        Ok(contact) => contact,
        Err(Error::NotFound) => {
            return Err(Error::InvalidContact(format!(
                "contact {contact_id} does not exist"
            )));
        }
        Err(error) => return Err(error),
    };

    if contact.kind != kind {
        return Err(Error::InvalidContact(format!(
            "{} is not a {}",
            contact.name,
            kind.label().to_lowercase()
        )));
    }

    Ok(contact)
}

/// The organization's contacts ordered by name, optionally only one kind.
pub fn list_contacts(
    organization_id: OrganizationId,
    kind: Option<ContactKind>,
    connection: &Connection,
) -> Result<Vec<Contact>, Error> {
    connection
        .prepare(
            "SELECT id, organization_id, name, email, kind FROM contact
            WHERE organization_id = ?1 AND (?2 IS NULL OR kind = ?2)
            ORDER BY name COLLATE NOCASE, id",
        )?
        .query_map((organization_id, kind), map_row_to_contact)?
        .map(|maybe_contact| maybe_contact.map_err(Error::from))
        .collect()
}

/// Delete a contact that no invoice or bill refers to.
///
/// # Errors
///
/// - [Error::NotFound] if the contact does not exist in the organization.
/// - [Error::ContactInUse] if an invoice or bill refers to the contact.
pub fn delete_contact(
    organization_id: OrganizationId,
    contact_id: ContactId,
    connection: &Connection,
) -> Result<(), Error> {
    get_contact(organization_id, contact_id, connection)?;

    let document_count: i64 = connection.query_row(
        "SELECT (SELECT COUNT(*) FROM invoice WHERE customer_id = ?1)
            + (SELECT COUNT(*) FROM bill WHERE vendor_id = ?1)",
        (contact_id,),
        |row| row.get(0),
    )?;

    if document_count > 0 {
        return Err(Error::ContactInUse);
    }

    connection.execute(
        "DELETE FROM contact WHERE id = ?1 AND organization_id = ?2",
        (contact_id, organization_id),
    )?;

    Ok(())
}

#[cfg(test)]
mod contact_tests {
    use crate::{
        Error,
        contact::{
            ContactKind, create_contact, delete_contact, get_contact, get_contact_of_kind,
            list_contacts,
        },
        test_utils::TestBooks,
    };

    #[test]
    fn create_trims_name_and_normalizes_email() {
        let books = TestBooks::standard();

        let contact = create_contact(
            books.organization_id(),
            "  Acme Ltd ",
            Some(" Accounts@Acme.test "),
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();

        assert_eq!(contact.name, "Acme Ltd");
        assert_eq!(contact.email.as_deref(), Some("accounts@acme.test"));
        assert_eq!(
            get_contact(books.organization_id(), contact.id, &books.connection),
            Ok(contact)
        );
    }

    #[test]
    fn blank_name_is_rejected() {
        let books = TestBooks::standard();

        let got = create_contact(
            books.organization_id(),
            "   ",
            None,
            ContactKind::Vendor,
            &books.connection,
        );

        assert_eq!(got, Err(Error::EmptyField("Contact name")));
    }

    #[test]
    fn blank_email_is_stored_as_none() {
        let books = TestBooks::standard();

        let contact = create_contact(
            books.organization_id(),
            "Walk-in",
            Some(""),
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();

        assert_eq!(contact.email, None);
    }

    #[test]
    fn list_filters_by_kind() {
        let books = TestBooks::standard();
        let org = books.organization_id();
        create_contact(org, "Zed", None, ContactKind::Customer, &books.connection).unwrap();
        create_contact(org, "Paper Co", None, ContactKind::Vendor, &books.connection).unwrap();
        create_contact(org, "alpha", None, ContactKind::Customer, &books.connection).unwrap();

        let customers = list_contacts(org, Some(ContactKind::Customer), &books.connection).unwrap();
        let everyone = list_contacts(org, None, &books.connection).unwrap();

        let names: Vec<&str> = customers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Zed"]);
        assert_eq!(everyone.len(), 3);
    }

    #[test]
    fn kind_check_rejects_vendor_as_customer() {
        let books = TestBooks::standard();
        let vendor = create_contact(
            books.organization_id(),
            "Paper Co",
            None,
            ContactKind::Vendor,
            &books.connection,
        )
        .unwrap();

        let got = get_contact_of_kind(
            books.organization_id(),
            vendor.id,
            ContactKind::Customer,
            &books.connection,
        );

        assert!(matches!(got, Err(Error::InvalidContact(_))));
    }

    #[test]
    fn contacts_are_scoped_to_organization() {
        let books = TestBooks::standard();
        let other = books.other_organization();
        let foreign =
            create_contact(other, "Theirs", None, ContactKind::Customer, &books.connection)
                .unwrap();

        assert_eq!(
            get_contact(books.organization_id(), foreign.id, &books.connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            delete_contact(books.organization_id(), foreign.id, &books.connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn delete_unused_contact() {
        let books = TestBooks::standard();
        let contact = create_contact(
            books.organization_id(),
            "Gone Soon",
            None,
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();

        delete_contact(books.organization_id(), contact.id, &books.connection).unwrap();

        assert_eq!(
            get_contact(books.organization_id(), contact.id, &books.connection),
            Err(Error::NotFound)
        );
    }
}
