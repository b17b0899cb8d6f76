//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::{
    Error, auth::PasswordHash, error::is_unique_violation, organization::OrganizationId,
};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application. Every user belongs to exactly one organization.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserID,
    pub organization_id: OrganizationId,
    pub email: String,
    pub password_hash: PasswordHash,
}

/// Check that `email` looks like an address: some text, an '@', then more text.
///
/// Returns the trimmed, lowercased address.
///
/// # Errors
///
/// Returns [Error::InvalidEmail] otherwise.
pub fn normalize_email(email: &str) -> Result<String, Error> {
    let email = email.trim().to_lowercase();

    match email.split_once('@') {
        Some((local, domain))
            if !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.contains(char::is_whitespace) =>
        {
            Ok(email)
        }
        _ => Err(Error::InvalidEmail(email)),
    }
}

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            email TEXT NOT NULL UNIQUE,
            password TEXT NOT NULL
        )",
        (),
    )?;

    Ok(())
}

fn map_row_to_user(row: &Row) -> Result<User, rusqlite::Error> {
    let raw_password_hash: String = row.get(3)?;

    Ok(User {
        id: UserID::new(row.get(0)?),
        organization_id: row.get(1)?,
        email: row.get(2)?,
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// - [Error::InvalidEmail] if the email address is malformed.
/// - [Error::DuplicateEmail] if the email address is already registered.
pub fn create_user(
    organization_id: OrganizationId,
    email: &str,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let email = normalize_email(email)?;

    connection
        .execute(
            "INSERT INTO user (organization_id, email, password) VALUES (?1, ?2, ?3)",
            (organization_id, &email, password_hash.as_ref()),
        )
        .map_err(|error| {
            if is_unique_violation(&error, "user.email") {
                Error::DuplicateEmail(email.clone())
            } else {
                error.into()
            }
        })?;

    Ok(User {
        id: UserID::new(connection.last_insert_rowid()),
        organization_id,
        email,
        password_hash,
    })
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, organization_id, email, password FROM user WHERE id = ?1",
            (user_id.as_i64(),),
            map_row_to_user,
        )
        .map_err(Error::from)
}

/// Get the user registered with `email`, ignoring case.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has that email.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .query_row(
            "SELECT id, organization_id, email, password FROM user WHERE email = ?1",
            (email.trim().to_lowercase(),),
            map_row_to_user,
        )
        .map_err(Error::from)
}

/// Replace a user's password hash.
pub fn update_password(
    user_id: UserID,
    password_hash: &PasswordHash,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1 WHERE id = ?2",
        (password_hash.as_ref(), user_id.as_i64()),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

#[cfg(test)]
mod user_tests {
    use rusqlite::Connection;

    use crate::{
        Error,
        account::ChartTemplate,
        auth::{
            PasswordHash, UserID, create_user, get_user_by_email, get_user_by_id,
            normalize_email, update_password,
        },
        db::initialize,
        organization::create_organization,
    };

    fn get_db_connection() -> (Connection, i64) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let organization =
            create_organization("Acme", ChartTemplate::Standard, &connection).unwrap();

        (connection, organization.id)
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(
            normalize_email("  Owner@Example.COM "),
            Ok("owner@example.com".to_owned())
        );
    }

    #[test]
    fn normalize_email_rejects_malformed_addresses() {
        for email in ["", "owner", "@example.com", "owner@", "a@b@c", "a b@c.com"] {
            assert!(
                matches!(normalize_email(email), Err(Error::InvalidEmail(_))),
                "want error for {email:?}"
            );
        }
    }

    #[test]
    fn insert_user_succeeds() {
        let (connection, organization_id) = get_db_connection();
        let password_hash = PasswordHash::new_unchecked("hunter2");

        let inserted_user = create_user(
            organization_id,
            "owner@example.com",
            password_hash.clone(),
            &connection,
        )
        .unwrap();

        assert!(inserted_user.id.as_i64() > 0);
        assert_eq!(inserted_user.password_hash, password_hash);
        assert_eq!(
            get_user_by_id(inserted_user.id, &connection),
            Ok(inserted_user.clone())
        );
        assert_eq!(
            get_user_by_email("OWNER@example.com", &connection),
            Ok(inserted_user)
        );
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let (connection, organization_id) = get_db_connection();
        create_user(
            organization_id,
            "owner@example.com",
            PasswordHash::new_unchecked("hunter2"),
            &connection,
        )
        .unwrap();

        let result = create_user(
            organization_id,
            "Owner@Example.com",
            PasswordHash::new_unchecked("hunter3"),
            &connection,
        );

        assert_eq!(
            result,
            Err(Error::DuplicateEmail("owner@example.com".to_owned()))
        );
    }

    #[test]
    fn get_missing_user_is_not_found() {
        let (connection, _) = get_db_connection();

        assert_eq!(
            get_user_by_id(UserID::new(42), &connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn update_password_replaces_hash() {
        let (connection, organization_id) = get_db_connection();
        let user = create_user(
            organization_id,
            "owner@example.com",
            PasswordHash::new_unchecked("old"),
            &connection,
        )
        .unwrap();
        let new_hash = PasswordHash::new_unchecked("new");

        update_password(user.id, &new_hash, &connection).unwrap();

        assert_eq!(
            get_user_by_id(user.id, &connection).unwrap().password_hash,
            new_hash
        );
    }
}
