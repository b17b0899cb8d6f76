//! Creates the database schema.

use rusqlite::{Connection, Transaction, TransactionBehavior};

use crate::{
    Error,
    account::create_account_table,
    auth::create_user_table,
    bill::create_bill_tables,
    contact::create_contact_table,
    invoice::create_invoice_tables,
    ledger::create_journal_tables,
    organization::create_organization_table,
    pos::create_sale_tables,
    stock::create_stock_tables,
};

/// Create the tables for all the domain models if they do not exist.
///
/// Foreign key enforcement is switched on for `connection`, since SQLite
/// leaves it off by default.
///
/// # Errors
///
/// Returns an [Error::SqlError] if any of the tables could not be created.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    // This pragma is a no-op inside a transaction, so it must come first.
    connection.pragma_update(None, "foreign_keys", "ON")?;

    let transaction = Transaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_organization_table(&transaction)?;
    create_user_table(&transaction)?;
    create_account_table(&transaction)?;
    create_journal_tables(&transaction)?;
    create_contact_table(&transaction)?;
    create_invoice_tables(&transaction)?;
    create_bill_tables(&transaction)?;
    create_stock_tables(&transaction)?;
    create_sale_tables(&transaction)?;

    transaction.commit()?;

    Ok(())
}

#[cfg(test)]
mod initialize_tests {
    use rusqlite::Connection;

    use crate::db::initialize;

    #[test]
    fn initialize_is_idempotent() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();
        initialize(&connection).unwrap();
    }

    #[test]
    fn enables_foreign_keys() {
        let connection = Connection::open_in_memory().unwrap();

        initialize(&connection).unwrap();

        let enabled: bool = connection
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert!(enabled);
    }
}
