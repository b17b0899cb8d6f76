use std::sync::{Arc, Mutex};

use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};

use crate::{
    account::{Account, ChartTemplate, list_accounts},
    app_state::{DbState, ListState},
    auth::{DEFAULT_COOKIE_DURATION, LoginState, PasswordHash, ValidatedPassword, create_user},
    db::initialize,
    organization::{OrganizationId, Tenant, create_organization},
    pagination::PaginationConfig,
};

pub(crate) const TEST_EMAIL: &str = "owner@example.com";
pub(crate) const TEST_PASSWORD: &str = "correct-horse-battery-staple";
pub(crate) const TEST_TIMEZONE: &str = "Etc/UTC";

/// An in-memory database holding one organization and its owner.
pub(crate) struct TestBooks {
    pub connection: Connection,
    pub tenant: Tenant,
}

impl TestBooks {
    /// Books with the service business chart of accounts.
    pub fn standard() -> Self {
        Self::new(ChartTemplate::Standard)
    }

    /// Books with the retail chart of accounts, which has every account role.
    pub fn retail() -> Self {
        Self::new(ChartTemplate::Retail)
    }

    fn new(template: ChartTemplate) -> Self {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let tenant = create_tenant("Test Books", TEST_EMAIL, template, &connection);

        Self { connection, tenant }
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.tenant.organization_id
    }

    /// Create a second organization in the same database.
    pub fn other_organization(&self) -> OrganizationId {
        self.other_tenant().organization_id
    }

    /// Create a second organization with its own owner in the same database.
    pub fn other_tenant(&self) -> Tenant {
        let count: i64 = self
            .connection
            .query_row("SELECT COUNT(*) FROM organization", (), |row| row.get(0))
            .unwrap();

        create_tenant(
            "Other Books",
            &format!("other{count}@example.com"),
            ChartTemplate::Retail,
            &self.connection,
        )
    }

    /// Find an account by code in any organization in the database.
    #[track_caller]
    pub fn account_in(&self, organization_id: OrganizationId, code: &str) -> Account {
        list_accounts(organization_id, &self.connection)
            .unwrap()
            .into_iter()
            .find(|account| account.code.as_str() == code)
            .unwrap_or_else(|| panic!("no account with code {code}"))
    }

    pub fn into_connection(self) -> (Arc<Mutex<Connection>>, Tenant) {
        (Arc::new(Mutex::new(self.connection)), self.tenant)
    }

    pub fn db_state(self) -> (DbState, Tenant) {
        let (db_connection, tenant) = self.into_connection();

        (
            DbState {
                db_connection,
                local_timezone: TEST_TIMEZONE.to_owned(),
            },
            tenant,
        )
    }

    pub fn list_state(self) -> (ListState, Tenant) {
        let (db_connection, tenant) = self.into_connection();

        (
            ListState {
                db_connection,
                pagination_config: PaginationConfig::default(),
            },
            tenant,
        )
    }

    pub fn login_state(self) -> LoginState {
        let (db_connection, _) = self.into_connection();

        LoginState {
            cookie_key: Key::from(&Sha512::digest("foobar")),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            db_connection,
        }
    }
}

fn create_tenant(
    name: &str,
    email: &str,
    template: ChartTemplate,
    connection: &Connection,
) -> Tenant {
    let organization = create_organization(name, template, connection).unwrap();
    // The minimum bcrypt cost keeps the tests fast.
    let password_hash =
        PasswordHash::new(ValidatedPassword::new_unchecked(TEST_PASSWORD), 4).unwrap();
    let user = create_user(organization.id, email, password_hash, connection).unwrap();

    Tenant {
        user_id: user.id,
        organization_id: organization.id,
    }
}

/// Find an account in the test organization by its code.
#[track_caller]
pub(crate) fn account_by_code(books: &TestBooks, code: &str) -> Account {
    books.account_in(books.organization_id(), code)
}

