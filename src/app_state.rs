//! The state shared by every request handler, and the slices of it that handlers extract.

use std::sync::{Arc, Mutex};

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;
use rusqlite::Connection;
use sha2::{Digest, Sha512};
use time::Duration;

use crate::{Error, auth::DEFAULT_COOKIE_DURATION, db::initialize, pagination::PaginationConfig};

/// The state of the web server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Signs and encrypts the auth cookie.
    pub cookie_key: Key,

    /// How long a log in lasts without "remember me".
    pub cookie_duration: Duration,

    /// The canonical name of the timezone that decides what "today" is for
    /// document dates and report defaults, e.g. "Pacific/Auckland".
    pub local_timezone: String,

    /// Page sizes for the journal and other long lists.
    pub pagination_config: PaginationConfig,

    /// The database holding every organization's books.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create the server state, creating any missing tables in `db_connection`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        cookie_secret: &str,
        local_timezone: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            cookie_key: create_cookie_key(cookie_secret),
            cookie_duration: DEFAULT_COOKIE_DURATION,
            local_timezone: local_timezone.to_owned(),
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

/// Derive the cookie key from `secret`, so that sessions survive a restart.
pub fn create_cookie_key(secret: &str) -> Key {
    let hash = Sha512::digest(secret);

    Key::from(&hash)
}

/// The database and the local timezone, which is all most pages and forms need.
#[derive(Debug, Clone)]
pub struct DbState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub local_timezone: String,
}

impl FromRef<AppState> for DbState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// The state for paginated lists such as the journal.
#[derive(Debug, Clone)]
pub struct ListState {
    pub db_connection: Arc<Mutex<Connection>>,
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

#[cfg(test)]
mod app_state_tests {
    use rusqlite::Connection;

    use crate::{
        AppState,
        app_state::create_cookie_key,
        pagination::PaginationConfig,
        test_utils::TEST_TIMEZONE,
    };

    #[test]
    fn same_secret_gives_same_key() {
        assert_eq!(
            create_cookie_key("a fairly long secret").master(),
            create_cookie_key("a fairly long secret").master()
        );
        assert_ne!(
            create_cookie_key("a fairly long secret").master(),
            create_cookie_key("another secret").master()
        );
    }

    #[test]
    fn new_state_creates_tables() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "a fairly long secret",
            TEST_TIMEZONE,
            PaginationConfig::default(),
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let organizations: i64 = connection
            .query_row("SELECT COUNT(*) FROM organization", [], |row| row.get(0))
            .unwrap();
        assert_eq!(organizations, 0);
    }
}
