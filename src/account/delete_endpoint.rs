//! Defines the endpoint for deleting an account.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use crate::{
    Error,
    account::{AccountId, delete_account},
    alert::Alert,
    app_state::DbState,
    organization::Tenant,
};

/// A route handler for deleting an account, responds with an alert.
///
/// Accounts with postings, children or a role are refused and should be
/// archived instead.
pub async fn delete_account_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(account_id): Path<AccountId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_account(tenant.organization_id, account_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Account deleted successfully".to_owned(),
        }
        .into_response(),
        Err(error) => {
            tracing::debug!("Could not delete account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}
