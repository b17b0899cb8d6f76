//! Defines the endpoint for creating a new account.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;

use crate::{
    Error,
    account::{create_account, form::AccountForm},
    app_state::DbState,
    endpoints,
    organization::Tenant,
};

/// A route handler for creating a new account, redirects to the accounts view on success.
pub async fn create_account_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<AccountForm>,
) -> Response {
    let details = match form.into_details() {
        Ok(details) => details,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_account(tenant.organization_id, details, &connection) {
        Ok(_) => (
            HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not create account: {error}");
            error.into_alert_response()
        }
    }
}
