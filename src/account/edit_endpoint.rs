//! Defines the endpoints for updating and archiving an account.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use serde::Deserialize;

use crate::{
    Error,
    account::{AccountId, form::AccountForm, set_account_archived, update_account},
    app_state::DbState,
    endpoints,
    organization::Tenant,
};

fn redirect_to_accounts() -> Response {
    (
        HxRedirect(endpoints::ACCOUNTS_VIEW.to_owned()),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

pub async fn edit_account_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(account_id): Path<AccountId>,
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

    match update_account(tenant.organization_id, account_id, details, &connection) {
        Ok(_) => redirect_to_accounts(),
        Err(error) => {
            tracing::debug!("Could not update account {account_id}: {error}");
            error.into_alert_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ArchiveForm {
    pub archived: bool,
}

/// Archive or restore an account. Archived accounts keep their history but
/// cannot be posted to.
pub async fn archive_account_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(account_id): Path<AccountId>,
    Form(form): Form<ArchiveForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match set_account_archived(
        tenant.organization_id,
        account_id,
        form.archived,
        &connection,
    ) {
        Ok(()) => redirect_to_accounts(),
        Err(error) => error.into_alert_response(),
    }
}
