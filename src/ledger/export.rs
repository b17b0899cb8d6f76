use axum::{Extension, extract::State, response::Response};

use crate::{
    Error, app_state::DbState, export::csv_response, ledger::journal_export_rows,
    organization::Tenant,
};

/// Download every journal line in the organization as CSV.
pub async fn get_journal_csv(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let rows = {
        let connection = state
            .db_connection
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
            .map_err(|_| Error::DatabaseLockError)?;

        journal_export_rows(tenant.organization_id, &connection)?
    };

    csv_response("journal.csv", &rows)
}
