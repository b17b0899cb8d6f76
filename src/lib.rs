//! LedgerDesk is a web app for running the books of a small business.
//!
//! Each organization gets a double-entry ledger with a chart of accounts,
//! invoices and bills, stock tracking, a point of sale register and the
//! usual financial reports. Pages are rendered on the server and served
//! directly as HTML.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod account;
mod alert;
mod app_state;
mod auth;
mod bill;
mod contact;
mod dashboard;
mod db;
mod demo;
mod document;
mod endpoints;
mod error;
mod export;
mod form;
mod html;
mod internal_server_error;
mod invoice;
mod ledger;
mod logging;
mod money;
mod navigation;
mod not_found;
mod organization;
mod pagination;
mod pos;
mod report;
mod routing;
mod sql_enum;
mod stock;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{PasswordHash, User, UserID, ValidatedPassword, get_user_by_email, update_password};
pub use db::initialize as initialize_db;
pub use demo::{DEMO_ORGANIZATION_NAME, create_demo_books};
pub use error::Error;
pub use logging::logging_middleware;
pub use pagination::PaginationConfig;
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("could not listen for ctrl+c: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(error) => {
                tracing::error!("could not listen for the terminate signal: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
