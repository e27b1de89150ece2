//! A personal expense tracker.
//!
//! This library provides a JSON REST API for recording expenses and viewing
//! them filtered, sorted, and summarized by category. Amounts are stored in
//! minor units (e.g., cents) and creating an expense can be made safe to
//! retry with an `Idempotency-Key` header.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod clock;
mod database_id;
mod db;
mod endpoints;
mod error;
mod expense;
mod logging;
mod routing;
mod timezone;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use clock::MonotonicClock;
pub use database_id::ExpenseId;
pub use db::initialize as initialize_db;
pub use endpoints::{EXPENSE_SUMMARY, EXPENSES, IDEMPOTENCY_KEY_HEADER};
pub use error::{Error, ErrorBody};
pub use expense::{
    AmountInput, CategorySummary, CreatedExpense, Expense, ExpenseForm, ExpenseQuery,
    MAX_AMOUNT_MINOR_UNITS, MAX_DESCRIPTION_LENGTH, NewExpense, SortOrder, ValidationError, count_expenses,
    create_expense, get_expense, get_expense_by_idempotency_key, list_expenses,
    summarize_expenses, to_minor_units, validate_expense,
};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_REQUEST_BODY_SIZE, logging_middleware};
pub use routing::build_router;
pub use timezone::{get_local_offset, local_today};

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install signal handler: {error}");
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
