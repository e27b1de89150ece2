//! Defines the endpoint for creating a new expense.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    clock::MonotonicClock,
    db::lock_connection,
    endpoints::IDEMPOTENCY_KEY_HEADER,
    expense::{CreatedExpense, Expense, ExpenseForm, create_expense, validate_expense},
    timezone::local_today,
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
    /// Stamps when the expense was recorded.
    pub clock: MonotonicClock,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            local_timezone: state.local_timezone.clone(),
            clock: state.clock.clone(),
        }
    }
}

/// A route handler for creating a new expense.
///
/// Responds with `201 Created` and the stored expense, or `200 OK` and the
/// expense that was stored earlier if the `Idempotency-Key` header repeats a
/// key that has already been used.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    headers: HeaderMap,
    payload: Result<Json<ExpenseForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Expense>), Error> {
    let Json(form) = payload.map_err(|rejection| {
        tracing::debug!("could not read expense body: {rejection}");
        Error::BadRequest(rejection.body_text())
    })?;

    let idempotency_key = get_idempotency_key(&headers)?;
    let today = local_today(&state.local_timezone)?;

    let new_expense = validate_expense(form, today).inspect_err(|error| {
        tracing::info!("rejected expense: {error}");
    })?;

    let connection = lock_connection(&state.db_connection)?;
    // Read the clock while holding the lock so that creation times follow
    // insertion order.
    let created_at = state.clock.now();

    let created = create_expense(new_expense, idempotency_key, created_at, &connection)
        .inspect_err(|error| tracing::error!("could not create expense: {error}"))?;

    match created {
        CreatedExpense::Inserted(expense) => {
            tracing::info!("created expense {}", expense.id);
            Ok((StatusCode::CREATED, Json(expense)))
        }
        CreatedExpense::Existing(expense) => {
            tracing::info!("replayed expense {} for repeated idempotency key", expense.id);
            Ok((StatusCode::OK, Json(expense)))
        }
    }
}

fn get_idempotency_key(headers: &HeaderMap) -> Result<Option<&str>, Error> {
    headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .map(|value| {
            value.to_str().map_err(|_| {
                Error::BadRequest("the Idempotency-Key header must be visible ASCII".to_owned())
            })
        })
        .transpose()
}
