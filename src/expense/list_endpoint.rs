//! Defines the endpoint for listing expenses.
use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Query, State, rejection::QueryRejection},
};
use rusqlite::Connection;
use serde::Deserialize;

use crate::{
    AppState, Error,
    db::lock_connection,
    expense::{Expense, ExpenseQuery, SortOrder, list_expenses},
};

/// The state needed to read expenses.
#[derive(Debug, Clone)]
pub struct ExpenseStoreState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ExpenseStoreState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The query parameters for listing expenses.
#[derive(Debug, Default, Deserialize)]
pub struct ListExpensesParams {
    /// Only list expenses in this category. Empty means all categories.
    pub category: Option<String>,
    /// `date_desc` lists the most recent expenses first. Other values are ignored.
    pub sort: Option<String>,
}

impl From<ListExpensesParams> for ExpenseQuery {
    fn from(params: ListExpensesParams) -> Self {
        Self {
            category: params.category.filter(|category| !category.is_empty()),
            sort: params.sort.as_deref().and_then(SortOrder::from_query_param),
        }
    }
}

/// A route handler for listing expenses, optionally filtered by category and
/// sorted by date.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseStoreState>,
    params: Result<Query<ListExpensesParams>, QueryRejection>,
) -> Result<Json<Vec<Expense>>, Error> {
    let Query(params) = params.map_err(|rejection| Error::BadRequest(rejection.body_text()))?;

    let connection = lock_connection(&state.db_connection)?;
    let expenses = list_expenses(params.into(), &connection)?;

    Ok(Json(expenses))
}
