//! Defines the endpoint for the per-category expense summary.
use axum::{Json, extract::State};

use crate::{
    Error,
    db::lock_connection,
    expense::{CategorySummary, list_endpoint::ExpenseStoreState, summarize_expenses},
};

/// A route handler for the total spent in each category, largest first.
pub async fn get_summary_endpoint(
    State(state): State<ExpenseStoreState>,
) -> Result<Json<Vec<CategorySummary>>, Error> {
    let connection = lock_connection(&state.db_connection)?;
    let summary = summarize_expenses(&connection)?;

    Ok(Json(summary))
}
