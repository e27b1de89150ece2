//! Expense management for the expense tracker.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the validation that turns client input into a `NewExpense`
//! - Database functions for storing, listing, and summarizing expenses
//! - Route handlers for the expense API

mod core;
mod create_endpoint;
mod list_endpoint;
mod summary;
mod summary_endpoint;
mod validation;

pub use core::{
    CreatedExpense, Expense, ExpenseQuery, NewExpense, SortOrder, count_expenses, create_expense,
    create_expense_table, get_expense, get_expense_by_idempotency_key, list_expenses,
};
pub use create_endpoint::create_expense_endpoint;
pub use list_endpoint::list_expenses_endpoint;
pub use summary::{CategorySummary, summarize_expenses};
pub use summary_endpoint::get_summary_endpoint;
pub use validation::{
    AmountInput, ExpenseForm, MAX_AMOUNT_MINOR_UNITS, MAX_DESCRIPTION_LENGTH, ValidationError,
    to_minor_units, validate_expense,
};
