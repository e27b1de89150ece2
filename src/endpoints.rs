//! The API endpoints URIs.

/// The route to create and list expenses.
pub const EXPENSES: &str = "/expenses";
/// The route for the per-category totals of all expenses.
pub const EXPENSE_SUMMARY: &str = "/expenses/summary";

/// The request header carrying the client's idempotency key for creating expenses.
pub const IDEMPOTENCY_KEY_HEADER: &str = "idempotency-key";
