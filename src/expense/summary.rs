//! Totals of expenses grouped by category.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

/// How much was spent in one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// The category the expenses belong to.
    pub category: String,
    /// The sum of the category's expenses in minor units.
    pub total_amount: i64,
    /// The category's share of all expenses, as a percentage rounded to two
    /// decimal places.
    ///
    /// Each category is rounded on its own, so the percentages of all
    /// categories may not add up to exactly 100.
    pub percentage: f64,
}

/// Sum the expenses in each category.
///
/// Categories are ordered by their total, largest first. Categories with the
/// same total are ordered by name. Returns an empty list if there are no
/// expenses.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is some SQL error,
/// including a category total that does not fit in an `i64`.
pub fn summarize_expenses(connection: &Connection) -> Result<Vec<CategorySummary>, Error> {
    // The grand total is computed from the same rows as the category totals
    // so that the two can never disagree.
    let category_totals = connection
        .prepare(
            "SELECT category, SUM(amount) AS total_amount
             FROM expense
             GROUP BY category
             ORDER BY total_amount DESC, category ASC",
        )?
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    // Each category total fits in an i64, but their sum may not.
    let grand_total: i128 = category_totals
        .iter()
        .map(|(_, total)| i128::from(*total))
        .sum();

    if grand_total == 0 {
        return Ok(Vec::new());
    }

    Ok(category_totals
        .into_iter()
        .map(|(category, total_amount)| CategorySummary {
            category,
            total_amount,
            percentage: percentage_of(total_amount, grand_total),
        })
        .collect())
}

/// `part` as a percentage of `whole`, rounded to two decimal places.
///
/// `whole` must not be zero.
fn percentage_of(part: i64, whole: i128) -> f64 {
    let percentage = part as f64 * 100.0 / whole as f64;

    (percentage * 100.0).round() / 100.0
}
