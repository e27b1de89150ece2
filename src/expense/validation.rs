//! Checks expense submissions against the business rules and normalizes them
//! into a [NewExpense] that can be stored.

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use crate::expense::NewExpense;

/// The longest description, in characters, that an expense may have.
pub const MAX_DESCRIPTION_LENGTH: usize = 255;

/// How many minor units (e.g., cents) make up one major unit (e.g., dollars).
pub const MINOR_UNITS_PER_MAJOR_UNIT: f64 = 100.0;

/// The largest amount, in minor units, that a single expense may have.
///
/// Ten billion major units. Millions of expenses at this amount still sum to
/// less than [i64::MAX].
pub const MAX_AMOUNT_MINOR_UNITS: i64 = 1_000_000_000_000;

/// The ways an expense submission can break the validation rules.
///
/// The display text of each variant is sent to the client as-is.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The amount was missing, not a number, not greater than zero, or more
    /// than [MAX_AMOUNT_MINOR_UNITS].
    #[error("Amount must be a positive number")]
    InvalidAmount,

    /// The category was missing or only whitespace.
    #[error("Category required")]
    MissingCategory,

    /// The description is longer than [MAX_DESCRIPTION_LENGTH] characters.
    #[error("Description must be 255 characters or fewer")]
    DescriptionTooLong,

    /// The date was missing or empty.
    #[error("Date required")]
    MissingDate,

    /// The date is not a calendar date in the format `YYYY-MM-DD`.
    #[error("Invalid date format")]
    InvalidDate,

    /// Expenses record money that has already been spent, so the date cannot
    /// be later than today.
    #[error("Date cannot be in the future")]
    FutureDate,
}

/// The amount as sent by the client.
///
/// Clients may send the amount as a JSON number or as a numeric string.
/// Anything else is kept so that it is rejected as
/// [ValidationError::InvalidAmount] instead of failing to deserialize.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AmountInput {
    /// A JSON number, e.g. `19.99`.
    Number(f64),
    /// A JSON string, e.g. `"19.99"`.
    Text(String),
    /// Any other JSON value, e.g. `true`.
    Other(serde_json::Value),
}

/// The JSON body for creating an expense.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseForm {
    /// The amount spent in major units, e.g. dollars.
    pub amount: Option<AmountInput>,
    /// What the money was spent on, e.g. "Food".
    pub category: Option<String>,
    /// Optional free text.
    pub description: Option<String>,
    /// When the money was spent, as `YYYY-MM-DD`.
    pub date: Option<String>,
}

/// Validate `form` and normalize it into a [NewExpense].
///
/// `today` is the current date in the server's local timezone, expense dates
/// after `today` are rejected.
///
/// The fields are checked in the order amount, category, description, date
/// and the first failure is returned.
///
/// # Errors
/// Returns the [ValidationError] for the first rule that `form` breaks.
pub fn validate_expense(form: ExpenseForm, today: Date) -> Result<NewExpense, ValidationError> {
    let amount = parse_amount(form.amount.as_ref())?;
    let category = parse_category(form.category.as_deref())?;
    let description = parse_description(form.description.as_deref())?;
    let date = parse_date(form.date.as_deref(), today)?;

    Ok(NewExpense {
        amount,
        category,
        description,
        date,
    })
}

fn parse_amount(amount: Option<&AmountInput>) -> Result<i64, ValidationError> {
    let amount = match amount {
        Some(AmountInput::Number(amount)) => *amount,
        Some(AmountInput::Text(text)) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| ValidationError::InvalidAmount)?,
        Some(AmountInput::Other(_)) | None => return Err(ValidationError::InvalidAmount),
    };

    to_minor_units(amount).ok_or(ValidationError::InvalidAmount)
}

/// Convert an amount in major units to minor units, rounding half away from zero.
///
/// Returns `None` if `amount` is not finite, or does not round to between one
/// and [MAX_AMOUNT_MINOR_UNITS] minor units.
pub fn to_minor_units(amount: f64) -> Option<i64> {
    if !amount.is_finite() || amount <= 0.0 {
        return None;
    }

    let minor_units = (amount * MINOR_UNITS_PER_MAJOR_UNIT).round();

    if minor_units < 1.0 || minor_units > MAX_AMOUNT_MINOR_UNITS as f64 {
        return None;
    }

    Some(minor_units as i64)
}

fn parse_category(category: Option<&str>) -> Result<String, ValidationError> {
    match category.map(str::trim) {
        Some(category) if !category.is_empty() => Ok(category.to_owned()),
        _ => Err(ValidationError::MissingCategory),
    }
}

fn parse_description(description: Option<&str>) -> Result<String, ValidationError> {
    let Some(description) = description else {
        return Ok(String::new());
    };

    // The limit applies to what the client sent, before trimming.
    if description.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::DescriptionTooLong);
    }

    Ok(description.trim().to_owned())
}

fn parse_date(date: Option<&str>, today: Date) -> Result<Date, ValidationError> {
    let date = match date.map(str::trim) {
        Some(date) if !date.is_empty() => date,
        _ => return Err(ValidationError::MissingDate),
    };

    let date = Date::parse(date, format_description!("[year]-[month]-[day]"))
        .map_err(|_| ValidationError::InvalidDate)?;

    if date > today {
        return Err(ValidationError::FutureDate);
    }

    Ok(date)
}
