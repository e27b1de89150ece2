//! Defines the core data models and database queries for expenses.

use rusqlite::{Connection, OptionalExtension, Row, params_from_iter, types::Value};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, database_id::ExpenseId};

// ============================================================================
// MODELS
// ============================================================================

/// Money that was spent, as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    /// The ID of the expense, assigned by the server.
    pub id: ExpenseId,
    /// The amount spent in minor units, e.g. cents. Always positive.
    pub amount: i64,
    /// What the money was spent on, e.g. "Food".
    pub category: String,
    /// Free text, empty if the client did not provide one.
    pub description: String,
    /// When the money was spent.
    pub date: Date,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// The key the client sent to make retries of the creation request safe.
    pub idempotency_key: Option<String>,
}

/// A validated expense that is ready to be stored.
///
/// Use [validate_expense](crate::expense::validate_expense) to create one
/// from client input.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// The amount spent in minor units, e.g. cents. Must be positive.
    pub amount: i64,
    /// A trimmed, non-empty category.
    pub category: String,
    /// A trimmed description, empty if there was none.
    pub description: String,
    /// When the money was spent, no later than today.
    pub date: Date,
}

/// The result of [create_expense].
#[derive(Debug, Clone, PartialEq)]
pub enum CreatedExpense {
    /// A new row was inserted.
    Inserted(Expense),
    /// An expense with the same idempotency key already existed, it is
    /// returned unchanged and nothing was inserted.
    Existing(Expense),
}

impl CreatedExpense {
    /// The stored expense, regardless of whether it was just inserted.
    pub fn expense(&self) -> &Expense {
        match self {
            CreatedExpense::Inserted(expense) | CreatedExpense::Existing(expense) => expense,
        }
    }
}

/// Defines how expenses should be fetched from [list_expenses].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseQuery {
    /// Only include expenses with exactly this category (case-sensitive).
    pub category: Option<String>,
    /// The order to return expenses in. `None` returns expenses in the order
    /// they were stored.
    pub sort: Option<SortOrder>,
}

/// The order to sort expenses in an [ExpenseQuery].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Most recent date first. Expenses on the same date are ordered from the
    /// most recently recorded.
    DateDescending,
}

impl SortOrder {
    /// Parse the value of the `sort` query parameter.
    ///
    /// Unrecognised values yield `None`, which leaves expenses in storage order.
    pub fn from_query_param(value: &str) -> Option<Self> {
        match value {
            "date_desc" => Some(SortOrder::DateDescending),
            _ => None,
        }
    }
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

const EXPENSE_COLUMNS: &str =
    "id, amount, category, description, date, created_at, idempotency_key";

/// Store `new_expense` unless `idempotency_key` has been used before.
///
/// The `UNIQUE` constraint on the idempotency key decides whether the insert
/// happens. If another request already stored an expense with the same key,
/// even one that raced this call, that expense is read back and returned as
/// [CreatedExpense::Existing].
///
/// An empty `idempotency_key` is treated the same as `None`.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error,
/// e.g. `new_expense` breaks a table constraint.
pub fn create_expense(
    new_expense: NewExpense,
    idempotency_key: Option<&str>,
    created_at: OffsetDateTime,
    connection: &Connection,
) -> Result<CreatedExpense, Error> {
    let idempotency_key = idempotency_key.filter(|key| !key.is_empty());

    let inserted = connection
        .prepare(&format!(
            "INSERT INTO expense ({EXPENSE_COLUMNS})
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
             ON CONFLICT(idempotency_key) DO NOTHING
             RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            (
                ExpenseId::new_random(),
                new_expense.amount,
                new_expense.category,
                new_expense.description,
                new_expense.date,
                created_at,
                idempotency_key,
            ),
            map_expense_row,
        )
        .optional()?;

    match (inserted, idempotency_key) {
        (Some(expense), _) => Ok(CreatedExpense::Inserted(expense)),
        (None, Some(key)) => {
            tracing::debug!("expense with idempotency key {key:?} already exists");
            get_expense_by_idempotency_key(key, connection).map(CreatedExpense::Existing)
        }
        // Only the idempotency key can conflict, so a skipped insert without
        // a key means the table is not the one we created.
        (None, None) => {
            tracing::error!("insert without an idempotency key did not return a row");
            Err(Error::Unexpected)
        }
    }
}

/// Retrieve an expense from the database by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a stored expense,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense(id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id"
        ))?
        .query_one(&[(":id", &id)], map_expense_row)?;

    Ok(expense)
}

/// Retrieve the expense that was created with `idempotency_key`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if no expense was created with `idempotency_key`,
/// - or [Error::SqlError] there is some other SQL error.
pub fn get_expense_by_idempotency_key(
    idempotency_key: &str,
    connection: &Connection,
) -> Result<Expense, Error> {
    let expense = connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE idempotency_key = :key"
        ))?
        .query_one(&[(":key", &idempotency_key)], map_expense_row)?;

    Ok(expense)
}

/// Retrieve expenses in the way defined by `query`.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn list_expenses(query: ExpenseQuery, connection: &Connection) -> Result<Vec<Expense>, Error> {
    let mut sql = format!("SELECT {EXPENSE_COLUMNS} FROM expense");
    let mut params = Vec::new();

    if let Some(category) = query.category {
        sql.push_str(" WHERE category = ?1");
        params.push(Value::Text(category));
    }

    // The table is append-only so rowid follows insertion order.
    match query.sort {
        Some(SortOrder::DateDescending) => sql.push_str(" ORDER BY date DESC, rowid DESC"),
        None => sql.push_str(" ORDER BY rowid ASC"),
    }

    connection
        .prepare(&sql)?
        .query_map(params_from_iter(params), map_expense_row)?
        .map(|maybe_expense| maybe_expense.map_err(Error::from))
        .collect()
}

/// Get the total number of expenses in the database.
///
/// # Errors
/// This function will return a [Error::SqlError] there is some SQL error.
pub fn count_expenses(connection: &Connection) -> Result<u32, Error> {
    connection
        .query_row("SELECT COUNT(id) FROM expense;", [], |row| row.get(0))
        .map_err(|error| error.into())
}

/// Create the expense table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id TEXT PRIMARY KEY,
                amount INTEGER NOT NULL CHECK(amount > 0),
                category TEXT NOT NULL,
                description TEXT NOT NULL CHECK(length(description) <= 255),
                date TEXT NOT NULL,
                created_at TEXT NOT NULL,
                idempotency_key TEXT UNIQUE
                )",
        (),
    )?;

    // Used by the category filter on the expenses list.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_category_date ON expense(category, date);",
        (),
    )?;

    Ok(())
}

/// Map a database row to an Expense.
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    let id = row.get(0)?;
    let amount = row.get(1)?;
    let category = row.get(2)?;
    let description = row.get(3)?;
    let date = row.get(4)?;
    let created_at = row.get(5)?;
    let idempotency_key = row.get(6)?;

    Ok(Expense {
        id,
        amount,
        category,
        description,
        date,
        created_at,
        idempotency_key,
    })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date, macros::datetime};

    use crate::{
        Error,
        db::initialize,
        expense::{
            CreatedExpense, ExpenseQuery, NewExpense, SortOrder, count_expenses, create_expense,
            get_expense, get_expense_by_idempotency_key, list_expenses,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn new_expense(amount: i64, category: &str, date: time::Date) -> NewExpense {
        NewExpense {
            amount,
            category: category.to_owned(),
            description: String::new(),
            date,
        }
    }

    const NOW: OffsetDateTime = datetime!(2025-06-15 12:00:00 UTC);

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let expense = NewExpense {
            amount: 1999,
            category: "Food".to_owned(),
            description: "Lunch".to_owned(),
            date: date!(2025 - 06 - 01),
        };

        let got = match create_expense(expense.clone(), None, NOW, &conn) {
            Ok(CreatedExpense::Inserted(got)) => got,
            result => panic!("Unexpected result: {result:?}"),
        };
        assert_eq!(got.amount, expense.amount);
        assert_eq!(got.category, expense.category);
        assert_eq!(got.description, expense.description);
        assert_eq!(got.date, expense.date);
        assert_eq!(got.created_at, NOW);
        assert_eq!(got.idempotency_key, None);
        assert_eq!(get_expense(got.id, &conn), Ok(got));
    }

    #[test]
    fn created_expense_appears_once_in_list() {
        let conn = get_test_connection();

        let created = create_expense(
            new_expense(1999, "Food", date!(2024 - 01 - 01)),
            None,
            NOW,
            &conn,
        )
        .unwrap();

        let expenses = list_expenses(ExpenseQuery::default(), &conn).unwrap();
        assert_eq!(expenses, vec![created.expense().clone()]);
    }

    #[test]
    fn same_idempotency_key_returns_existing_expense() {
        let conn = get_test_connection();
        let first = create_expense(
            new_expense(1000, "Food", date!(2025 - 06 - 01)),
            Some("abc"),
            NOW,
            &conn,
        )
        .unwrap();

        let second = create_expense(
            new_expense(5000, "Travel", date!(2025 - 05 - 01)),
            Some("abc"),
            NOW + Duration::seconds(5),
            &conn,
        )
        .unwrap();

        let first = match first {
            CreatedExpense::Inserted(expense) => expense,
            other => panic!("first call should insert, got {other:?}"),
        };
        assert_eq!(second, CreatedExpense::Existing(first.clone()));
        assert_eq!(count_expenses(&conn), Ok(1));
        assert_eq!(
            get_expense_by_idempotency_key("abc", &conn),
            Ok(first.clone())
        );
        assert_eq!(first.idempotency_key.as_deref(), Some("abc"));
    }

    #[test]
    fn different_idempotency_keys_insert_separate_expenses() {
        let conn = get_test_connection();

        for key in ["a", "b"] {
            let created = create_expense(
                new_expense(1000, "Food", date!(2025 - 06 - 01)),
                Some(key),
                NOW,
                &conn,
            )
            .unwrap();
            assert!(matches!(created, CreatedExpense::Inserted(_)));
        }

        assert_eq!(count_expenses(&conn), Ok(2));
    }

    #[test]
    fn expenses_without_key_are_never_deduplicated() {
        let conn = get_test_connection();

        for key in [None, None, Some(""), Some("")] {
            create_expense(
                new_expense(1000, "Food", date!(2025 - 06 - 01)),
                key,
                NOW,
                &conn,
            )
            .unwrap();
        }

        assert_eq!(count_expenses(&conn), Ok(4));
        let expenses = list_expenses(ExpenseQuery::default(), &conn).unwrap();
        assert!(expenses.iter().all(|e| e.idempotency_key.is_none()));
    }

    #[test]
    fn key_stored_by_another_writer_is_returned() {
        let conn = get_test_connection();
        // Simulate a concurrent request that won the race on the same key.
        conn.execute(
            "INSERT INTO expense (id, amount, category, description, date, created_at, idempotency_key)
             VALUES ('67e55044-10b1-426f-9247-bb680e5fe0c8', 42, 'Rent', '', '2025-06-01', ?1, 'race')",
            (NOW,),
        )
        .unwrap();

        let got = create_expense(
            new_expense(1000, "Food", date!(2025 - 06 - 01)),
            Some("race"),
            NOW,
            &conn,
        )
        .unwrap();

        let existing = match got {
            CreatedExpense::Existing(expense) => expense,
            other => panic!("want existing expense, got {other:?}"),
        };
        assert_eq!(existing.amount, 42);
        assert_eq!(existing.category, "Rent");
        assert_eq!(count_expenses(&conn), Ok(1));
    }

    #[test]
    fn table_rejects_non_positive_amount() {
        let conn = get_test_connection();

        let result = create_expense(
            new_expense(0, "Food", date!(2025 - 06 - 01)),
            None,
            NOW,
            &conn,
        );

        assert!(matches!(result, Err(Error::SqlError(_))), "got {result:?}");
        assert_eq!(count_expenses(&conn), Ok(0));
    }

    #[test]
    fn get_missing_expense_is_not_found() {
        let conn = get_test_connection();

        assert_eq!(
            get_expense("67e55044-10b1-426f-9247-bb680e5fe0c8".parse().unwrap(), &conn),
            Err(Error::NotFound)
        );
        assert_eq!(
            get_expense_by_idempotency_key("nope", &conn),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn list_filters_by_exact_category() {
        let conn = get_test_connection();
        for category in ["Food", "food", "Travel", "Food"] {
            create_expense(
                new_expense(100, category, date!(2025 - 06 - 01)),
                None,
                NOW,
                &conn,
            )
            .unwrap();
        }

        let got = list_expenses(
            ExpenseQuery {
                category: Some("Food".to_owned()),
                sort: None,
            },
            &conn,
        )
        .unwrap();

        assert_eq!(got.len(), 2);
        assert!(got.iter().all(|expense| expense.category == "Food"));
    }

    #[test]
    fn list_without_sort_keeps_insertion_order() {
        let conn = get_test_connection();
        let dates = [
            date!(2025 - 01 - 02),
            date!(2025 - 03 - 01),
            date!(2025 - 01 - 01),
        ];
        for date in dates {
            create_expense(new_expense(100, "Food", date), None, NOW, &conn).unwrap();
        }

        let got: Vec<_> = list_expenses(ExpenseQuery::default(), &conn)
            .unwrap()
            .into_iter()
            .map(|expense| expense.date)
            .collect();

        assert_eq!(got, dates);
    }

    #[test]
    fn list_sorts_by_date_descending() {
        let conn = get_test_connection();
        let mut created_ids = Vec::new();
        for (amount, date) in [
            (1, date!(2025 - 01 - 02)),
            (2, date!(2025 - 03 - 01)),
            (3, date!(2025 - 01 - 02)),
            (4, date!(2024 - 12 - 31)),
        ] {
            let created =
                create_expense(new_expense(amount, "Food", date), None, NOW, &conn).unwrap();
            created_ids.push(created.expense().id);
        }

        let got: Vec<_> = list_expenses(
            ExpenseQuery {
                category: None,
                sort: Some(SortOrder::DateDescending),
            },
            &conn,
        )
        .unwrap()
        .into_iter()
        .map(|expense| expense.id)
        .collect();

        // Expenses on the same date are listed most recently recorded first.
        let want = vec![created_ids[1], created_ids[2], created_ids[0], created_ids[3]];
        assert_eq!(got, want);
    }

    #[test]
    fn sort_order_parses_known_values_only() {
        assert_eq!(
            SortOrder::from_query_param("date_desc"),
            Some(SortOrder::DateDescending)
        );
        assert_eq!(SortOrder::from_query_param("date_asc"), None);
        assert_eq!(SortOrder::from_query_param(""), None);
    }
}
