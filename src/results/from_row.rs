use crate::error::SqlMapperError;
use crate::types::RowValues;

use super::row::CustomDbRow;

/// Statically declared conversion from a result row.
///
/// Scalar implementations read the first column, which suits `select count(*)` or
/// single-column lookups. Structs implement it by naming their columns:
/// ```rust
/// use sql_mapper::prelude::*;
///
/// struct User {
///     id: i64,
///     name: String,
/// }
///
/// impl FromRow for User {
///     fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError> {
///         Ok(User {
///             id: i64::from_row_value(row.get("id"))?,
///             name: String::from_row_value(row.get("name"))?,
///         })
///     }
/// }
/// ```
pub trait FromRow: Sized {
    /// # Errors
    /// Returns `SqlMapperError::ExecutionError` when a column is missing or has the wrong kind.
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError>;
}

/// Conversion from a single column value.
pub trait FromRowValue: Sized {
    /// # Errors
    /// Returns `SqlMapperError::ExecutionError` when the value is absent or has the wrong kind.
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError>;
}

fn mismatch(expected: &str, value: Option<&RowValues>) -> SqlMapperError {
    match value {
        Some(v) => SqlMapperError::ExecutionError(format!(
            "expected a {expected} column, found {}",
            v.kind()
        )),
        None => SqlMapperError::ExecutionError(format!("expected a {expected} column, found none")),
    }
}

impl FromRowValue for RowValues {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        value.cloned().ok_or_else(|| mismatch("value", None))
    }
}

impl FromRowValue for i64 {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        value
            .and_then(RowValues::as_int)
            .copied()
            .ok_or_else(|| mismatch("Int", value))
    }
}

impl FromRowValue for f64 {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        value
            .and_then(RowValues::as_float)
            .ok_or_else(|| mismatch("Float", value))
    }
}

impl FromRowValue for bool {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        value
            .and_then(RowValues::as_bool)
            .ok_or_else(|| mismatch("Bool", value))
    }
}

impl FromRowValue for String {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        value
            .and_then(RowValues::as_text)
            .map(str::to_owned)
            .ok_or_else(|| mismatch("Text", value))
    }
}

impl<T: FromRowValue> FromRowValue for Option<T> {
    fn from_row_value(value: Option<&RowValues>) -> Result<Self, SqlMapperError> {
        match value {
            Some(RowValues::Null) => Ok(None),
            other => T::from_row_value(other).map(Some),
        }
    }
}

impl FromRow for Vec<RowValues> {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError> {
        Ok(row.rows.clone())
    }
}

macro_rules! first_column_from_row {
    ($($t:ty),*) => {
        $(
            impl FromRow for $t {
                fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError> {
                    <$t as FromRowValue>::from_row_value(row.get_by_index(0))
                }
            }
        )*
    };
}

first_column_from_row!(RowValues, i64, f64, bool, String);

impl<T: FromRowValue> FromRow for Option<T> {
    fn from_row(row: &CustomDbRow) -> Result<Self, SqlMapperError> {
        <Option<T> as FromRowValue>::from_row_value(row.get_by_index(0))
    }
}
