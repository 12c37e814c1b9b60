//! Row-count assertions for update counts and fetched lists.

use crate::error::{Expectation, SqlMapperError};

fn violated(expected: Expectation, actual: usize) -> SqlMapperError {
    SqlMapperError::Cardinality { expected, actual }
}

/// # Errors
/// Returns `SqlMapperError::Cardinality` unless `count > 0`.
pub fn update_many(count: usize) -> Result<(), SqlMapperError> {
    if count == 0 {
        return Err(violated(Expectation::Many, count));
    }
    Ok(())
}

/// # Errors
/// Returns `SqlMapperError::Cardinality` unless `count == 1`.
pub fn update_one(count: usize) -> Result<(), SqlMapperError> {
    if count != 1 {
        return Err(violated(Expectation::One, count));
    }
    Ok(())
}

/// # Errors
/// Returns `SqlMapperError::Cardinality` if `count > 1`.
pub fn update_one_or_none(count: usize) -> Result<(), SqlMapperError> {
    if count > 1 {
        return Err(violated(Expectation::OneOrNone, count));
    }
    Ok(())
}

/// Return `list` if it has at least one element.
///
/// # Errors
/// Returns `SqlMapperError::Cardinality` for an empty list.
pub fn take_many<T>(list: Vec<T>) -> Result<Vec<T>, SqlMapperError> {
    update_many(list.len())?;
    Ok(list)
}

/// Return the only element of `list`.
///
/// # Errors
/// Returns `SqlMapperError::Cardinality` unless `list` has exactly one element.
pub fn take_one<T>(list: Vec<T>) -> Result<T, SqlMapperError> {
    update_one(list.len())?;
    list.into_iter()
        .next()
        .ok_or_else(|| violated(Expectation::One, 0))
}

/// Return the only element of `list`, or `None` if it is empty.
///
/// # Errors
/// Returns `SqlMapperError::Cardinality` if `list` has more than one element.
pub fn take_one_or_none<T>(list: Vec<T>) -> Result<Option<T>, SqlMapperError> {
    update_one_or_none(list.len())?;
    Ok(list.into_iter().next())
}

/// Project the first column of each row.
///
/// # Errors
/// Returns `SqlMapperError::Cardinality` if some row has no columns.
pub fn take_first_column<T>(rows: Vec<Vec<T>>) -> Result<Vec<T>, SqlMapperError> {
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .next()
                .ok_or_else(|| violated(Expectation::Many, 0))
        })
        .collect()
}
