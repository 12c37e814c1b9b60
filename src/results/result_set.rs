use std::collections::HashMap;
use std::sync::Arc;

use super::row::{CustomDbRow, column_index};
use crate::types::RowValues;

/// A result set from a database query
///
/// Holds the rows returned by a query, in result order. All rows share one
/// column-name list and one name-to-index map.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    /// The rows returned by the query
    pub results: Vec<CustomDbRow>,
    /// Number of rows collected
    pub rows_affected: usize,
    column_names: Option<Arc<Vec<String>>>,
    column_index_cache: Arc<HashMap<String, usize>>,
}

impl ResultSet {
    /// Create a new result set with a known capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - The number of rows to reserve space for
    ///
    /// # Returns
    ///
    /// An empty `ResultSet` without column names
    #[must_use]
    pub fn with_capacity(capacity: usize) -> ResultSet {
        ResultSet {
            results: Vec::with_capacity(capacity),
            ..ResultSet::default()
        }
    }

    /// Create a result set from column names and rows
    ///
    /// Mainly for tests and for drivers that collect their rows up front.
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names shared by every row
    /// * `rows` - The row values, each in column order
    ///
    /// # Returns
    ///
    /// A `ResultSet` holding the rows in the given order
    #[must_use]
    pub fn from_rows(column_names: Vec<String>, rows: Vec<Vec<RowValues>>) -> ResultSet {
        let mut result_set = ResultSet::with_capacity(rows.len());
        result_set.set_column_names(Arc::new(column_names));
        for row in rows {
            result_set.add_row_values(row);
        }
        result_set
    }

    /// Set the column names for this result set
    ///
    /// Rows added afterwards share these names and their index.
    ///
    /// # Arguments
    ///
    /// * `column_names` - The column names to use
    pub fn set_column_names(&mut self, column_names: Arc<Vec<String>>) {
        self.column_index_cache = Arc::new(column_index(&column_names));
        self.column_names = Some(column_names);
    }

    /// Get the column names for this result set
    ///
    /// # Returns
    ///
    /// The column names, or None if none were set and no row was added
    #[must_use]
    pub fn get_column_names(&self) -> Option<&Arc<Vec<String>>> {
        self.column_names.as_ref()
    }

    /// Add a row to the result set
    ///
    /// Rows added before column names are set get an empty column list.
    ///
    /// # Arguments
    ///
    /// * `row_values` - The values for the row
    pub fn add_row_values(&mut self, row_values: Vec<RowValues>) {
        let column_names = self
            .column_names
            .get_or_insert_with(|| Arc::new(Vec::new()))
            .clone();
        self.results.push(CustomDbRow {
            column_names,
            rows: row_values,
            column_index_cache: Arc::clone(&self.column_index_cache),
        });
        self.rows_affected += 1;
    }

    /// Number of rows in the result set
    #[must_use]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Consume the result set, keeping only the row values
    ///
    /// # Returns
    ///
    /// One value list per row, in result order
    #[must_use]
    pub fn into_value_rows(self) -> Vec<Vec<RowValues>> {
        self.results.into_iter().map(CustomDbRow::into_values).collect()
    }
}
