//! Statement execution and result mapping inside a transaction.

use tracing::error;

use crate::cardinality;
use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::SqlMapperError;
use crate::results::{CustomDbRow, FromRow, ResultSet};
use crate::session::SessionConnection;
use crate::types::{Bindings, RowValues};

/// Query access bound to the connection of the running transaction.
///
/// Handed to the closure passed to `TransactionManager::execute`; every statement
/// runs inside that transaction.
pub struct Storage<'a, C: Connection> {
    conn: &'a SessionConnection<C>,
    engine: &'a dyn Engine,
}

impl<'a, C: Connection> Storage<'a, C> {
    pub(crate) fn new(conn: &'a SessionConnection<C>, engine: &'a dyn Engine) -> Self {
        Self { conn, engine }
    }

    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        self.engine
    }

    /// Run an INSERT and return the keys it generated.
    ///
    /// # Errors
    /// Returns template errors, or the driver error if execution fails.
    pub fn insert(
        &self,
        template: &str,
        bindings: &Bindings<'_>,
    ) -> Result<Vec<RowValues>, SqlMapperError> {
        let query = self.engine.build_query(template, bindings)?;
        self.conn
            .with(|conn| conn.execute_insert(&query))
            .map_err(|err| failed(&query, err))
    }

    /// Run an UPDATE/DELETE (or any DML) and return the affected row count.
    ///
    /// # Errors
    /// Returns template errors, or the driver error if execution fails.
    pub fn update(&self, template: &str, bindings: &Bindings<'_>) -> Result<usize, SqlMapperError> {
        let query = self.engine.build_query(template, bindings)?;
        self.conn
            .with(|conn| conn.execute_update(&query))
            .map_err(|err| failed(&query, err))
    }

    /// Run a query and return the raw result set.
    ///
    /// # Errors
    /// Returns template errors, or the driver error if execution fails.
    pub fn query(&self, template: &str, bindings: &Bindings<'_>) -> Result<ResultSet, SqlMapperError> {
        let query = self.engine.build_query(template, bindings)?;
        self.conn
            .with(|conn| conn.execute_query(&query))
            .map_err(|err| failed(&query, err))
    }

    /// Run a query and return each row as its list of column values.
    ///
    /// # Errors
    /// Returns template errors, or the driver error if execution fails.
    pub fn select(
        &self,
        template: &str,
        bindings: &Bindings<'_>,
    ) -> Result<Vec<Vec<RowValues>>, SqlMapperError> {
        Ok(self.query(template, bindings)?.into_value_rows())
    }

    /// Run a query and map every row with `mapper`, keeping result order.
    ///
    /// # Errors
    /// Returns template or driver errors, or the first error returned by `mapper`.
    pub fn select_map<T, M>(
        &self,
        mut mapper: M,
        template: &str,
        bindings: &Bindings<'_>,
    ) -> Result<Vec<T>, SqlMapperError>
    where
        M: FnMut(&CustomDbRow) -> Result<T, SqlMapperError>,
    {
        self.query(template, bindings)?
            .results
            .iter()
            .map(&mut mapper)
            .collect()
    }

    /// Run a query and convert every row through `FromRow`.
    ///
    /// # Errors
    /// Returns template or driver errors, or the first row conversion error.
    pub fn select_as<T: FromRow>(
        &self,
        template: &str,
        bindings: &Bindings<'_>,
    ) -> Result<Vec<T>, SqlMapperError> {
        self.select_map(T::from_row, template, bindings)
    }

    /// Escape `value` for use inside a quoted literal in this engine's dialect.
    #[must_use]
    pub fn escape(&self, value: &str) -> String {
        self.engine.escape(value)
    }

    /// # Errors
    /// See [`cardinality::update_many`].
    pub fn update_many(&self, count: usize) -> Result<(), SqlMapperError> {
        cardinality::update_many(count)
    }

    /// # Errors
    /// See [`cardinality::update_one`].
    pub fn update_one(&self, count: usize) -> Result<(), SqlMapperError> {
        cardinality::update_one(count)
    }

    /// # Errors
    /// See [`cardinality::update_one_or_none`].
    pub fn update_one_or_none(&self, count: usize) -> Result<(), SqlMapperError> {
        cardinality::update_one_or_none(count)
    }

    /// # Errors
    /// See [`cardinality::take_many`].
    pub fn take_many<T>(&self, list: Vec<T>) -> Result<Vec<T>, SqlMapperError> {
        cardinality::take_many(list)
    }

    /// # Errors
    /// See [`cardinality::take_one`].
    pub fn take_one<T>(&self, list: Vec<T>) -> Result<T, SqlMapperError> {
        cardinality::take_one(list)
    }

    /// # Errors
    /// See [`cardinality::take_one_or_none`].
    pub fn take_one_or_none<T>(&self, list: Vec<T>) -> Result<Option<T>, SqlMapperError> {
        cardinality::take_one_or_none(list)
    }

    /// # Errors
    /// See [`cardinality::take_first_column`].
    pub fn take_first_column<T>(&self, rows: Vec<Vec<T>>) -> Result<Vec<T>, SqlMapperError> {
        cardinality::take_first_column(rows)
    }
}

fn failed(query: &str, err: SqlMapperError) -> SqlMapperError {
    error!(%query, error = %err, "Failed query");
    err
}
