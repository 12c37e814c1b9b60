//! The seam between this crate and a database driver.

use crate::error::SqlMapperError;
use crate::results::ResultSet;
use crate::types::{IsolationLevel, RowValues};

/// A live, synchronous database link.
///
/// Statements are handed over as fully substituted SQL text. Implementations follow
/// the usual autocommit contract: while autocommit is off, statements join an open
/// transaction that only `commit` or `rollback` ends.
pub trait Connection: Send {
    /// Turn autocommit on or off. Turning it on while a transaction is open commits it.
    ///
    /// # Errors
    /// Returns an error if the driver rejects the change.
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlMapperError>;

    /// # Errors
    /// Returns an error if the driver cannot honour `level`.
    fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<(), SqlMapperError>;

    /// Run one or more statements, discarding any results.
    ///
    /// # Errors
    /// Returns the driver error if execution fails.
    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlMapperError>;

    /// Run a DML statement and return the number of affected rows.
    ///
    /// # Errors
    /// Returns the driver error if execution fails.
    fn execute_update(&mut self, sql: &str) -> Result<usize, SqlMapperError>;

    /// Run an INSERT and return the keys it generated, in order.
    ///
    /// # Errors
    /// Returns the driver error if execution fails.
    fn execute_insert(&mut self, sql: &str) -> Result<Vec<RowValues>, SqlMapperError>;

    /// Run a query and collect its rows.
    ///
    /// # Errors
    /// Returns the driver error if execution or value extraction fails.
    fn execute_query(&mut self, sql: &str) -> Result<ResultSet, SqlMapperError>;

    /// # Errors
    /// Returns the driver error if the commit fails.
    fn commit(&mut self) -> Result<(), SqlMapperError>;

    /// # Errors
    /// Returns the driver error if the rollback fails.
    fn rollback(&mut self) -> Result<(), SqlMapperError>;
}

/// Produces and disposes of physical connections. Reuse is the session's job.
pub trait ConnectionFactory: Send + Sync {
    type Conn: Connection;

    /// Open a brand new connection.
    ///
    /// # Errors
    /// Returns `SqlMapperError` if the connection cannot be opened.
    fn create(&self) -> Result<Self::Conn, SqlMapperError>;

    /// Physically close `conn`.
    ///
    /// # Errors
    /// Returns `SqlMapperError` if the driver reports a failure while closing.
    fn close(&self, conn: Self::Conn) -> Result<(), SqlMapperError>;
}
