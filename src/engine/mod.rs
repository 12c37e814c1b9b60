//! Dialect engines: connection preparation, query building and literal escaping.

mod default;
mod mysql;

pub use default::DefaultEngine;
pub use mysql::MySql5Engine;

use crate::codec::ValueCodec;
use crate::connection::Connection;
use crate::error::SqlMapperError;
use crate::template::compile;
use crate::types::Bindings;

/// Produces SQL valid for one database dialect.
pub trait Engine: Send + Sync {
    /// One-time setup of a freshly acquired connection, run before the first query
    /// built by this engine executes on it.
    ///
    /// # Errors
    /// Returns the driver error if a setup statement fails.
    fn prepare_connection(&self, conn: &mut dyn Connection) -> Result<(), SqlMapperError>;

    /// The codec used to render bound values.
    fn codec(&self) -> &ValueCodec;

    /// Substitute named parameters in `template`; see [`compile`].
    ///
    /// # Errors
    /// Returns `MissingParameter` or `UnsupportedValueType`.
    fn build_query(&self, template: &str, bindings: &Bindings<'_>) -> Result<String, SqlMapperError> {
        let query = compile(template, bindings, self.codec())?;
        tracing::trace!(variant = self.variant(), %query, "Built query");
        Ok(query)
    }

    /// Make `value` safe to place between single quotes in a query.
    fn escape(&self, value: &str) -> String;

    /// Reverse `escape`.
    fn unescape(&self, value: &str) -> String;

    /// Suffix of the query text variants this engine reads. Constant per engine.
    fn variant(&self) -> &str;
}
