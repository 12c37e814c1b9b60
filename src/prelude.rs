//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types and functions
//! to make it easier to get started with the library.

pub use crate::bindings;
pub use crate::connection::{Connection, ConnectionFactory};
pub use crate::engine::{DefaultEngine, Engine, MySql5Engine};
pub use crate::error::{Expectation, SqlMapperError};
pub use crate::queries::{QueryAccessor, QueryTexts, VariantTexts};
pub use crate::results::{CustomDbRow, FromRow, FromRowValue, ResultSet};
pub use crate::session::{CachingSession, DefaultSession, Session};
pub use crate::storage::Storage;
pub use crate::transaction::TransactionManager;
pub use crate::types::{Bindings, Dialect, IsolationLevel, RowValues};

#[cfg(feature = "sqlite")]
pub use crate::sqlite::{SqliteConnection, SqliteFactory, SqliteOptions, SqliteOptionsBuilder};
