#![forbid(unsafe_code)]
//! sql-mapper: transactions, named-parameter SQL templates and row mapping over
//! synchronous database connections.
//!
//! A `TransactionManager` takes connections from a `Session`, runs a closure inside a
//! serializable transaction and commits or rolls back. The closure receives a
//! `Storage` that expands `:name` placeholders through the dialect's `Engine`.
//!
//! ```rust
//! use sql_mapper::prelude::*;
//!
//! let manager = SqliteOptionsBuilder::new(":memory:")
//!     .init_sql("create table users (id integer primary key, name text not null)")
//!     .build()?;
//!
//! manager.exec(|storage| {
//!     let keys = storage.insert(
//!         "insert into users (name) values (:name)",
//!         &bindings! { "name" => "ann" },
//!     )?;
//!     storage.take_one(keys)?;
//!     Ok(())
//! })?;
//!
//! let names: Vec<String> = manager.execute(|storage| {
//!     storage.select_as("select name from users where id = :id", &bindings! { "id" => 1 })
//! })?;
//! assert_eq!(names, vec!["ann".to_string()]);
//! # Ok::<(), SqlMapperError>(())
//! ```

pub mod cardinality;
pub mod codec;
pub mod connection;
pub mod engine;
pub mod error;
mod macros;
pub mod prelude;
pub mod queries;
pub mod results;
pub mod session;
pub mod storage;
pub mod template;
pub mod transaction;
pub mod types;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use codec::ValueCodec;
pub use connection::{Connection, ConnectionFactory};
pub use engine::{DefaultEngine, Engine, MySql5Engine};
pub use error::{Expectation, SqlMapperError};
pub use queries::{QueryAccessor, QueryTexts, VariantTexts};
pub use results::{CustomDbRow, FromRow, FromRowValue, ResultSet};
pub use session::{CachingSession, ConnHandle, DefaultSession, Session, SessionConnection};
pub use storage::Storage;
pub use transaction::TransactionManager;
pub use types::{Bindings, Dialect, IsolationLevel, RowValues};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteFactory, SqliteOptions, SqliteOptionsBuilder};
