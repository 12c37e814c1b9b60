// SQLite backend: a `ConnectionFactory` over rusqlite plus option builders.
//
// - config: options, builder and the factory
// - connection: `Connection` impl with autocommit emulation
// - query: result extraction

pub mod config;
pub mod connection;
pub mod query;

pub use config::{SqliteFactory, SqliteOptions, SqliteOptionsBuilder};
pub use connection::SqliteConnection;
pub use query::build_result_set;
