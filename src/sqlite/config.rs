use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use crate::connection::ConnectionFactory;
use crate::error::SqlMapperError;
use crate::session::{CachingSession, DefaultSession};
use crate::transaction::TransactionManager;
use crate::types::Dialect;

use super::connection::SqliteConnection;

const MEMORY_PATH: &str = ":memory:";

/// Options for opening `SQLite` connections.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    pub db_path: String,
    pub busy_timeout: Duration,
    /// Switch file databases to WAL journaling on open.
    pub wal: bool,
    /// Statements run on every new connection, e.g. schema setup or pragmas.
    pub init_sql: Option<String>,
}

impl SqliteOptions {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout: Duration::from_secs(5),
            wal: true,
            init_sql: None,
        }
    }

    #[must_use]
    pub fn is_memory(&self) -> bool {
        self.db_path == MEMORY_PATH
    }
}

/// Fluent builder for `SQLite` options.
#[derive(Debug, Clone)]
pub struct SqliteOptionsBuilder {
    opts: SqliteOptions,
}

impl SqliteOptionsBuilder {
    #[must_use]
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            opts: SqliteOptions::new(db_path),
        }
    }

    #[must_use]
    pub fn busy_timeout(mut self, busy_timeout: Duration) -> Self {
        self.opts.busy_timeout = busy_timeout;
        self
    }

    #[must_use]
    pub fn wal(mut self, wal: bool) -> Self {
        self.opts.wal = wal;
        self
    }

    #[must_use]
    pub fn init_sql(mut self, sql: impl Into<String>) -> Self {
        self.opts.init_sql = Some(sql.into());
        self
    }

    #[must_use]
    pub fn finish(self) -> SqliteOptions {
        self.opts
    }

    /// Build a transaction manager that keeps one released connection for reuse.
    ///
    /// `SQLite` is driven with the default dialect: quote doubling and no session
    /// setup.
    ///
    /// Every `:memory:` connection is a separate database, so with an in-memory path
    /// only work that reuses the cached connection sees earlier writes.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the smoke-test connection cannot be opened.
    pub fn build(self) -> Result<TransactionManager<CachingSession<SqliteFactory>>, SqlMapperError> {
        let factory = SqliteFactory::new(self.finish());
        factory.check()?;
        Ok(TransactionManager::with_dialect(CachingSession::new(factory), Dialect::Default))
    }

    /// Build a transaction manager that opens a fresh connection for every transaction.
    ///
    /// # Errors
    ///
    /// Returns `SqlMapperError` if the smoke-test connection cannot be opened.
    pub fn build_uncached(
        self,
    ) -> Result<TransactionManager<DefaultSession<SqliteFactory>>, SqlMapperError> {
        let factory = SqliteFactory::new(self.finish());
        factory.check()?;
        Ok(TransactionManager::with_dialect(DefaultSession::new(factory), Dialect::Default))
    }
}

/// Opens rusqlite connections according to `SqliteOptions`.
#[derive(Debug, Clone)]
pub struct SqliteFactory {
    opts: Arc<SqliteOptions>,
}

impl SqliteFactory {
    #[must_use]
    pub fn new(opts: SqliteOptions) -> Self {
        Self {
            opts: Arc::new(opts),
        }
    }

    #[must_use]
    pub fn options(&self) -> &SqliteOptions {
        &self.opts
    }

    fn check(&self) -> Result<(), SqlMapperError> {
        let conn = self.create()?;
        self.close(conn)
    }
}

impl ConnectionFactory for SqliteFactory {
    type Conn = SqliteConnection;

    fn create(&self) -> Result<SqliteConnection, SqlMapperError> {
        let conn = if self.opts.is_memory() {
            rusqlite::Connection::open_in_memory()
        } else {
            rusqlite::Connection::open(&self.opts.db_path)
        }
        .map_err(|e| {
            SqlMapperError::ConnectionError(format!(
                "Failed to open SQLite database {}: {e}",
                self.opts.db_path
            ))
        })?;

        conn.busy_timeout(self.opts.busy_timeout)?;
        if self.opts.wal && !self.opts.is_memory() {
            let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
            debug!(journal_mode = %mode, "Set journal mode");
        }
        if let Some(sql) = &self.opts.init_sql {
            conn.execute_batch(sql)?;
        }

        debug!(db_path = %self.opts.db_path, "Opened SQLite connection");
        Ok(SqliteConnection::new(conn))
    }

    fn close(&self, conn: SqliteConnection) -> Result<(), SqlMapperError> {
        conn.into_raw().close().map_err(|(_, err)| SqlMapperError::SqliteError(err))
    }
}
