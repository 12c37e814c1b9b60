//! Transaction boundaries around units of work.

mod registry;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::{debug, trace, warn};

use crate::connection::Connection;
use crate::engine::Engine;
use crate::error::SqlMapperError;
use crate::queries::QueryAccessor;
use crate::session::{ConnHandle, Session, lock};
use crate::storage::Storage;
use crate::types::{Dialect, IsolationLevel};

use registry::QueryRegistry;

/// Runs closures as transactions on connections drawn from a `Session`.
///
/// A thread's first `execute` checks a connection out, turns autocommit off,
/// requests serializable isolation and lets the engine prepare it. Nested calls on
/// the same thread join that transaction; only the outermost call commits or rolls
/// back.
/// ```rust,no_run
/// use sql_mapper::prelude::*;
///
/// let manager = SqliteOptionsBuilder::new("app.db").build()?;
/// let id = manager.execute(|storage| {
///     let keys = storage.insert("insert into users (name) values (:name)", &bindings! { "name" => "ann" })?;
///     storage.take_one(keys)
/// })?;
/// # let _ = id;
/// # Ok::<(), SqlMapperError>(())
/// ```
pub struct TransactionManager<S: Session> {
    session: S,
    engine: Arc<dyn Engine>,
    active: Mutex<HashMap<ThreadId, ConnHandle<S::Conn>>>,
    queries: QueryRegistry,
}

impl<S: Session> TransactionManager<S> {
    pub fn new(session: S, engine: Arc<dyn Engine>) -> Self {
        Self {
            session,
            engine,
            active: Mutex::new(HashMap::new()),
            queries: QueryRegistry::default(),
        }
    }

    pub fn with_dialect(session: S, dialect: Dialect) -> Self {
        Self::new(session, Arc::from(dialect.engine()))
    }

    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    #[must_use]
    pub fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Whether the calling thread is inside `execute`.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        lock(&self.active).contains_key(&thread::current().id())
    }

    /// Run `work` in a transaction and return its value.
    ///
    /// The transaction commits when `work` returns `Ok`. Otherwise it is rolled back
    /// and the connection invalidated; the error returned is the one from `work` (or
    /// from commit), or the rollback failure carrying it as its secondary cause.
    ///
    /// # Errors
    /// Returns connection setup, statement, commit or rollback failures, and any error
    /// returned by `work`.
    pub fn execute<T, W>(&self, work: W) -> Result<T, SqlMapperError>
    where
        W: FnOnce(&Storage<'_, S::Conn>) -> Result<T, SqlMapperError>,
    {
        let key = thread::current().id();
        let joined = lock(&self.active).get(&key).cloned();
        if let Some(conn) = joined {
            trace!(conn_id = conn.id(), "Joining active transaction");
            return work(&Storage::new(&conn, self.engine.as_ref()));
        }

        let conn = self.begin()?;
        lock(&self.active).insert(key, Arc::clone(&conn));
        let guard = ActiveGuard {
            manager: self,
            key,
            conn: Arc::clone(&conn),
            finished: false,
        };

        let outcome = work(&Storage::new(&conn, self.engine.as_ref()))
            .and_then(|value| conn.with(|c| c.commit()).map(|()| value));
        guard.finish();

        match outcome {
            Ok(value) => {
                debug!(conn_id = conn.id(), "Committed transaction");
                self.session.release(&conn)?;
                Ok(value)
            }
            Err(cause) => Err(self.roll_back(&conn, cause)),
        }
    }

    /// `execute` for work without a result value.
    ///
    /// # Errors
    /// See [`TransactionManager::execute`].
    pub fn exec<W>(&self, work: W) -> Result<(), SqlMapperError>
    where
        W: FnOnce(&Storage<'_, S::Conn>) -> Result<(), SqlMapperError>,
    {
        self.execute(work)
    }

    /// `execute` with the cached `Q` accessor built for this manager's engine variant.
    ///
    /// # Errors
    /// Returns the accessor construction error, or see [`TransactionManager::execute`].
    pub fn execute_with<Q, T, W>(&self, work: W) -> Result<T, SqlMapperError>
    where
        Q: QueryAccessor,
        W: FnOnce(&Storage<'_, S::Conn>, &Q) -> Result<T, SqlMapperError>,
    {
        let queries = self.queries.get::<Q>(self.engine.variant())?;
        self.execute(|storage| work(storage, &queries))
    }

    /// `execute_with` for work without a result value.
    ///
    /// # Errors
    /// See [`TransactionManager::execute_with`].
    pub fn exec_with<Q, W>(&self, work: W) -> Result<(), SqlMapperError>
    where
        Q: QueryAccessor,
        W: FnOnce(&Storage<'_, S::Conn>, &Q) -> Result<(), SqlMapperError>,
    {
        self.execute_with(work)
    }

    /// The `Q` accessor for this manager, built on first use.
    ///
    /// # Errors
    /// Returns the error raised by `Q::create`.
    pub fn queries<Q: QueryAccessor>(&self) -> Result<Arc<Q>, SqlMapperError> {
        self.queries.get::<Q>(self.engine.variant())
    }

    fn begin(&self) -> Result<ConnHandle<S::Conn>, SqlMapperError> {
        let conn = self.session.acquire()?;
        let setup = conn.with(|c| {
            c.set_auto_commit(false)?;
            c.set_transaction_isolation(IsolationLevel::STRICTEST)?;
            self.engine.prepare_connection(c)
        });
        match setup {
            Ok(()) => {
                debug!(conn_id = conn.id(), variant = self.engine.variant(), "Began transaction");
                Ok(conn)
            }
            Err(err) => {
                warn!(conn_id = conn.id(), error = %err, "Transaction setup failed");
                Err(self.session.invalidate(&conn, err))
            }
        }
    }

    fn roll_back(&self, conn: &ConnHandle<S::Conn>, cause: SqlMapperError) -> SqlMapperError {
        match conn.with(|c| c.rollback()) {
            Ok(()) => {
                debug!(conn_id = conn.id(), cause = %cause, "Rolled back transaction");
                self.session.invalidate(conn, cause)
            }
            Err(rollback_err) => {
                warn!(conn_id = conn.id(), error = %rollback_err, cause = %cause, "Rollback failed");
                self.session
                    .invalidate(conn, rollback_err.with_secondary(cause))
            }
        }
    }
}

/// Clears the thread's registration when the outermost `execute` ends. Dropped
/// without `finish`, the work panicked: roll back and close what we can.
struct ActiveGuard<'m, S: Session> {
    manager: &'m TransactionManager<S>,
    key: ThreadId,
    conn: ConnHandle<S::Conn>,
    finished: bool,
}

impl<S: Session> ActiveGuard<'_, S> {
    fn finish(mut self) {
        self.finished = true;
    }
}

impl<S: Session> Drop for ActiveGuard<'_, S> {
    fn drop(&mut self) {
        lock(&self.manager.active).remove(&self.key);
        if self.finished {
            return;
        }

        warn!(conn_id = self.conn.id(), "Unit of work panicked, rolling back");
        let cause = SqlMapperError::ExecutionError("unit of work panicked".to_string());
        let cause = match self.conn.with(|c| c.rollback()) {
            Ok(()) => cause,
            Err(rollback_err) => rollback_err.with_secondary(cause),
        };
        let err = self.manager.session.invalidate(&self.conn, cause);
        warn!(conn_id = self.conn.id(), error = %err, "Discarded connection after panic");
    }
}
