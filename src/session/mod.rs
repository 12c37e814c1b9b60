//! Connection lifecycle: acquire, release, invalidate.

mod caching;
mod default;

pub use caching::CachingSession;
pub use default::DefaultSession;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::connection::Connection;
use crate::error::SqlMapperError;

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// A connection issued by a session. Handles are compared by identity, so the
/// session can tell its own connections from foreign ones.
pub struct SessionConnection<C> {
    id: u64,
    conn: Mutex<Option<C>>,
}

/// Shared handle to a session-issued connection.
pub type ConnHandle<C> = Arc<SessionConnection<C>>;

impl<C: Connection> SessionConnection<C> {
    pub(crate) fn new(conn: C) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            conn: Mutex::new(Some(conn)),
        }
    }

    /// Process-unique id of this connection, for logs.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Run `func` against the underlying connection.
    ///
    /// # Errors
    /// Returns `SqlMapperError::ConnectionError` if the connection was already closed,
    /// otherwise whatever `func` returns.
    pub fn with<R>(
        &self,
        func: impl FnOnce(&mut C) -> Result<R, SqlMapperError>,
    ) -> Result<R, SqlMapperError> {
        let mut guard = lock(&self.conn);
        let conn = guard.as_mut().ok_or_else(|| {
            SqlMapperError::ConnectionError(format!("connection {} is closed", self.id))
        })?;
        func(conn)
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        lock(&self.conn).is_none()
    }

    pub(crate) fn take(&self) -> Option<C> {
        lock(&self.conn).take()
    }
}

impl<C> fmt::Debug for SessionConnection<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConnection")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

/// Owns the life cycle of connections: each acquired connection must later be
/// released, or invalidated if something went wrong while using it.
pub trait Session: Send + Sync {
    type Conn: Connection;

    /// Hand out a connection for the calling unit of work.
    ///
    /// # Errors
    /// Returns the factory error if a new connection cannot be opened.
    fn acquire(&self) -> Result<ConnHandle<Self::Conn>, SqlMapperError>;

    /// Give a healthy connection back. The session decides whether to keep it.
    ///
    /// # Errors
    /// Returns `UnknownConnection` if `conn` is not checked out by the caller, or the
    /// factory error if closing it fails.
    fn release(&self, conn: &ConnHandle<Self::Conn>) -> Result<(), SqlMapperError>;

    /// Close a connection that must not be reused and hand back the error the caller
    /// should propagate: `cause` itself, or the close failure carrying `cause` as its
    /// secondary error.
    fn invalidate(&self, conn: &ConnHandle<Self::Conn>, cause: SqlMapperError) -> SqlMapperError;
}

/// Lock a mutex, recovering the data if a previous holder panicked.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
