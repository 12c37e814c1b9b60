use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::thread::{self, ThreadId};

use tracing::{debug, warn};

use crate::connection::ConnectionFactory;
use crate::error::SqlMapperError;

use super::{ConnHandle, Session, SessionConnection, lock};

struct SessionState<C> {
    checked_out: HashMap<ThreadId, ConnHandle<C>>,
    free: Option<ConnHandle<C>>,
}

impl<C> SessionState<C> {
    fn ensure_owned(&self, key: ThreadId, conn: &ConnHandle<C>) -> Result<(), SqlMapperError> {
        match self.checked_out.get(&key) {
            Some(current) if Arc::ptr_eq(current, conn) => Ok(()),
            _ => Err(SqlMapperError::UnknownConnection),
        }
    }
}

/// Session that keeps the last released connection for reuse.
///
/// While a thread holds a connection, every `acquire` on that thread returns it;
/// other threads get their own. On release the connection is parked in a single
/// free slot, and the next `acquire` from any thread takes it from there. A release
/// that finds the slot occupied closes the connection instead.
pub struct CachingSession<F: ConnectionFactory> {
    factory: F,
    state: Mutex<SessionState<F::Conn>>,
}

impl<F: ConnectionFactory> CachingSession<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Mutex::new(SessionState {
                checked_out: HashMap::new(),
                free: None,
            }),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Whether a released connection is currently parked for reuse.
    #[must_use]
    pub fn has_free_connection(&self) -> bool {
        lock(&self.state).free.is_some()
    }

    fn close(&self, conn: &ConnHandle<F::Conn>) -> Result<(), SqlMapperError> {
        match conn.take() {
            Some(raw) => {
                debug!(conn_id = conn.id(), "Closing connection");
                self.factory.close(raw)
            }
            None => Ok(()),
        }
    }
}

impl<F: ConnectionFactory> Session for CachingSession<F> {
    type Conn = F::Conn;

    fn acquire(&self) -> Result<ConnHandle<F::Conn>, SqlMapperError> {
        let key = thread::current().id();
        {
            let mut state = lock(&self.state);
            if let Some(current) = state.checked_out.get(&key) {
                return Ok(Arc::clone(current));
            }
            if let Some(free) = state.free.take() {
                debug!(conn_id = free.id(), "Reusing free connection");
                state.checked_out.insert(key, Arc::clone(&free));
                return Ok(free);
            }
        }

        // Only this thread registers under `key`, so opening the connection can
        // happen without holding the lock.
        let conn = Arc::new(SessionConnection::new(self.factory.create()?));
        debug!(conn_id = conn.id(), "Created connection");
        lock(&self.state).checked_out.insert(key, Arc::clone(&conn));
        Ok(conn)
    }

    fn release(&self, conn: &ConnHandle<F::Conn>) -> Result<(), SqlMapperError> {
        let key = thread::current().id();
        let overflow = {
            let mut state = lock(&self.state);
            state.ensure_owned(key, conn)?;
            state.checked_out.remove(&key);
            if state.free.is_none() {
                debug!(conn_id = conn.id(), "Parking released connection");
                state.free = Some(Arc::clone(conn));
                false
            } else {
                true
            }
        };

        if overflow { self.close(conn) } else { Ok(()) }
    }

    fn invalidate(&self, conn: &ConnHandle<F::Conn>, cause: SqlMapperError) -> SqlMapperError {
        let key = thread::current().id();
        {
            let mut state = lock(&self.state);
            if let Err(err) = state.ensure_owned(key, conn) {
                return err.with_secondary(cause);
            }
            state.checked_out.remove(&key);
            if state.free.as_ref().is_some_and(|free| Arc::ptr_eq(free, conn)) {
                state.free = None;
            }
        }

        debug!(conn_id = conn.id(), cause = %cause, "Invalidating connection");
        match self.close(conn) {
            Ok(()) => cause,
            Err(close_err) => {
                warn!(conn_id = conn.id(), error = %close_err, "Closing invalid connection failed");
                close_err.with_secondary(cause)
            }
        }
    }
}

impl<F: ConnectionFactory> Drop for CachingSession<F> {
    fn drop(&mut self) {
        let state = lock(&self.state);
        let handles = state.free.iter().chain(state.checked_out.values());
        for conn in handles {
            if let Some(raw) = conn.take()
                && let Err(err) = self.factory.close(raw)
            {
                warn!(conn_id = conn.id(), error = %err, "Closing connection on session drop failed");
            }
        }
    }
}
