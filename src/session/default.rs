use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use crate::connection::ConnectionFactory;
use crate::error::SqlMapperError;

use super::{ConnHandle, Session, SessionConnection, lock};

/// Session without reuse: every `acquire` opens a new connection and every
/// `release` closes it.
pub struct DefaultSession<F: ConnectionFactory> {
    factory: F,
    connections: Mutex<Vec<ConnHandle<F::Conn>>>,
}

impl<F: ConnectionFactory> DefaultSession<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            connections: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Number of connections handed out and not yet released.
    #[must_use]
    pub fn open_connections(&self) -> usize {
        lock(&self.connections).len()
    }

    fn forget(&self, conn: &ConnHandle<F::Conn>) -> Result<(), SqlMapperError> {
        let mut connections = lock(&self.connections);
        let idx = connections
            .iter()
            .position(|known| Arc::ptr_eq(known, conn))
            .ok_or(SqlMapperError::UnknownConnection)?;
        connections.swap_remove(idx);
        Ok(())
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

impl<F: ConnectionFactory> Session for DefaultSession<F> {
    type Conn = F::Conn;

    fn acquire(&self) -> Result<ConnHandle<F::Conn>, SqlMapperError> {
        let conn = Arc::new(SessionConnection::new(self.factory.create()?));
        debug!(conn_id = conn.id(), "Created connection");
        lock(&self.connections).push(Arc::clone(&conn));
        Ok(conn)
    }

    fn release(&self, conn: &ConnHandle<F::Conn>) -> Result<(), SqlMapperError> {
        self.forget(conn)?;
        self.close(conn)
    }

    fn invalidate(&self, conn: &ConnHandle<F::Conn>, cause: SqlMapperError) -> SqlMapperError {
        match self.release(conn) {
            Ok(()) => cause,
            Err(err) => {
                warn!(conn_id = conn.id(), error = %err, "Invalidating connection failed");
                err.with_secondary(cause)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockFactory;

    #[test]
    fn every_acquire_opens_a_new_connection() {
        let session = DefaultSession::new(MockFactory::new());
        let a = session.acquire().unwrap();
        let b = session.acquire().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(session.open_connections(), 2);

        session.release(&a).unwrap();
        session.release(&b).unwrap();
        assert_eq!(session.open_connections(), 0);
        assert_eq!(session.factory().closed().len(), 2);
    }

    #[test]
    fn double_release_is_unknown() {
        let session = DefaultSession::new(MockFactory::new());
        let conn = session.acquire().unwrap();
        session.release(&conn).unwrap();
        assert!(session.release(&conn).unwrap_err().is_unknown_connection());
    }

    #[test]
    fn invalidate_returns_cause_or_chains_it() {
        let session = DefaultSession::new(MockFactory::new());
        let conn = session.acquire().unwrap();
        let err = session.invalidate(&conn, SqlMapperError::ExecutionError("e1".into()));
        assert!(matches!(err, SqlMapperError::ExecutionError(ref m) if m == "e1"));

        let err = session.invalidate(&conn, SqlMapperError::ExecutionError("e2".into()));
        assert!(err.is_unknown_connection());
        assert!(matches!(err.secondary(), Some(SqlMapperError::ExecutionError(m)) if m == "e2"));
    }
}
