//! Scriptable in-memory connections for exercising sessions and transactions
//! without a database.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::connection::{Connection, ConnectionFactory};
use crate::error::SqlMapperError;
use crate::results::ResultSet;
use crate::session::lock;
use crate::types::{IsolationLevel, RowValues};

/// One recorded interaction with a `MockConnection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    AutoCommit(bool),
    Isolation(IsolationLevel),
    Batch(String),
    Update(String),
    Insert(String),
    Query(String),
    Commit,
    Rollback,
}

/// Shared, append-only record of calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<Call>>>);

impl CallLog {
    fn push(&self, call: Call) {
        lock(&self.0).push(call);
    }

    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        lock(&self.0).clone()
    }

    #[must_use]
    pub fn count(&self, call: &Call) -> usize {
        lock(&self.0).iter().filter(|c| *c == call).count()
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.count(&Call::Commit)
    }

    #[must_use]
    pub fn rollbacks(&self) -> usize {
        self.count(&Call::Rollback)
    }
}

#[derive(Debug, Default)]
struct Faults {
    create: Option<String>,
    close: Option<String>,
    auto_commit: Option<String>,
    batch: Option<String>,
    update: Option<String>,
    query: Option<String>,
    commit: Option<String>,
    rollback: Option<String>,
}

#[derive(Debug, Default)]
struct Script {
    faults: Faults,
    affected: usize,
    keys: Vec<RowValues>,
    rows: ResultSet,
}

fn fault(slot: &Option<String>) -> Result<(), SqlMapperError> {
    match slot {
        Some(msg) => Err(SqlMapperError::ExecutionError(msg.clone())),
        None => Ok(()),
    }
}

/// In-memory `Connection` that records every call and fails on demand.
#[derive(Debug)]
pub struct MockConnection {
    id: u64,
    log: CallLog,
    script: Arc<Mutex<Script>>,
}

impl MockConnection {
    #[must_use]
    pub fn new(id: u64) -> Self {
        Self {
            id,
            log: CallLog::default(),
            script: Arc::default(),
        }
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    pub fn set_affected(&mut self, affected: usize) {
        lock(&self.script).affected = affected;
    }

    pub fn set_keys(&mut self, keys: Vec<RowValues>) {
        lock(&self.script).keys = keys;
    }

    pub fn set_rows(&mut self, rows: ResultSet) {
        lock(&self.script).rows = rows;
    }

    pub fn fail_on_batch(&mut self, msg: &str) {
        lock(&self.script).faults.batch = Some(msg.to_string());
    }

    pub fn fail_on_update(&mut self, msg: &str) {
        lock(&self.script).faults.update = Some(msg.to_string());
    }

    fn check(&self, pick: impl FnOnce(&Faults) -> &Option<String>) -> Result<(), SqlMapperError> {
        fault(pick(&lock(&self.script).faults))
    }
}

impl Connection for MockConnection {
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlMapperError> {
        self.log.push(Call::AutoCommit(enabled));
        self.check(|f| &f.auto_commit)
    }

    fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<(), SqlMapperError> {
        self.log.push(Call::Isolation(level));
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlMapperError> {
        self.log.push(Call::Batch(sql.to_string()));
        self.check(|f| &f.batch)
    }

    fn execute_update(&mut self, sql: &str) -> Result<usize, SqlMapperError> {
        self.log.push(Call::Update(sql.to_string()));
        self.check(|f| &f.update)?;
        Ok(lock(&self.script).affected)
    }

    fn execute_insert(&mut self, sql: &str) -> Result<Vec<RowValues>, SqlMapperError> {
        self.log.push(Call::Insert(sql.to_string()));
        self.check(|f| &f.update)?;
        Ok(lock(&self.script).keys.clone())
    }

    fn execute_query(&mut self, sql: &str) -> Result<ResultSet, SqlMapperError> {
        self.log.push(Call::Query(sql.to_string()));
        self.check(|f| &f.query)?;
        Ok(lock(&self.script).rows.clone())
    }

    fn commit(&mut self) -> Result<(), SqlMapperError> {
        self.log.push(Call::Commit);
        self.check(|f| &f.commit)
    }

    fn rollback(&mut self) -> Result<(), SqlMapperError> {
        self.log.push(Call::Rollback);
        self.check(|f| &f.rollback)
    }
}

/// Factory of `MockConnection`s sharing one call log and one failure script, so a
/// test can change behaviour after connections were handed out.
#[derive(Debug, Default)]
pub struct MockFactory {
    next_id: AtomicU64,
    created: AtomicUsize,
    closed: Arc<Mutex<Vec<u64>>>,
    log: CallLog,
    script: Arc<Mutex<Script>>,
}

impl MockFactory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls made on every connection this factory created.
    #[must_use]
    pub fn log(&self) -> CallLog {
        self.log.clone()
    }

    #[must_use]
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Ids of the connections closed so far.
    #[must_use]
    pub fn closed(&self) -> Vec<u64> {
        lock(&self.closed).clone()
    }

    /// Handle on the closed-id list that outlives the factory.
    #[must_use]
    pub fn closed_log(&self) -> Arc<Mutex<Vec<u64>>> {
        Arc::clone(&self.closed)
    }

    pub fn fail_create(&self, msg: &str) {
        lock(&self.script).faults.create = Some(msg.to_string());
    }

    pub fn fail_close(&self, msg: &str) {
        lock(&self.script).faults.close = Some(msg.to_string());
    }

    pub fn fail_auto_commit(&self, msg: &str) {
        lock(&self.script).faults.auto_commit = Some(msg.to_string());
    }

    pub fn fail_batch(&self, msg: &str) {
        lock(&self.script).faults.batch = Some(msg.to_string());
    }

    pub fn fail_update(&self, msg: &str) {
        lock(&self.script).faults.update = Some(msg.to_string());
    }

    pub fn fail_query(&self, msg: &str) {
        lock(&self.script).faults.query = Some(msg.to_string());
    }

    pub fn fail_commit(&self, msg: &str) {
        lock(&self.script).faults.commit = Some(msg.to_string());
    }

    pub fn fail_rollback(&self, msg: &str) {
        lock(&self.script).faults.rollback = Some(msg.to_string());
    }

    pub fn clear_faults(&self) {
        lock(&self.script).faults = Faults::default();
    }

    pub fn set_affected(&self, affected: usize) {
        lock(&self.script).affected = affected;
    }

    pub fn set_rows(&self, rows: ResultSet) {
        lock(&self.script).rows = rows;
    }

    pub fn set_keys(&self, keys: Vec<RowValues>) {
        lock(&self.script).keys = keys;
    }
}

impl ConnectionFactory for MockFactory {
    type Conn = MockConnection;

    fn create(&self) -> Result<MockConnection, SqlMapperError> {
        fault(&lock(&self.script).faults.create)?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockConnection {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            log: self.log.clone(),
            script: Arc::clone(&self.script),
        })
    }

    fn close(&self, conn: MockConnection) -> Result<(), SqlMapperError> {
        lock(&self.closed).push(conn.id);
        fault(&lock(&self.script).faults.close)
    }
}
