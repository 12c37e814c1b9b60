use std::borrow::Cow;

use tracing::trace;

use crate::connection::Connection;
use crate::error::SqlMapperError;
use crate::results::ResultSet;
use crate::types::{IsolationLevel, RowValues};

use super::query::build_result_set;

/// A rusqlite connection behind the `Connection` contract.
///
/// `SQLite` has no session autocommit switch. With autocommit off, a `BEGIN` is sent
/// before the first statement of each transaction, and `commit`/`rollback` end it.
#[derive(Debug)]
pub struct SqliteConnection {
    conn: rusqlite::Connection,
    auto_commit: bool,
}

impl SqliteConnection {
    #[must_use]
    pub fn new(conn: rusqlite::Connection) -> Self {
        Self {
            conn,
            auto_commit: true,
        }
    }

    /// The wrapped rusqlite connection.
    #[must_use]
    pub fn raw(&self) -> &rusqlite::Connection {
        &self.conn
    }

    pub(crate) fn into_raw(self) -> rusqlite::Connection {
        self.conn
    }

    /// Whether a transaction is currently open on the database handle.
    #[must_use]
    pub fn in_transaction(&self) -> bool {
        !self.conn.is_autocommit()
    }

    fn ensure_transaction(&mut self) -> Result<(), SqlMapperError> {
        if !self.auto_commit && !self.in_transaction() {
            trace!("BEGIN");
            self.conn.execute_batch("BEGIN")?;
        }
        Ok(())
    }

    fn end_transaction(&mut self, statement: &str) -> Result<(), SqlMapperError> {
        if self.in_transaction() {
            trace!("{statement}");
            self.conn.execute_batch(statement)?;
        }
        Ok(())
    }
}

impl Connection for SqliteConnection {
    fn set_auto_commit(&mut self, enabled: bool) -> Result<(), SqlMapperError> {
        if enabled && !self.auto_commit {
            self.end_transaction("COMMIT")?;
        }
        self.auto_commit = enabled;
        Ok(())
    }

    fn set_transaction_isolation(&mut self, level: IsolationLevel) -> Result<(), SqlMapperError> {
        // Only shared-cache connections can relax isolation; everything else is
        // serializable already.
        let read_uncommitted = i32::from(level == IsolationLevel::ReadUncommitted);
        self.conn
            .execute_batch(&format!("PRAGMA read_uncommitted = {read_uncommitted}"))?;
        Ok(())
    }

    fn execute_batch(&mut self, sql: &str) -> Result<(), SqlMapperError> {
        self.ensure_transaction()?;
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    fn execute_update(&mut self, sql: &str) -> Result<usize, SqlMapperError> {
        self.ensure_transaction()?;
        Ok(self.conn.execute(sql, [])?)
    }

    fn execute_insert(&mut self, sql: &str) -> Result<Vec<RowValues>, SqlMapperError> {
        self.ensure_transaction()?;
        let sql = returning_rowid(sql);
        let mut stmt = self.conn.prepare(&sql)?;
        let keys = build_result_set(&mut stmt)?
            .into_value_rows()
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect();
        Ok(keys)
    }

    fn execute_query(&mut self, sql: &str) -> Result<ResultSet, SqlMapperError> {
        self.ensure_transaction()?;
        let mut stmt = self.conn.prepare(sql)?;
        build_result_set(&mut stmt)
    }

    fn commit(&mut self) -> Result<(), SqlMapperError> {
        self.end_transaction("COMMIT")
    }

    fn rollback(&mut self) -> Result<(), SqlMapperError> {
        self.end_transaction("ROLLBACK")
    }
}

/// Ask the statement to report the rowid of every row it inserts, unless it already
/// has a RETURNING clause of its own. Tables declared WITHOUT ROWID need an explicit
/// RETURNING clause.
fn returning_rowid(sql: &str) -> Cow<'_, str> {
    let has_returning = sql
        .split(|c: char| !c.is_ascii_alphanumeric() && c != '_')
        .any(|word| word.eq_ignore_ascii_case("returning"));
    if has_returning {
        return Cow::Borrowed(sql);
    }
    let body = sql.trim_end().trim_end_matches(';').trim_end();
    Cow::Owned(format!("{body} returning rowid"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory() -> SqliteConnection {
        let mut conn = SqliteConnection::new(rusqlite::Connection::open_in_memory().unwrap());
        conn.execute_batch("create table t (id integer primary key, name text)")
            .unwrap();
        conn
    }

    #[test]
    fn autocommit_on_runs_statements_immediately() {
        let mut conn = memory();
        let keys = conn.execute_insert("insert into t (name) values ('a')").unwrap();
        assert_eq!(keys, vec![RowValues::Int(1)]);
        assert!(!conn.in_transaction());
    }

    #[test]
    fn autocommit_off_opens_transaction_lazily() {
        let mut conn = memory();
        conn.set_auto_commit(false).unwrap();
        assert!(!conn.in_transaction());

        conn.execute_update("insert into t (name) values ('a')").unwrap();
        assert!(conn.in_transaction());
        conn.rollback().unwrap();
        assert!(!conn.in_transaction());

        let rows = conn.execute_query("select count(*) as n from t").unwrap();
        assert_eq!(rows.results[0].get("n"), Some(&RowValues::Int(0)));
        conn.commit().unwrap();
    }

    #[test]
    fn enabling_autocommit_commits_open_transaction() {
        let mut conn = memory();
        conn.set_auto_commit(false).unwrap();
        conn.execute_update("insert into t (name) values ('a')").unwrap();
        conn.set_auto_commit(true).unwrap();
        assert!(!conn.in_transaction());
        let rows = conn.execute_query("select name from t").unwrap();
        assert_eq!(rows.into_value_rows(), vec![vec![RowValues::Text("a".into())]]);
    }

    #[test]
    fn multi_row_insert_returns_every_key() {
        let mut conn = memory();
        conn.execute_insert("insert into t (name) values ('a')").unwrap();
        let keys = conn
            .execute_insert("insert into t (name) values ('b'), ('c');")
            .unwrap();
        assert_eq!(keys, vec![RowValues::Int(2), RowValues::Int(3)]);
    }

    #[test]
    fn explicit_returning_clause_is_kept() {
        let mut conn = memory();
        let keys = conn
            .execute_insert("insert into t (name) values ('x') RETURNING name")
            .unwrap();
        assert_eq!(keys, vec![RowValues::Text("x".into())]);
        assert_eq!(returning_rowid("insert into t values (1)"), "insert into t values (1) returning rowid");
    }

    #[test]
    fn insert_without_rows_returns_no_keys() {
        let mut conn = memory();
        let keys = conn
            .execute_insert("insert into t (name) select name from t where 1 = 0")
            .unwrap();
        assert!(keys.is_empty());
    }

    #[test]
    fn query_converts_column_kinds() {
        let mut conn = memory();
        let rows = conn
            .execute_query("select 1 as i, 1.5 as f, 'x' as s, null as n, x'0102' as b")
            .unwrap();
        let row = &rows.results[0];
        assert_eq!(row.get("i"), Some(&RowValues::Int(1)));
        assert_eq!(row.get("f"), Some(&RowValues::Float(1.5)));
        assert_eq!(row.get("s"), Some(&RowValues::Text("x".into())));
        assert_eq!(row.get("n"), Some(&RowValues::Null));
        assert_eq!(row.get("b"), Some(&RowValues::Blob(vec![1, 2])));
    }

    #[test]
    fn driver_errors_surface() {
        let mut conn = memory();
        let err = conn.execute_update("insert into missing values (1)").unwrap_err();
        assert!(matches!(err, SqlMapperError::SqliteError(_)));
    }
}
