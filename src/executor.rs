//! Query Executor - runs one SQL statement against the SQLite store
//!
//! Store rejections are data, not errors: they come back as
//! [`ExecutionOutcome::Failed`] with the store's own message so the
//! orchestrator can branch on them.

use crate::config::DatabaseConfig;
use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Batch, Connection, OpenFlags};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Reported when the input holds more than one statement; nothing is executed
pub const MULTIPLE_STATEMENTS: &str = "You can only execute one statement at a time.";
/// Reported when the input holds no statement at all (blank or comments only)
pub const EMPTY_STATEMENT: &str = "empty SQL statement";

/// One result tuple, positional
pub type Row = Vec<Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionOutcome {
    Rows(Vec<Row>),
    Failed(String),
}

impl ExecutionOutcome {
    pub fn is_rows(&self) -> bool {
        matches!(self, ExecutionOutcome::Rows(_))
    }
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, sql: &str) -> ExecutionOutcome;
}

/// Executor backed by a SQLite file. Every call opens its own connection.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    path: PathBuf,
    read_only: bool,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            read_only: false,
        }
    }

    pub fn from_config(config: &DatabaseConfig) -> Self {
        Self::new(config.path.clone()).read_only(config.read_only)
    }

    /// Reject writes at the connection level
    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    fn open(&self) -> rusqlite::Result<Connection> {
        let flags = if self.read_only {
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
        } else {
            OpenFlags::default()
        };
        Connection::open_with_flags(&self.path, flags)
    }

    /// Blocking body of [`QueryExecutor::execute`]
    pub fn execute_blocking(&self, sql: &str) -> ExecutionOutcome {
        // The connection is dropped, and therefore closed, on both paths.
        let result = self
            .open()
            .map_err(|e| e.to_string())
            .and_then(|conn| fetch_all(&conn, sql));
        match result {
            Ok(rows) => {
                debug!(rows = rows.len(), "Statement executed");
                ExecutionOutcome::Rows(rows)
            }
            Err(message) => ExecutionOutcome::Failed(message),
        }
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute(&self, sql: &str) -> ExecutionOutcome {
        let executor = self.clone();
        let sql = sql.to_string();
        match tokio::task::spawn_blocking(move || executor.execute_blocking(&sql)).await {
            Ok(outcome) => outcome,
            Err(e) => ExecutionOutcome::Failed(format!("executor task failed: {}", e)),
        }
    }
}

/// Prepare exactly one statement and step it to completion.
///
/// `Connection::prepare` silently ignores everything after the first
/// statement, so the input is split with [`Batch`] and rejected before
/// anything runs if a second non-empty statement follows.
fn fetch_all(conn: &Connection, sql: &str) -> std::result::Result<Vec<Row>, String> {
    let mut batch = Batch::new(conn, sql);
    let mut stmt = match batch.next().map_err(|e| e.to_string())? {
        Some(stmt) => stmt,
        None => return Err(EMPTY_STATEMENT.to_string()),
    };
    // A trailing fragment that does not even compile still counts as a second statement
    if !matches!(batch.next(), Ok(None)) {
        return Err(MULTIPLE_STATEMENTS.to_string());
    }

    step_all(&mut stmt).map_err(|e| e.to_string())
}

fn step_all(stmt: &mut rusqlite::Statement<'_>) -> rusqlite::Result<Vec<Row>> {
    let column_count = stmt.column_count();
    let mut rows = stmt.query([])?;

    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut tuple = Vec::with_capacity(column_count);
        for idx in 0..column_count {
            tuple.push(to_json(row.get_ref(idx)?));
        }
        out.push(tuple);
    }
    Ok(out)
}

fn to_json(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{:02x}", b)).collect()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempDb;
    use serde_json::json;

    fn seeded_executor() -> (TempDb, SqliteExecutor) {
        let db = TempDb::new();
        let conn = Connection::open(db.path()).unwrap();
        conn.execute_batch(
            "CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT, price REAL, data BLOB, note TEXT);
             INSERT INTO items (name, price, data, note) VALUES ('pen', 1.5, x'0aff', NULL);
             INSERT INTO items (name, price, data, note) VALUES ('ink', 3.0, NULL, 'blue');",
        )
        .unwrap();
        let executor = SqliteExecutor::new(db.path());
        (db, executor)
    }

    #[tokio::test]
    async fn test_rows_are_positional_tuples() {
        let (_db, executor) = seeded_executor();
        let outcome = executor.execute("SELECT id, name, price, data, note FROM items ORDER BY id").await;
        assert_eq!(
            outcome,
            ExecutionOutcome::Rows(vec![
                vec![json!(1), json!("pen"), json!(1.5), json!("0aff"), Value::Null],
                vec![json!(2), json!("ink"), json!(3.0), Value::Null, json!("blue")],
            ])
        );
    }

    #[tokio::test]
    async fn test_zero_rows_is_success() {
        let (_db, executor) = seeded_executor();
        let outcome = executor.execute("SELECT * FROM items WHERE name = 'none'").await;
        assert_eq!(outcome, ExecutionOutcome::Rows(vec![]));
    }

    #[tokio::test]
    async fn test_store_errors_are_verbatim() {
        let (_db, executor) = seeded_executor();

        match executor.execute("SELECT colour FROM items").await {
            ExecutionOutcome::Failed(msg) => assert!(msg.contains("no such column: colour"), "{}", msg),
            other => panic!("expected failure, got {:?}", other),
        }
        match executor.execute("SELECT * FROM orders").await {
            ExecutionOutcome::Failed(msg) => assert!(msg.contains("no such table: orders"), "{}", msg),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_statements_are_rejected() {
        let (_db, executor) = seeded_executor();

        let outcome = executor.execute("SELECT 1; DELETE FROM items").await;
        assert_eq!(outcome, ExecutionOutcome::Failed(MULTIPLE_STATEMENTS.to_string()));

        let outcome = executor.execute("SELECT name FROM items; this is not sql").await;
        assert_eq!(outcome, ExecutionOutcome::Failed(MULTIPLE_STATEMENTS.to_string()));

        // Nothing after the first statement ran
        let remaining = executor.execute("SELECT COUNT(*) FROM items").await;
        assert_eq!(remaining, ExecutionOutcome::Rows(vec![vec![json!(2)]]));
    }

    #[tokio::test]
    async fn test_trailing_semicolon_and_comment_are_one_statement() {
        let (_db, executor) = seeded_executor();
        let outcome = executor.execute("SELECT COUNT(*) FROM items; -- all of them\n").await;
        assert_eq!(outcome, ExecutionOutcome::Rows(vec![vec![json!(2)]]));
    }

    #[tokio::test]
    async fn test_empty_statement_fails_explicitly() {
        let (_db, executor) = seeded_executor();
        for sql in ["", "   ", ";", "-- nothing here"] {
            assert_eq!(
                executor.execute(sql).await,
                ExecutionOutcome::Failed(EMPTY_STATEMENT.to_string()),
                "input {:?}",
                sql
            );
        }
    }

    #[tokio::test]
    async fn test_read_only_blocks_writes() {
        let (_db, executor) = seeded_executor();
        let executor = executor.read_only(true);

        let outcome = executor.execute("DELETE FROM items").await;
        match outcome {
            ExecutionOutcome::Failed(msg) => assert!(msg.contains("readonly"), "{}", msg),
            other => panic!("expected failure, got {:?}", other),
        }
        assert!(executor.execute("SELECT name FROM items").await.is_rows());
    }
}
