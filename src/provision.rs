//! Demo store provisioning
//!
//! Creates the `users` table the CLI and integration tests query against and
//! seeds two California rows. Safe to run repeatedly.

use crate::error::Result;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

/// Schema context describing the demo table, suitable for `QueryRequest::schema`
pub const DEMO_SCHEMA: &str = "Table users (
    id INTEGER PRIMARY KEY,
    username TEXT,
    first_name TEXT,
    last_name TEXT,
    state TEXT,
    email TEXT,
    status TEXT,
    confirm_email BOOLEAN
)";

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY,
    username TEXT,
    first_name TEXT,
    last_name TEXT,
    state TEXT,
    email TEXT,
    status TEXT,
    confirm_email BOOLEAN
)
"#;

struct DemoUser {
    username: &'static str,
    first_name: &'static str,
    last_name: &'static str,
    state: &'static str,
    email: &'static str,
    status: &'static str,
    confirm_email: bool,
}

const DEMO_USERS: [DemoUser; 2] = [
    DemoUser {
        username: "user1",
        first_name: "Alice",
        last_name: "Smith",
        state: "California",
        email: "alice@example.com",
        status: "active",
        confirm_email: true,
    },
    DemoUser {
        username: "user2",
        first_name: "Bob",
        last_name: "Johnson",
        state: "California",
        email: "bob@example.com",
        status: "active",
        confirm_email: true,
    },
];

/// Create the demo table and seed it when empty. Returns the number of rows inserted.
pub fn provision_demo_store(path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let mut conn = Connection::open(path)?;
    let tx = conn.transaction()?;

    tx.execute(CREATE_USERS, [])?;

    let existing: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let mut inserted = 0;
    if existing == 0 {
        for user in &DEMO_USERS {
            inserted += tx.execute(
                "INSERT INTO users (username, first_name, last_name, state, email, status, confirm_email)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    user.username,
                    user.first_name,
                    user.last_name,
                    user.state,
                    user.email,
                    user.status,
                    user.confirm_email
                ],
            )?;
        }
    }
    tx.commit()?;

    info!(path = %path.display(), inserted, "Demo store ready");
    Ok(inserted)
}
