//! Scripted collaborators shared by unit tests

use crate::error::{AutofixError, Result};
use crate::llm::{CompletionRequest, ReasoningClient};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Replays canned replies in order and records every request it sees.
/// An `Err` entry simulates the service being unreachable.
pub struct ScriptedClient {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    pub requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedClient {
    pub fn new(replies: Vec<std::result::Result<&str, &str>>) -> Self {
        Self {
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok(*r)).collect())
    }

    pub fn recorded(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReasoningClient for ScriptedClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(AutofixError::Llm(message)),
            None => Err(AutofixError::Llm("script exhausted".to_string())),
        }
    }
}

/// Fresh SQLite path under the temp dir, removed again when dropped
pub struct TempDb {
    path: PathBuf,
}

impl TempDb {
    pub fn new() -> Self {
        Self {
            path: std::env::temp_dir().join(format!("sql-autofix-{}.sqlite", uuid::Uuid::new_v4())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_db_is_removed_on_drop() {
        let db = TempDb::new();
        std::fs::write(db.path(), b"x").unwrap();
        let path = db.path().to_path_buf();
        assert!(path.exists());

        drop(db);
        assert!(!path.exists());
    }
}
