//! Query Orchestrator - translate, execute, and at most one repair cycle
//!
//! ```text
//! START -> TRANSLATED -> EXECUTED_OK                                   (Success)
//!                     -> EXEC_FAILED -> EXPLAINED -> REPAIRED -> REEXEC_OK     (Recovered)
//!                                                             -> REEXEC_FAILED (Unrecovered)
//! ```
//!
//! Only the first store rejection is recovered. Reasoning-service failures
//! surface as [`PipelineError`] tagged with the step that failed.

use crate::agents::{ErrorExplainer, QueryRepairer, SqlTranslator};
use crate::config::Config;
use crate::error::{AutofixError, PipelineError, Result, Stage};
use crate::executor::{ExecutionOutcome, QueryExecutor, Row, SqliteExecutor};
use crate::llm::{LlmClient, ReasoningClient};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One incoming question, validated on construction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub question: String,
    #[serde(default)]
    pub schema: Option<String>,
}

impl QueryRequest {
    pub fn new(question: impl Into<String>, schema: Option<String>) -> Result<Self> {
        let question = question.into();
        if question.trim().is_empty() {
            return Err(AutofixError::InvalidRequest("question must not be empty".to_string()));
        }
        Ok(Self { question, schema })
    }
}

/// Terminal payload. Each variant serializes to exactly its own keys.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum QueryResult {
    /// First execution succeeded
    Success { sql: String, results: Vec<Row> },
    /// First execution failed, repaired SQL succeeded
    Recovered {
        original_sql: String,
        error: String,
        explanation: String,
        fixed_sql: String,
        results: Vec<Row>,
    },
    /// Both executions failed
    Unrecovered {
        original_sql: String,
        error: String,
        explanation: String,
        fixed_sql: String,
        fix_error: String,
    },
}

impl QueryResult {
    pub fn results(&self) -> Option<&[Row]> {
        match self {
            QueryResult::Success { results, .. } | QueryResult::Recovered { results, .. } => Some(results),
            QueryResult::Unrecovered { .. } => None,
        }
    }

    /// Short label for logs
    pub fn outcome(&self) -> &'static str {
        match self {
            QueryResult::Success { .. } => "success",
            QueryResult::Recovered { .. } => "recovered",
            QueryResult::Unrecovered { .. } => "unrecovered",
        }
    }
}

pub struct QueryOrchestrator {
    translator: SqlTranslator,
    explainer: ErrorExplainer,
    repairer: QueryRepairer,
    executor: Arc<dyn QueryExecutor>,
}

impl QueryOrchestrator {
    pub fn new(client: Arc<dyn ReasoningClient>, executor: Arc<dyn QueryExecutor>) -> Self {
        Self {
            translator: SqlTranslator::new(Arc::clone(&client)),
            explainer: ErrorExplainer::new(Arc::clone(&client)),
            repairer: QueryRepairer::new(client),
            executor,
        }
    }

    /// HTTP model client plus SQLite executor, both from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = LlmClient::from_config(&config.llm)?;
        info!(
            model = client.model(),
            endpoint = %config.llm.base_url,
            read_only = config.database.read_only,
            "LLM client ready"
        );
        let executor = SqliteExecutor::from_config(&config.database);
        Ok(Self::new(Arc::new(client), Arc::new(executor)))
    }

    pub async fn run(&self, request: &QueryRequest) -> std::result::Result<QueryResult, PipelineError> {
        let sql = self
            .translator
            .translate(&request.question, request.schema.as_deref())
            .await
            .map_err(|e| PipelineError::new(Stage::Translate, e))?;
        info!(%sql, "Generated SQL");

        let error = match self.executor.execute(&sql).await {
            ExecutionOutcome::Rows(results) => {
                info!(rows = results.len(), "Query succeeded on first attempt");
                return Ok(QueryResult::Success { sql, results });
            }
            ExecutionOutcome::Failed(error) => error,
        };
        warn!(%sql, %error, "Query failed, entering repair cycle");

        let explanation = self
            .explainer
            .explain(&sql, &error)
            .await
            .map_err(|e| PipelineError::new(Stage::Explain, e).with_failed_attempt(&sql, &error))?;

        let fixed_sql = self
            .repairer
            .repair(&sql, &explanation)
            .await
            .map_err(|e| PipelineError::new(Stage::Repair, e).with_failed_attempt(&sql, &error))?;
        info!(%fixed_sql, "Repaired SQL");

        // Second and final attempt
        match self.executor.execute(&fixed_sql).await {
            ExecutionOutcome::Rows(results) => {
                info!(rows = results.len(), "Repaired query succeeded");
                Ok(QueryResult::Recovered {
                    original_sql: sql,
                    error,
                    explanation,
                    fixed_sql,
                    results,
                })
            }
            ExecutionOutcome::Failed(fix_error) => {
                warn!(%fixed_sql, %fix_error, "Repaired query failed");
                Ok(QueryResult::Unrecovered {
                    original_sql: sql,
                    error,
                    explanation,
                    fixed_sql,
                    fix_error,
                })
            }
        }
    }
}
