pub mod agents;
pub mod config;
pub mod error;
pub mod executor;
pub mod llm;
pub mod logging;
pub mod orchestrator;
pub mod prompts;
pub mod provision;
pub mod server;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::Config;
pub use error::{AutofixError, PipelineError, Result, Stage};
pub use executor::{ExecutionOutcome, QueryExecutor, SqliteExecutor};
pub use llm::{LlmClient, ReasoningClient};
pub use orchestrator::{QueryOrchestrator, QueryRequest, QueryResult};
