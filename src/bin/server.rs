//! HTTP Server for the translate-execute-repair pipeline

use sql_autofix::config::Config;
use sql_autofix::orchestrator::QueryOrchestrator;
use sql_autofix::{logging, server};

use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let config = Config::from_env()?;
    if !config.database.path.exists() {
        warn!(path = %config.database.path.display(), "Database file not found; run `sql-autofix setup-db` first");
    }

    info!(bind = %config.bind_addr, "Starting server");
    let orchestrator = Arc::new(QueryOrchestrator::from_config(&config)?);

    server::run(&config.bind_addr, orchestrator)
        .await
        .with_context(|| format!("Failed to serve on {}", config.bind_addr))?;
    Ok(())
}
