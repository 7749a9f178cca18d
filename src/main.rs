use sql_autofix::config::Config;
use sql_autofix::orchestrator::{QueryOrchestrator, QueryRequest};
use sql_autofix::provision::provision_demo_store;
use sql_autofix::{logging, server};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "sql-autofix")]
#[command(about = "Natural-language questions to SQL, with one automatic repair attempt")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question and print the JSON payload
    Ask {
        /// The question in natural language
        question: String,

        /// Free-text description of the available tables and columns
        #[arg(short, long)]
        schema: Option<String>,

        /// SQLite database file (default: DATABASE_PATH or ./mydb.sqlite)
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    /// Create and seed the demo `users` table
    SetupDb {
        #[arg(short, long)]
        database: Option<PathBuf>,
    },
    /// Run the HTTP API
    Serve {
        /// Listen address (default: BIND_ADDR or 0.0.0.0:8000)
        #[arg(short, long)]
        bind: Option<String>,

        #[arg(short, long)]
        database: Option<PathBuf>,
    },
}


#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let args = Args::parse();
    let mut config = Config::from_env()?;

    match args.command {
        Commands::Ask { question, schema, database } => {
            if let Some(path) = database {
                config.database.path = path;
            }
            let request = QueryRequest::new(question, schema)?;
            let orchestrator = QueryOrchestrator::from_config(&config)?;
            let result = orchestrator.run(&request).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::SetupDb { database } => {
            let path = database.unwrap_or(config.database.path);
            let inserted = provision_demo_store(&path)
                .with_context(|| format!("Failed to provision {}", path.display()))?;
            println!("Database setup complete! ({} rows inserted)", inserted);
        }
        Commands::Serve { bind, database } => {
            if let Some(path) = database {
                config.database.path = path;
            }
            let bind = bind.unwrap_or_else(|| config.bind_addr.clone());
            let orchestrator = Arc::new(QueryOrchestrator::from_config(&config)?);
            server::run(&bind, orchestrator)
                .await
                .with_context(|| format!("Failed to serve on {}", bind))?;
        }
    }

    Ok(())
}
