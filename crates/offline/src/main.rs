use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};

use presupro_offline::{
    Connectivity, HttpRemote, OperationQueue, QueuedOperation, SqliteStore, SyncEngine,
};

#[derive(Parser)]
#[command(name = "presupro-sync")]
#[command(about = "Inspect and replay the offline operation queue")]
struct Cli {
    /// Path to the local database (defaults to the OS data directory).
    #[arg(long)]
    db: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List pending operations, oldest first.
    Pending,
    /// List operations retired to the dead-letter list.
    DeadLetter,
    /// Replay pending operations against the hosted backend.
    Replay {
        /// Backend base URL; falls back to PRESUPRO_API_URL.
        #[arg(long)]
        api_url: Option<String>,
        /// API key; falls back to PRESUPRO_API_KEY.
        #[arg(long)]
        api_key: Option<String>,
        /// Bearer token; falls back to PRESUPRO_TOKEN.
        #[arg(long)]
        token: Option<String>,
    },
    /// Drop all pending operations.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    presupro_observability::init();

    let cli = Cli::parse();

    let store = match cli.db {
        Some(path) => SqliteStore::with_path(path),
        None => SqliteStore::new(),
    };
    let queue = Arc::new(OperationQueue::new(Arc::new(store)));

    match cli.command {
        Commands::Pending => {
            let pending = queue.list_pending().await;
            print_operations(&pending);
            println!("{} pending operation(s)", pending.len());
        }
        Commands::DeadLetter => {
            let letters = queue.dead_letters().await;
            print_operations(&letters);
            println!("{} dead-lettered operation(s)", letters.len());
        }
        Commands::Replay {
            api_url,
            api_key,
            token,
        } => {
            let api_url = api_url
                .or_else(|| std::env::var("PRESUPRO_API_URL").ok())
                .context("backend URL required: pass --api-url or set PRESUPRO_API_URL")?;
            let api_key = api_key
                .or_else(|| std::env::var("PRESUPRO_API_KEY").ok())
                .context("API key required: pass --api-key or set PRESUPRO_API_KEY")?;
            let token = token.or_else(|| std::env::var("PRESUPRO_TOKEN").ok());

            let remote = match token {
                Some(token) => HttpRemote::with_token(api_url, api_key, token),
                None => HttpRemote::new(api_url, api_key),
            };

            let engine = SyncEngine::new(queue, Arc::new(Connectivity::new()));
            let report = engine.replay_all(&remote).await?;
            println!(
                "succeeded: {}, failed: {}, dead_lettered: {}",
                report.succeeded, report.failed, report.dead_lettered
            );
        }
        Commands::Clear => {
            queue.clear().await;
            println!("queue cleared");
        }
    }

    Ok(())
}

fn print_operations(ops: &[QueuedOperation]) {
    for op in ops {
        println!(
            "{}  {:6}  {:12}  attempts={}  {}",
            op.id,
            op.kind.as_str(),
            op.target,
            op.attempts,
            op.enqueued_at.to_rfc3339()
        );
    }
}
