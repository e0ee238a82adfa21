//! Helm CLI - Main entry point

mod cli;

use clap::{Parser, Subcommand};
use helm_agent::{JsonSessionStore, SessionStore};
use helm_foundation::{JsonPermissionStore, PermissionStore, RuntimeConfig};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Helm - headless driver for the agent runtime
#[derive(Parser, Debug)]
#[command(name = "helm")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Prompt to send
    #[arg(short, long)]
    prompt: Option<String>,

    /// JSON file with the scripted model replies
    #[arg(short, long)]
    replies: Option<PathBuf>,

    /// Approve every confirmation without asking
    #[arg(short, long)]
    yes: bool,

    /// Continue (and save to) a specific session
    #[arg(short, long)]
    session: Option<String>,

    /// Working directory for tools
    #[arg(long)]
    cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved sessions
    Sessions,
    /// Show remembered permissions
    Permissions {
        /// Forget all remembered permissions
        #[arg(long)]
        reset: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout은 모델 출력용, 로그는 stderr
    let log_level = if args.debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    if let Some(command) = args.command {
        return match command {
            Command::Sessions => list_sessions_cmd().await,
            Command::Permissions { reset } => permissions_cmd(reset).await,
        };
    }

    let Some(prompt) = args.prompt else {
        anyhow::bail!("Nothing to do: pass --prompt (see --help)");
    };
    let Some(replies) = args.replies else {
        anyhow::bail!("--replies <FILE> is required to drive the model");
    };

    let mut config = RuntimeConfig::load().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to load config: {}", e);
        RuntimeConfig::default()
    });
    if let Some(cwd) = args.cwd {
        config.working_dir = Some(cwd);
    }

    cli::run_once(cli::RunOptions {
        config,
        prompt,
        replies,
        session: args.session,
        auto_approve: args.yes,
    })
    .await
}

/// List saved sessions
async fn list_sessions_cmd() -> anyhow::Result<()> {
    let store = JsonSessionStore::global()?;
    let ids = store.list().await?;

    if ids.is_empty() {
        println!("No sessions found.");
        return Ok(());
    }

    println!("{:<40} {:<10}", "ID", "Messages");
    println!("{}", "-".repeat(50));
    for id in ids {
        let count = store.load(&id).await?.map(|m| m.len()).unwrap_or(0);
        println!("{:<40} {:<10}", id, count);
    }

    println!("\nUse 'helm --session <ID> ...' to continue a session.");
    Ok(())
}

/// Show or reset remembered permissions
async fn permissions_cmd(reset: bool) -> anyhow::Result<()> {
    let store = JsonPermissionStore::global()?;

    if reset {
        store.clear_permissions().await?;
        println!("Remembered permissions cleared.");
        return Ok(());
    }

    let records = store.get_permissions().await?;
    if records.is_empty() {
        println!("No remembered permissions.");
    }
    for record in records {
        println!("{}", record);
    }
    Ok(())
}
