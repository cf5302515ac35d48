//! ipsum-blocker - drop traffic from the ipsum blocklist
//!
//! Downloads the list, loads it into an ipset and points an iptables DROP
//! rule at it.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

use ipsum_blocker::blocker::{Blocker, RunSummary};
use ipsum_blocker::cli::Cli;
use ipsum_blocker::cmd_abstraction::RealCommandExecutor;
use ipsum_blocker::config::{Config, DEFAULT_CONFIG_PATH};
use ipsum_blocker::enforcer::check_root;
use ipsum_blocker::lock::LockGuard;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Plain lines, no timestamp or level prefix
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level())
        .with_target(false)
        .with_level(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set up logging: {}", e);
    }

    if let Err(e) = check_root() {
        error!(":: Permissions error. You must run ipsum-blocker as root.");
        debug!("{}", e);
        return ExitCode::from(1);
    }

    match run(&cli).await {
        Ok(summary) => {
            debug!("{:?}", summary);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(":: {:#}", e);
            ExitCode::from(1)
        }
    }
}

async fn run(cli: &Cli) -> Result<RunSummary> {
    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(DEFAULT_CONFIG_PATH)?,
    };

    let _lock = config
        .lock_file
        .as_deref()
        .map(LockGuard::acquire)
        .transpose()?;

    let blocker = Blocker::from_config(&config, cli.save, Arc::new(RealCommandExecutor::new()))?;
    blocker.run().await
}
