//! CLI argument parsing with clap.

use clap::Parser;
use std::path::PathBuf;
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "ipsum-blocker")]
#[command(version, about = "Block the ipsum IP blocklist with ipset and iptables")]
pub struct Cli {
    /// Do not display any output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Save the ipset to disk (default /etc/ipset.conf) after populating it
    #[arg(short, long)]
    pub save: bool,

    /// Verbose mode (debug output, including every command issued)
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path [default: /etc/ipsum-blocker/config.yaml, if present]
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Maximum log level for this invocation. Errors are never filtered.
    pub fn log_level(&self) -> Level {
        if self.verbose {
            Level::DEBUG
        } else if self.quiet {
            Level::ERROR
        } else {
            Level::INFO
        }
    }
}
