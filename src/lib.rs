//! # ipsum-blocker
//!
//! Drops inbound traffic from addresses on the
//! [ipsum](https://github.com/stamparm/ipsum) blocklist.
//!
//! A run is a fixed sequence:
//!
//! ```text
//! fetch list ──► ipset create / flush / add ... [/ save] ──► iptables -D, iptables -I
//! ```
//!
//! ## Modules
//!
//! - [`blocker`] - The run sequence and its progress reporting
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - External command execution, mockable in tests
//! - [`config`] - Optional YAML configuration
//! - [`enforcer`] - `ipset` and `iptables` wrappers, privilege check
//! - [`error`] - Error types for the enforcer layer
//! - [`fetcher`] - HTTP download and parsing of the list
//! - [`lock`] - File locking to serialize runs
//! - [`utils`] - Formatting helpers
//!
//! ## Known limitation
//!
//! Two runs at the same time race on the same set and rule. Schedule runs
//! so they cannot overlap, or set `lock_file` in the config.

pub mod blocker;
pub mod cli;
pub mod cmd_abstraction;
pub mod config;
pub mod enforcer;
pub mod error;
pub mod fetcher;
pub mod lock;
pub mod utils;

pub use blocker::{Blocker, RunOptions, RunSummary};
pub use cli::Cli;
pub use config::Config;
pub use error::BlockerError;
