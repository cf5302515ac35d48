//! Error types for ipsum-blocker.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlockerError {
    #[error("Failed to execute {program}: {reason}")]
    Spawn { program: String, reason: String },

    #[error("{program} {args} exited with {code}: {stderr}")]
    CommandFailed {
        program: String,
        args: String,
        code: String,
        stderr: String,
    },

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Failed to write {path:?}: {reason}")]
    Persist { path: PathBuf, reason: String },
}
