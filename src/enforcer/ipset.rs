//! The named `hash:ip` set holding the blocklist.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tracing::debug;

use super::exec_cmd_with_executor;
use crate::cmd_abstraction::CommandExecutor;
use crate::error::BlockerError;

/// Set type used for the blocklist. Single addresses only, no CIDR.
const SET_TYPE: &str = "hash:ip";

/// Wrapper around the `ipset` binary for one named set.
///
/// Holds no state of its own; the kernel set is the source of truth.
pub struct IpSet {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    name: String,
}

impl IpSet {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: &str, name: &str) -> Self {
        Self {
            executor,
            program: program.to_string(),
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn exec(&self, args: &[&str]) -> Result<String, BlockerError> {
        exec_cmd_with_executor(self.executor.as_ref(), &self.program, args)
    }

    /// Create the set, succeeding if it already exists.
    pub fn create(&self) -> Result<(), BlockerError> {
        self.exec(&["-quiet", "-exist", "create", &self.name, SET_TYPE])
            .map(drop)
    }

    /// Remove every member, keeping the set itself.
    pub fn flush(&self) -> Result<(), BlockerError> {
        self.exec(&["-quiet", "flush", &self.name]).map(drop)
    }

    /// Add a single address.
    pub fn add(&self, address: &str) -> Result<(), BlockerError> {
        self.exec(&["-quiet", "add", &self.name, address]).map(drop)
    }

    /// Add each address with its own `ipset add` call.
    ///
    /// Every address is attempted. Rejected entries (already present,
    /// unparsable) are logged at debug level and counted, never returned as
    /// an error. Returns the number of rejected entries.
    pub fn populate(&self, addresses: &[String]) -> usize {
        let mut rejected = 0;
        for address in addresses {
            if let Err(e) = self.add(address) {
                debug!("ipset add {} skipped: {}", address, e);
                rejected += 1;
            }
        }
        rejected
    }

    /// Dump every set with `ipset save` and write it to `path`, replacing
    /// its previous content.
    ///
    /// The dump is written to a temporary file next to `path` and renamed
    /// over it, so a reader never sees a half-written file.
    pub fn persist(&self, path: &Path) -> Result<(), BlockerError> {
        let dump = self.exec(&["save"])?;

        let persist_err = |reason: String| BlockerError::Persist {
            path: path.to_path_buf(),
            reason,
        };

        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut temp_file = NamedTempFile::new_in(parent).map_err(|e| persist_err(e.to_string()))?;
        temp_file
            .write_all(dump.as_bytes())
            .map_err(|e| persist_err(e.to_string()))?;
        temp_file
            .as_file()
            .sync_all()
            .map_err(|e| persist_err(e.to_string()))?;
        temp_file
            .persist(path)
            .map_err(|e| persist_err(e.error.to_string()))?;

        debug!("Saved {} bytes of ipset state to {:?}", dump.len(), path);
        Ok(())
    }
}
