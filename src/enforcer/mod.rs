//! Kernel-side enforcement: the named ipset and the iptables rule matching it.

mod ipset;
mod iptables;

#[cfg(test)]
pub mod mock;

pub use ipset::IpSet;
pub use iptables::Iptables;

use tracing::debug;

use crate::cmd_abstraction::{args_to_strings, CommandExecutor};
use crate::error::BlockerError;

/// Run a command through `executor` and return its stdout, mapping a
/// non-zero exit to [`BlockerError::CommandFailed`].
pub(crate) fn exec_cmd_with_executor(
    executor: &dyn CommandExecutor,
    program: &str,
    args: &[&str],
) -> Result<String, BlockerError> {
    debug!("$ {} {}", program, args.join(" "));

    let output = executor
        .execute(program, &args_to_strings(args))
        .map_err(|e| BlockerError::Spawn {
            program: program.to_string(),
            reason: e.to_string(),
        })?;

    if output.success {
        Ok(output.stdout)
    } else {
        Err(BlockerError::CommandFailed {
            program: program.to_string(),
            args: args.join(" "),
            code: output
                .code
                .map_or_else(|| "signal".to_string(), |c| c.to_string()),
            stderr: output.stderr.trim().to_string(),
        })
    }
}

/// Check if running as root (effective UID == 0)
///
/// Creating sets and editing the filter table needs CAP_NET_ADMIN; UID 0 is
/// the common way to have it.
pub fn check_root() -> Result<(), BlockerError> {
    // SAFETY: geteuid() has no preconditions, never fails and touches no state.
    let euid = unsafe { libc::geteuid() };

    if euid != 0 {
        return Err(BlockerError::Permission(format!(
            "effective uid {} is not root",
            euid
        )));
    }
    Ok(())
}
