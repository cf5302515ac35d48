//! iptables rule dropping traffic sourced from the blocklist set.

use std::sync::Arc;

use super::exec_cmd_with_executor;
use crate::cmd_abstraction::CommandExecutor;
use crate::error::BlockerError;

/// Wrapper around the `iptables` binary for the single set-matching rule.
pub struct Iptables {
    executor: Arc<dyn CommandExecutor>,
    program: String,
    chain: String,
}

impl Iptables {
    pub fn new(executor: Arc<dyn CommandExecutor>, program: &str, chain: &str) -> Self {
        Self {
            executor,
            program: program.to_string(),
            chain: chain.to_string(),
        }
    }

    pub fn chain(&self) -> &str {
        &self.chain
    }

    /// `<op> <chain> -m set --match-set <set> src -j DROP`
    fn rule_args<'a>(&'a self, op: &'a str, set_name: &'a str) -> [&'a str; 9] {
        [
            op, self.chain.as_str(),
            "-m", "set", "--match-set", set_name, "src",
            "-j", "DROP",
        ]
    }

    /// Delete one rule matching `set_name`. Fails when no such rule exists.
    pub fn remove_rule(&self, set_name: &str) -> Result<(), BlockerError> {
        exec_cmd_with_executor(
            self.executor.as_ref(),
            &self.program,
            &self.rule_args("-D", set_name),
        )
        .map(drop)
    }

    /// Insert the drop rule at the top of the chain.
    pub fn insert_rule(&self, set_name: &str) -> Result<(), BlockerError> {
        exec_cmd_with_executor(
            self.executor.as_ref(),
            &self.program,
            &self.rule_args("-I", set_name),
        )
        .map(drop)
    }
}
