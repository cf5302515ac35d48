//! In-memory stand-in for `ipset` and `iptables`, for tests.

use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Mutex;

use anyhow::Result;

use crate::cmd_abstraction::{CommandExecutor, CommandOutput};

/// A rule as `iptables -I <chain> -m set --match-set <set> src -j DROP` creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetRule {
    pub chain: String,
    pub set: String,
}

/// Simulates the kernel state behind `ipset` and `iptables` and records
/// every command line it receives.
#[derive(Default)]
pub struct FakeNetfilter {
    pub sets: Mutex<BTreeMap<String, Vec<String>>>,
    pub rules: Mutex<Vec<SetRule>>,
    pub calls: Mutex<Vec<String>>,
    /// Command lines starting with any of these prefixes fail with exit code 1.
    pub fail_on: Mutex<Vec<String>>,
}

impl FakeNetfilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(prefixes: &[&str]) -> Self {
        let fake = Self::default();
        fake.fail_on
            .lock()
            .unwrap()
            .extend(prefixes.iter().map(|p| p.to_string()));
        fake
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn members(&self, set: &str) -> Option<Vec<String>> {
        self.sets.lock().unwrap().get(set).cloned()
    }

    pub fn rules(&self) -> Vec<SetRule> {
        self.rules.lock().unwrap().clone()
    }

    fn ipset(&self, args: &[String]) -> CommandOutput {
        let args: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .filter(|a| *a != "-quiet")
            .collect();
        let mut sets = self.sets.lock().unwrap();

        match args.as_slice() {
            ["-exist", "create", name, "hash:ip"] => {
                sets.entry(name.to_string()).or_default();
                CommandOutput::ok("")
            }
            ["create", name, "hash:ip"] => {
                if sets.contains_key(*name) {
                    return CommandOutput::failed(1, "set with the same name already exists");
                }
                sets.insert(name.to_string(), Vec::new());
                CommandOutput::ok("")
            }
            ["flush", name] => match sets.get_mut(*name) {
                Some(members) => {
                    members.clear();
                    CommandOutput::ok("")
                }
                None => CommandOutput::failed(1, "The set with the given name does not exist"),
            },
            ["add", name, entry] => {
                let Some(members) = sets.get_mut(*name) else {
                    return CommandOutput::failed(1, "The set with the given name does not exist");
                };
                if entry.parse::<IpAddr>().is_err() {
                    return CommandOutput::failed(1, "Syntax error: cannot parse address");
                }
                if members.iter().any(|m| m == entry) {
                    return CommandOutput::failed(1, "Element cannot be added to the set: it's already added");
                }
                members.push(entry.to_string());
                CommandOutput::ok("")
            }
            ["save"] => {
                let mut out = String::new();
                for (name, members) in sets.iter() {
                    out.push_str(&format!(
                        "create {} hash:ip family inet hashsize 1024 maxelem 65536\n",
                        name
                    ));
                    for m in members {
                        out.push_str(&format!("add {} {}\n", name, m));
                    }
                }
                CommandOutput::ok(out)
            }
            _ => CommandOutput::failed(1, "unsupported ipset invocation"),
        }
    }

    fn iptables(&self, args: &[String]) -> CommandOutput {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        let mut rules = self.rules.lock().unwrap();

        match args.as_slice() {
            [op, chain, "-m", "set", "--match-set", set, "src", "-j", "DROP"] => {
                let rule = SetRule {
                    chain: chain.to_string(),
                    set: set.to_string(),
                };
                match *op {
                    "-I" => {
                        rules.insert(0, rule);
                        CommandOutput::ok("")
                    }
                    "-D" => match rules.iter().position(|r| *r == rule) {
                        Some(idx) => {
                            rules.remove(idx);
                            CommandOutput::ok("")
                        }
                        None => CommandOutput::failed(
                            1,
                            "iptables: Bad rule (does a matching rule exist in that chain?).",
                        ),
                    },
                    _ => CommandOutput::failed(2, "unsupported iptables operation"),
                }
            }
            _ => CommandOutput::failed(2, "unsupported iptables invocation"),
        }
    }
}

impl CommandExecutor for FakeNetfilter {
    fn execute(&self, program: &str, args: &[String]) -> Result<CommandOutput> {
        let line = format!("{} {}", program, args.join(" "));
        self.calls.lock().unwrap().push(line.clone());

        if self
            .fail_on
            .lock()
            .unwrap()
            .iter()
            .any(|p| line.starts_with(p.as_str()))
        {
            return Ok(CommandOutput::failed(1, "injected failure"));
        }

        match program {
            "ipset" => Ok(self.ipset(args)),
            "iptables" => Ok(self.iptables(args)),
            other => anyhow::bail!("{}: command not found", other),
        }
    }
}
