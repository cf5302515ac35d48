//! The run itself: fetch the list, load it into the set, (re)install the rule.
//!
//! Steps run strictly in order and each is announced before it starts:
//!
//! ```text
//! FetchList -> CreateSet -> FlushSet -> PopulateSet -> [PersistSet] -> RemoveRule -> InsertRule
//! ```
//!
//! Only a failed fetch or a failed rule insertion aborts the run. Everything
//! else is best effort and only shows up in debug output. Nothing is rolled
//! back: an abort after population leaves a filled set with no rule pointing
//! at it, which blocks nothing.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

use crate::cmd_abstraction::CommandExecutor;
use crate::config::Config;
use crate::enforcer::{IpSet, Iptables};
use crate::fetcher::{AddressSource, Fetcher};
use crate::utils::format_count;

/// Per-run settings that are not part of the kernel objects themselves.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Persist the set after populating it
    pub save: bool,
    pub save_path: PathBuf,
}

/// What a completed run did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Entries in the downloaded list
    pub fetched: usize,
    /// Entries `ipset add` refused
    pub rejected: usize,
    /// Whether a persist step ran and succeeded
    pub saved: bool,
}

pub struct Blocker {
    source: Box<dyn AddressSource>,
    ipset: IpSet,
    iptables: Iptables,
    options: RunOptions,
}

impl Blocker {
    pub fn new(
        source: Box<dyn AddressSource>,
        ipset: IpSet,
        iptables: Iptables,
        options: RunOptions,
    ) -> Self {
        Self {
            source,
            ipset,
            iptables,
            options,
        }
    }

    /// Wire up the real fetcher and the `ipset`/`iptables` wrappers from config.
    pub fn from_config(
        config: &Config,
        save: bool,
        executor: Arc<dyn CommandExecutor>,
    ) -> Result<Self> {
        let fetcher = Fetcher::new(&config.source_url)?;
        let ipset = IpSet::new(executor.clone(), &config.ipset_path, &config.set_name);
        let iptables = Iptables::new(executor, &config.iptables_path, &config.chain);
        let options = RunOptions {
            save: save || config.save,
            save_path: config.save_path.clone(),
        };
        Ok(Self::new(Box::new(fetcher), ipset, iptables, options))
    }

    pub async fn run(&self) -> Result<RunSummary> {
        info!(":: Starting ipsum blocker process");

        info!(":: Fetching new block list");
        let addresses = self.fetch().await?;

        info!(":: Setting up Ipset");
        let (rejected, saved) = self.setup_ipset(&addresses);

        info!(":: Updating Iptables");
        self.setup_iptables()?;

        info!(":: Completed successfully");
        Ok(RunSummary {
            fetched: addresses.len(),
            rejected,
            saved,
        })
    }

    async fn fetch(&self) -> Result<Vec<String>> {
        info!("   (1/1) Downloading ipsum blocklist from Github");
        let addresses = self
            .source
            .fetch_addresses()
            .await
            .context("Failed to download blocklist")?;
        debug!("Blocklist has {} entries", format_count(addresses.len()));
        Ok(addresses)
    }

    /// Returns the number of rejected entries and whether the set was saved.
    fn setup_ipset(&self, addresses: &[String]) -> (usize, bool) {
        let name = self.ipset.name();
        let steps = if self.options.save { 4 } else { 3 };

        info!("   (1/{}) Creating ipset \"{}\"", steps, name);
        if let Err(e) = self.ipset.create() {
            debug!("Ignoring failed ipset create: {}", e);
        }

        info!("   (2/{}) Flushing old values", steps);
        if let Err(e) = self.ipset.flush() {
            debug!("Ignoring failed ipset flush: {}", e);
        }

        info!("   (3/{}) Adding new IPs to the set", steps);
        let rejected = self.ipset.populate(addresses);
        if rejected > 0 {
            debug!(
                "{} of {} entries were not added",
                format_count(rejected),
                format_count(addresses.len())
            );
        }

        let mut saved = false;
        if self.options.save {
            info!(
                "   (4/4) Saving ipset to {}",
                self.options.save_path.display()
            );
            match self.ipset.persist(&self.options.save_path) {
                Ok(()) => saved = true,
                Err(e) => debug!("Ignoring failed ipset save: {}", e),
            }
        }

        (rejected, saved)
    }

    fn setup_iptables(&self) -> Result<()> {
        let name = self.ipset.name();

        info!(
            "   (1/2) Dropping existing Iptable rules for ipset \"{}\"",
            name
        );
        if let Err(e) = self.iptables.remove_rule(name) {
            debug!("No existing rule removed: {}", e);
        }

        info!("   (2/2) Recreating Iptable rules for ipset \"{}\"", name);
        self.iptables.insert_rule(name).with_context(|| {
            format!(
                "Failed to insert {} rule for ipset \"{}\"",
                self.iptables.chain(),
                name
            )
        })?;

        Ok(())
    }
}
