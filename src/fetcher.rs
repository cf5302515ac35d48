//! HTTP fetcher for the ipsum blocklist.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Level 3 of ipsum: addresses seen on at least three independent blacklists.
pub const DEFAULT_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/stamparm/ipsum/master/levels/3.txt";

/// Maximum size of the downloaded list (10 MB)
/// The level 3 list is well under 1 MB.
const MAX_LIST_SIZE: usize = 10 * 1024 * 1024;

/// Anything that can produce the list of addresses to block.
#[async_trait]
pub trait AddressSource: Send + Sync {
    async fn fetch_addresses(&self) -> Result<Vec<String>>;
}

/// HTTP client for the blocklist
pub struct Fetcher {
    client: Client,
    url: String,
}

impl Fetcher {
    pub fn new(url: &str) -> Result<Self> {
        let client = Client::builder()
            .user_agent(format!("ipsum-blocker/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Download the raw list body. One request, no retry.
    pub async fn fetch_body(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", self.url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Failed to fetch {}: HTTP {}", self.url, status);
        }

        if let Some(content_length) = response.content_length() {
            if content_length as usize > MAX_LIST_SIZE {
                anyhow::bail!(
                    "Response too large: {} bytes (max: {} bytes)",
                    content_length,
                    MAX_LIST_SIZE
                );
            }
        }

        let bytes = response
            .bytes()
            .await
            .context("Failed to read response body")?;

        if bytes.len() > MAX_LIST_SIZE {
            anyhow::bail!(
                "Downloaded content too large: {} bytes (max: {} bytes)",
                bytes.len(),
                MAX_LIST_SIZE
            );
        }

        let body = String::from_utf8(bytes.to_vec()).context("Blocklist is not valid UTF-8")?;

        debug!("Downloaded {} bytes from {}", body.len(), self.url);
        Ok(body)
    }
}

#[async_trait]
impl AddressSource for Fetcher {
    async fn fetch_addresses(&self) -> Result<Vec<String>> {
        let body = self.fetch_body().await?;
        Ok(parse_address_list(&body))
    }
}

/// Split a list body into one entry per line.
///
/// Line terminators (`\n`, `\r\n`) are stripped and empty lines skipped.
/// Entries are otherwise passed through untouched and in order; rejecting
/// garbage is left to `ipset`.
pub fn parse_address_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}
