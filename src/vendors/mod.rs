// src/vendors/mod.rs
//! Third-party HTTP vendors: the search engine, the two contact-data
//! enrichment APIs, and a plain page fetcher for LinkedIn company pages.

pub mod contactout;
pub mod page_fetcher;
pub mod rocketreach;
pub mod serp;

pub use contactout::ContactOutClient;
pub use page_fetcher::HttpPageFetcher;
pub use rocketreach::RocketReachClient;
pub use serp::SerpClient;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::core::config_manager::VendorConfig;
use crate::leads::{Profile, SearchResult};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentProvider {
    #[default]
    ContactOut,
    RocketReach,
}

impl EnrichmentProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentProvider::ContactOut => "contactout",
            EnrichmentProvider::RocketReach => "rocketreach",
        }
    }
}

impl std::fmt::Display for EnrichmentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EnrichmentProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "contactout" => Ok(EnrichmentProvider::ContactOut),
            "rocketreach" => Ok(EnrichmentProvider::RocketReach),
            other => anyhow::bail!(
                "Unknown enrichment provider: {}. Use contactout or rocketreach",
                other
            ),
        }
    }
}

/// Text query in, organic results out.
#[rocket::async_trait]
pub trait SearchVendor: Send + Sync {
    async fn search(&self, query: &str, num_results: u32) -> Result<Vec<SearchResult>>;
}

/// LinkedIn profile URL in, vendor-neutral profile out.
///
/// `Ok(None)` means the vendor answered but had nothing usable (no match,
/// demo data); `Err` is a transport or decoding failure.
#[rocket::async_trait]
pub trait ProfileEnricher: Send + Sync {
    fn provider(&self) -> EnrichmentProvider;

    async fn enrich(&self, linkedin_url: &str) -> Result<Option<Profile>>;
}

#[rocket::async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// The vendor clients available to the job processor. A vendor whose key
/// is not configured is absent.
#[derive(Clone, Default)]
pub struct Vendors {
    pub search: Option<Arc<dyn SearchVendor>>,
    pub contactout: Option<Arc<dyn ProfileEnricher>>,
    pub rocketreach: Option<Arc<dyn ProfileEnricher>>,
    pub pages: Option<Arc<dyn PageFetcher>>,
}

impl Vendors {
    pub fn from_config(config: &VendorConfig) -> Result<Self> {
        let client = build_http_client(config.timeout_seconds)?;

        let search = config.serpapi_key.as_ref().map(|key| {
            Arc::new(SerpClient::new(
                client.clone(),
                key.clone(),
                config.serpapi_url.clone(),
            )) as Arc<dyn SearchVendor>
        });
        if search.is_none() {
            warn!("SERPAPI_KEY not configured; searches will fail until it is set");
        }

        let contactout = config.contactout_api_key.as_ref().map(|key| {
            Arc::new(ContactOutClient::new(
                client.clone(),
                key.clone(),
                config.contactout_url.clone(),
            )) as Arc<dyn ProfileEnricher>
        });
        if contactout.is_none() {
            warn!("CONTACTOUT_API_KEY not configured");
        }

        let rocketreach = config.rocketreach_api_key.as_ref().map(|key| {
            Arc::new(RocketReachClient::new(
                client.clone(),
                key.clone(),
                config.rocketreach_url.clone(),
            )) as Arc<dyn ProfileEnricher>
        });
        if rocketreach.is_none() {
            warn!("ROCKETREACH_API_KEY not configured");
        }

        let pages = Arc::new(HttpPageFetcher::new(config.timeout_seconds)?) as Arc<dyn PageFetcher>;

        Ok(Self {
            search,
            contactout,
            rocketreach,
            pages: Some(pages),
        })
    }

    pub fn enricher(&self, provider: EnrichmentProvider) -> Option<&Arc<dyn ProfileEnricher>> {
        match provider {
            EnrichmentProvider::ContactOut => self.contactout.as_ref(),
            EnrichmentProvider::RocketReach => self.rocketreach.as_ref(),
        }
    }
}

pub fn build_http_client(timeout_seconds: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_seconds))
        .build()
        .context("Failed to create HTTP client")
}

/// One-shot HTTP listener that records the request a vendor client sends.
#[cfg(test)]
pub(crate) mod test_server {
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    #[derive(Debug)]
    pub struct RecordedRequest {
        pub method: String,
        pub target: String,
        pub headers: HashMap<String, String>,
        pub body: String,
    }

    impl RecordedRequest {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers.get(&name.to_lowercase()).map(String::as_str)
        }

        pub fn query(&self) -> HashMap<String, String> {
            reqwest::Url::parse(&format!("http://localhost{}", self.target))
                .unwrap()
                .query_pairs()
                .into_owned()
                .collect()
        }
    }

    /// Accept a single connection, answer with `response_body`, hand back what was received.
    pub async fn respond_once(
        content_type: &'static str,
        response_body: &'static str,
    ) -> (String, JoinHandle<RecordedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/endpoint", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut raw = Vec::new();
            let mut buf = [0u8; 4096];
            let header_end = loop {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before headers ended");
                raw.extend_from_slice(&buf[..n]);
                if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
            let mut lines = head.split("\r\n");
            let mut request_line = lines.next().unwrap().split(' ');
            let method = request_line.next().unwrap().to_string();
            let target = request_line.next().unwrap().to_string();
            let headers: HashMap<String, String> = lines
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| (k.trim().to_lowercase(), v.trim().to_string()))
                .collect();

            let length = headers
                .get("content-length")
                .and_then(|v| v.parse::<usize>().ok())
                .unwrap_or(0);
            while raw.len() < header_end + length {
                let n = stream.read(&mut buf).await.unwrap();
                assert!(n > 0, "connection closed before body ended");
                raw.extend_from_slice(&buf[..n]);
            }
            let body = String::from_utf8_lossy(&raw[header_end..header_end + length]).to_string();

            let reply = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                content_type,
                response_body.len(),
                response_body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.ok();

            RecordedRequest {
                method,
                target,
                headers,
                body,
            }
        });

        (url, handle)
    }
}
