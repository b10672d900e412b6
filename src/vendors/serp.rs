// src/vendors/serp.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info};

use super::SearchVendor;
use crate::leads::SearchResult;
use crate::utils::null_as_default;

pub struct SerpClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SerpResponse {
    #[serde(default, deserialize_with = "null_as_default")]
    organic_results: Vec<SearchResult>,
    #[serde(default)]
    error: Option<String>,
}

impl SerpClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

/// Interpret a SerpAPI response body. A vendor-reported `error` is fatal.
fn parse_response(body: &str) -> Result<Vec<SearchResult>> {
    let response: SerpResponse =
        serde_json::from_str(body).context("Failed to parse SerpAPI response")?;

    if let Some(message) = response.error {
        anyhow::bail!("SerpAPI Error: {}", message);
    }

    Ok(response.organic_results)
}

#[rocket::async_trait]
impl SearchVendor for SerpClient {
    async fn search(&self, query: &str, num_results: u32) -> Result<Vec<SearchResult>> {
        info!("SerpAPI search query: {}", query);

        let num = num_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("engine", "google"),
                ("q", query),
                ("api_key", self.api_key.as_str()),
                ("num", num.as_str()),
            ])
            .send()
            .await
            .context("Failed to send request to SerpAPI")?;

        let status = response.status();
        let body = response
            .text()
            .await
            .context("Failed to read SerpAPI response body")?;

        let results = match parse_response(&body) {
            Ok(results) => results,
            Err(e) => {
                error!("SerpAPI request failed with {}: {}", status, e);
                return Err(e);
            }
        };

        info!("SerpAPI found {} results", results.len());
        Ok(results)
    }
}
