// src/vendors/contactout.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use tracing::{info, warn};

use super::{EnrichmentProvider, ProfileEnricher};
use crate::leads::Profile;

const DEMO_MESSAGE_MARKER: &str = "sample response";
const DEMO_PROFILE_NAME: &str = "Example Person";

pub struct ContactOutClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct ContactOutResponse {
    #[serde(default)]
    status_code: Option<i64>,
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ContactOutResponse {
    /// Unauthorised or trial keys get canned sample data instead of an error.
    fn is_demo(&self) -> bool {
        let sample_message = self
            .message
            .as_deref()
            .is_some_and(|m| m.contains(DEMO_MESSAGE_MARKER));
        let sample_profile = self
            .profile
            .as_ref()
            .and_then(|p| p.full_name.as_deref())
            .is_some_and(|name| name == DEMO_PROFILE_NAME);
        sample_message || sample_profile
    }
}

impl ContactOutClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

fn interpret(response: ContactOutResponse) -> Option<Profile> {
    if response.is_demo() {
        warn!("ContactOut returned demo data");
        return None;
    }

    match (response.status_code, response.profile) {
        (Some(200), Some(profile)) => {
            info!(
                "ContactOut enriched: {}",
                profile.full_name.as_deref().unwrap_or("<unnamed>")
            );
            Some(profile)
        }
        _ => {
            warn!(
                "ContactOut failed: {}",
                response
                    .message
                    .or(response.error)
                    .unwrap_or_else(|| "no profile returned".to_string())
            );
            None
        }
    }
}

#[rocket::async_trait]
impl ProfileEnricher for ContactOutClient {
    fn provider(&self) -> EnrichmentProvider {
        EnrichmentProvider::ContactOut
    }

    async fn enrich(&self, linkedin_url: &str) -> Result<Option<Profile>> {
        info!("ContactOut enriching: {}", linkedin_url);

        let response = self
            .client
            .get(&self.base_url)
            .query(&[("profile", linkedin_url)])
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("token", &self.api_key)
            .send()
            .await
            .context("Failed to send request to ContactOut")?;

        let body: ContactOutResponse = response
            .json()
            .await
            .context("Failed to parse ContactOut response")?;

        Ok(interpret(body))
    }
}
