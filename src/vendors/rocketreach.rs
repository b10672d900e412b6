// src/vendors/rocketreach.rs
use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{EnrichmentProvider, ProfileEnricher};
use crate::leads::{ContactInfo, Profile, ProfileCompany};
use crate::utils::{non_empty_owned, null_as_default};

pub struct RocketReachClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct LookupRequest<'a> {
    linkedin_url: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    current_title: Option<String>,
    #[serde(default)]
    current_employer: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    emails: Vec<RocketReachEmail>,
    #[serde(default, deserialize_with = "null_as_default")]
    phones: Vec<RocketReachPhone>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    detail: Option<String>,
}

/// Emails come back either as bare strings or as `{email, type}` objects.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RocketReachEmail {
    Plain(String),
    Detailed {
        #[serde(default)]
        email: Option<String>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl RocketReachEmail {
    fn address(&self) -> Option<String> {
        match self {
            RocketReachEmail::Plain(address) => non_empty_owned(Some(address)),
            RocketReachEmail::Detailed { email, .. } => non_empty_owned(email.as_deref()),
        }
    }

    fn kind(&self) -> Option<&str> {
        match self {
            RocketReachEmail::Plain(_) => None,
            RocketReachEmail::Detailed { kind, .. } => kind.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RocketReachPhone {
    Plain(String),
    Detailed {
        #[serde(default)]
        number: Option<String>,
    },
}

impl RocketReachPhone {
    fn number(&self) -> Option<String> {
        match self {
            RocketReachPhone::Plain(number) => non_empty_owned(Some(number)),
            RocketReachPhone::Detailed { number } => non_empty_owned(number.as_deref()),
        }
    }
}

impl LookupResponse {
    /// Map onto the common profile shape; `None` unless the lookup found a person.
    fn into_profile(self) -> Option<Profile> {
        let full_name = non_empty_owned(self.name.as_deref())?;

        let addresses_of = |kind: &str| -> Vec<String> {
            self.emails
                .iter()
                .filter(|e| e.kind() == Some(kind))
                .filter_map(RocketReachEmail::address)
                .collect()
        };

        let contact_info = ContactInfo {
            emails: self.emails.iter().filter_map(RocketReachEmail::address).collect(),
            work_emails: addresses_of("professional"),
            personal_emails: addresses_of("personal"),
            phones: self.phones.iter().filter_map(RocketReachPhone::number).collect(),
        };

        Some(Profile {
            full_name: Some(full_name),
            title: non_empty_owned(self.current_title.as_deref()),
            company: non_empty_owned(self.current_employer.as_deref()).map(ProfileCompany::named),
            location: non_empty_owned(self.location.as_deref()),
            contact_info: Some(contact_info),
        })
    }
}

impl RocketReachClient {
    pub fn new(client: Client, api_key: String, base_url: String) -> Self {
        Self {
            client,
            api_key,
            base_url,
        }
    }
}

#[rocket::async_trait]
impl ProfileEnricher for RocketReachClient {
    fn provider(&self) -> EnrichmentProvider {
        EnrichmentProvider::RocketReach
    }

    async fn enrich(&self, linkedin_url: &str) -> Result<Option<Profile>> {
        info!("RocketReach enriching: {}", linkedin_url);

        let response = self
            .client
            .post(&self.base_url)
            .header("Api-Key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&LookupRequest { linkedin_url })
            .send()
            .await
            .context("Failed to send request to RocketReach")?;

        let body: LookupResponse = response
            .json()
            .await
            .context("Failed to parse RocketReach response")?;

        let failure = body.error.clone().or_else(|| body.detail.clone());
        match body.into_profile() {
            Some(profile) => {
                info!(
                    "RocketReach enriched: {}",
                    profile.full_name.as_deref().unwrap_or_default()
                );
                Ok(Some(profile))
            }
            None => {
                warn!(
                    "RocketReach failed: {}",
                    failure.unwrap_or_else(|| "No data returned".to_string())
                );
                Ok(None)
            }
        }
    }
}
