// src/leads/types.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::null_as_default;

/// Vendor-neutral profile. Every vendor response and the search-title
/// fallback are reduced to this shape before normalization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, alias = "current_title")]
    pub title: Option<String>,
    #[serde(default)]
    pub company: Option<ProfileCompany>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub contact_info: Option<ContactInfo>,
}

impl Profile {
    pub fn company_name(&self) -> Option<&str> {
        self.company.as_ref().and_then(|c| c.name.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileCompany {
    #[serde(default)]
    pub name: Option<String>,
}

impl ProfileCompany {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub work_emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub personal_emails: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub phones: Vec<String>,
}

/// Defaults used when a profile is missing a field, plus the identity of
/// the lead being built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FallbackContext {
    pub job_id: String,
    pub user_id: Option<String>,
    pub linkedin_url: String,
    /// Searched name, used only by the title fallback.
    pub full_name: Option<String>,
    /// Searched role, used only by the title fallback.
    pub job_title: Option<String>,
    pub company_name: Option<String>,
    pub location: Option<String>,
}

impl FallbackContext {
    pub fn for_job(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            ..Self::default()
        }
    }

    pub fn with_user(mut self, user_id: Option<String>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn with_linkedin_url(&self, linkedin_url: &str) -> Self {
        Self {
            linkedin_url: linkedin_url.to_string(),
            ..self.clone()
        }
    }
}

/// A normalized lead ready to be stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Lead {
    pub job_id: String,
    pub user_id: Option<String>,
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub job_title: String,
    pub company_name: String,
    pub location: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: String,
}

/// A lead as read back from the store.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct LeadRecord {
    pub id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub lead: Lead,
    pub created_at: DateTime<Utc>,
}

/// One organic result returned by the search vendor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub snippet: Option<String>,
}

impl SearchResult {
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn links_to(&self, path_marker: &str) -> bool {
        self.link().is_some_and(|link| link.contains(path_marker))
    }
}
