// src/search/request.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::leads::FallbackContext;
use crate::utils::non_empty_owned;
use crate::vendors::EnrichmentProvider;

pub const DEFAULT_TARGET_ROLES: &str = "CEO OR CFO OR Founder OR Owner OR Manager OR Director";

const PROFILE_SITE: &str = "site:linkedin.com/in";
const COMPANY_SITE: &str = "site:linkedin.com/company";
pub const PROFILE_PATH_MARKER: &str = "linkedin.com/in/";
pub const COMPANY_PATH_MARKER: &str = "linkedin.com/company/";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    /// Decision makers at a company / location
    #[default]
    Company,
    /// A specific person by name
    Name,
    /// LinkedIn company pages rather than people
    CompanyPages,
}

/// One user-submitted search; stored verbatim as the job payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(default)]
    pub search_type: SearchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_title: Option<String>,
    #[serde(default)]
    pub enrichment_provider: EnrichmentProvider,
}

impl SearchRequest {
    /// Trim every text field and drop blank ones
    pub fn normalized(self) -> Self {
        Self {
            search_type: self.search_type,
            company_name: non_empty_owned(self.company_name.as_deref()),
            location: non_empty_owned(self.location.as_deref()),
            business_type: non_empty_owned(self.business_type.as_deref()),
            full_name: non_empty_owned(self.full_name.as_deref()),
            job_title: non_empty_owned(self.job_title.as_deref()),
            enrichment_provider: self.enrichment_provider,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self.search_type {
            SearchType::Name => {
                if self.full_name.is_none() {
                    anyhow::bail!("Full name is required for name-based searches");
                }
            }
            SearchType::Company | SearchType::CompanyPages => {
                if self.company_name.is_none()
                    && self.location.is_none()
                    && self.business_type.is_none()
                {
                    anyhow::bail!("Please provide at least one search parameter");
                }
            }
        }
        Ok(())
    }

    /// Search-engine query for this request
    pub fn query(&self) -> String {
        let mut query = String::new();

        match self.search_type {
            SearchType::Company => {
                query.push_str(PROFILE_SITE);
                if let Some(company) = &self.company_name {
                    query.push_str(&format!(" \"{}\"", company));
                }
                let roles = self.business_type.as_deref().unwrap_or(DEFAULT_TARGET_ROLES);
                query.push_str(&format!(" ({})", roles));
                if let Some(location) = &self.location {
                    query.push_str(&format!(" {}", location));
                }
            }
            SearchType::Name => {
                query.push_str(PROFILE_SITE);
                for quoted in [&self.full_name, &self.job_title, &self.company_name]
                    .into_iter()
                    .flatten()
                {
                    query.push_str(&format!(" \"{}\"", quoted));
                }
                if let Some(location) = &self.location {
                    query.push_str(&format!(" {}", location));
                }
            }
            SearchType::CompanyPages => {
                query.push_str(COMPANY_SITE);
                for term in [&self.company_name, &self.business_type].into_iter().flatten() {
                    query.push_str(&format!(" {}", term));
                }
                if let Some(location) = &self.location {
                    query.push_str(&format!(" in {}", location));
                }
            }
        }

        query
    }

    pub fn num_results(&self) -> u32 {
        match self.search_type {
            SearchType::CompanyPages => 5,
            SearchType::Company | SearchType::Name => 10,
        }
    }

    /// Only search results whose link contains this marker are processed
    pub fn link_marker(&self) -> &'static str {
        match self.search_type {
            SearchType::CompanyPages => COMPANY_PATH_MARKER,
            SearchType::Company | SearchType::Name => PROFILE_PATH_MARKER,
        }
    }

    /// Defaults for leads built from this request's results
    pub fn fallback_context(&self, job_id: &str, user_id: Option<&str>) -> FallbackContext {
        let (full_name, job_title) = match self.search_type {
            SearchType::Name => (self.full_name.clone(), self.job_title.clone()),
            SearchType::Company | SearchType::CompanyPages => (None, None),
        };

        FallbackContext {
            job_id: job_id.to_string(),
            user_id: user_id.map(str::to_string),
            linkedin_url: String::new(),
            full_name,
            job_title,
            company_name: self.company_name.clone(),
            location: self.location.clone(),
        }
    }

    /// Short label for job listings
    pub fn label(&self) -> String {
        match self.search_type {
            SearchType::Name => self.full_name.clone(),
            SearchType::Company | SearchType::CompanyPages => self
                .company_name
                .clone()
                .or_else(|| self.business_type.clone())
                .or_else(|| self.location.clone()),
        }
        .unwrap_or_else(|| "Unknown".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn company(company: Option<&str>, location: Option<&str>, roles: Option<&str>) -> SearchRequest {
        SearchRequest {
            search_type: SearchType::Company,
            company_name: company.map(str::to_string),
            location: location.map(str::to_string),
            business_type: roles.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_deserialize_defaults() {
        let request: SearchRequest = serde_json::from_str(r#"{"company_name": "Acme"}"#).unwrap();
        assert_eq!(request.search_type, SearchType::Company);
        assert_eq!(request.enrichment_provider, EnrichmentProvider::ContactOut);

        let request: SearchRequest = serde_json::from_str(
            r#"{"search_type": "name", "full_name": "Jane Doe", "enrichment_provider": "rocketreach"}"#,
        )
        .unwrap();
        assert_eq!(request.search_type, SearchType::Name);
        assert_eq!(request.enrichment_provider, EnrichmentProvider::RocketReach);

        let request: SearchRequest =
            serde_json::from_str(r#"{"search_type": "company_pages", "location": "Oslo"}"#).unwrap();
        assert_eq!(request.search_type, SearchType::CompanyPages);
    }

    #[test]
    fn test_validation() {
        assert!(company(Some("Acme"), None, None).validate().is_ok());
        assert!(company(None, Some("Oslo"), None).validate().is_ok());

        let blank = company(Some("  "), Some(""), None).normalized();
        assert_eq!(
            blank.validate().unwrap_err().to_string(),
            "Please provide at least one search parameter"
        );

        let name = SearchRequest {
            search_type: SearchType::Name,
            company_name: Some("Acme".to_string()),
            ..Default::default()
        };
        assert_eq!(
            name.validate().unwrap_err().to_string(),
            "Full name is required for name-based searches"
        );
    }

    #[test]
    fn test_company_query() {
        assert_eq!(
            company(Some("Acme"), Some("Berlin"), None).query(),
            "site:linkedin.com/in \"Acme\" (CEO OR CFO OR Founder OR Owner OR Manager OR Director) Berlin"
        );
        assert_eq!(
            company(None, None, Some("CTO OR VP Engineering")).query(),
            "site:linkedin.com/in (CTO OR VP Engineering)"
        );
    }

    #[test]
    fn test_name_query() {
        let request = SearchRequest {
            search_type: SearchType::Name,
            full_name: Some("Jane Doe".to_string()),
            company_name: Some("Acme".to_string()),
            location: Some("Paris".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.query(),
            "site:linkedin.com/in \"Jane Doe\" \"Acme\" Paris"
        );
        assert_eq!(request.num_results(), 10);
        assert_eq!(request.link_marker(), PROFILE_PATH_MARKER);
    }

    #[test]
    fn test_company_pages_query() {
        let request = SearchRequest {
            search_type: SearchType::CompanyPages,
            company_name: Some("Acme".to_string()),
            business_type: Some("logistics".to_string()),
            location: Some("Rotterdam".to_string()),
            ..Default::default()
        };
        assert_eq!(
            request.query(),
            "site:linkedin.com/company Acme logistics in Rotterdam"
        );
        assert_eq!(request.num_results(), 5);
        assert_eq!(request.link_marker(), COMPANY_PATH_MARKER);
    }

    #[test]
    fn test_fallback_context_by_search_type() {
        let name = SearchRequest {
            search_type: SearchType::Name,
            full_name: Some("Jane Doe".to_string()),
            job_title: Some("CEO".to_string()),
            ..Default::default()
        };
        let ctx = name.fallback_context("job", Some("user"));
        assert_eq!(ctx.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(ctx.job_title.as_deref(), Some("CEO"));
        assert_eq!(ctx.user_id.as_deref(), Some("user"));

        let ctx = company(Some("Acme"), Some("Oslo"), Some("CTO")).fallback_context("job", None);
        assert_eq!(ctx.full_name, None);
        assert_eq!(ctx.job_title, None);
        assert_eq!(ctx.company_name.as_deref(), Some("Acme"));
        assert_eq!(ctx.location.as_deref(), Some("Oslo"));
    }

    #[test]
    fn test_label() {
        assert_eq!(company(Some("Acme"), None, None).label(), "Acme");
        assert_eq!(company(None, Some("Oslo"), None).label(), "Oslo");
        assert_eq!(SearchRequest::default().label(), "Unknown");
    }
}
