// src/search/company_scraper.rs
use chrono::{DateTime, Utc};
use regex::Regex;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::leads::SearchResult;
use crate::utils::{collapse_whitespace, non_empty, truncate_chars};

pub const NOT_FOUND: &str = "Not found";
pub const MAX_DESCRIPTION_CHARS: usize = 300;
const LINKEDIN_SUFFIX: &str = "| LinkedIn";

static INDUSTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""industry":"([^"]+)""#).expect("valid industry pattern"));
static EMPLOYEES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([\d,]+(?:-[\d,]+)?)\s*employees").expect("valid employees pattern")
});
static LOCALITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""addressLocality":"([^"]+)""#).expect("valid locality pattern")
});
static URL_FIELD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""url":"(https?://[^"]+)""#).expect("valid url pattern"));

/// Company facts scraped from a LinkedIn company page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Company {
    pub job_id: String,
    pub user_id: Option<String>,
    pub company_name: String,
    pub linkedin_url: Option<String>,
    pub linkedin_id: Option<String>,
    pub industry: Option<String>,
    pub employee_count: Option<String>,
    pub headquarters: Option<String>,
    pub website: Option<String>,
    pub description: Option<String>,
    pub search_query: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CompanyRecord {
    pub id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub company: Company,
    pub scraped_at: DateTime<Utc>,
}

/// Where a scraped company came from
#[derive(Debug, Clone, Default)]
pub struct CompanySource<'a> {
    pub job_id: &'a str,
    pub user_id: Option<&'a str>,
    pub search_query: &'a str,
}

/// `acme-corp` from `https://www.linkedin.com/company/acme-corp/about`
pub fn linkedin_company_id(url: &str) -> Option<String> {
    let (_, rest) = url.split_once("/company/")?;
    let id = rest.split(['/', '?', '#']).next()?;
    non_empty(Some(id)).map(str::to_string)
}

/// Build a company from its page HTML, falling back to the search result
/// for the name and description.
pub fn extract_company(html: &str, result: &SearchResult, source: &CompanySource<'_>) -> Company {
    let document = Html::parse_document(html);

    let page_title = select_text(&document, "title")
        .map(|title| title.replace(LINKEDIN_SUFFIX, ""))
        .and_then(|title| non_empty(Some(&title)).map(str::to_string));
    let company_name = page_title
        .or_else(|| non_empty(result.title.as_deref()).map(str::to_string))
        .unwrap_or_else(|| NOT_FOUND.to_string());

    let description = select_attr(&document, r#"meta[name="description"]"#, "content")
        .or_else(|| non_empty(result.snippet.as_deref()).map(str::to_string))
        .map(|text| truncate_chars(&text, MAX_DESCRIPTION_CHARS));

    let link = result.link();

    Company {
        job_id: source.job_id.to_string(),
        user_id: source.user_id.map(str::to_string),
        company_name,
        linkedin_url: link.map(str::to_string),
        linkedin_id: Some(
            link.and_then(linkedin_company_id)
                .unwrap_or_else(|| "unknown".to_string()),
        ),
        industry: Some(first_capture(&INDUSTRY, html)),
        employee_count: Some(first_capture(&EMPLOYEES, html)),
        headquarters: Some(first_capture(&LOCALITY, html)),
        website: Some(external_website(html)),
        description,
        search_query: Some(source.search_query.to_string()),
    }
}

fn first_capture(pattern: &Regex, html: &str) -> String {
    pattern
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn external_website(html: &str) -> String {
    URL_FIELD
        .captures_iter(html)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str())
        .find(|url| {
            let host = url.split_once("://").map_or(*url, |(_, rest)| rest);
            !host.starts_with("www.linkedin")
        })
        .map(str::to_string)
        .unwrap_or_else(|| NOT_FOUND.to_string())
}

fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    let element = document.select(&selector).next()?;
    let text = collapse_whitespace(&element.text().collect::<String>());
    (!text.is_empty()).then_some(text)
}

fn select_attr(document: &Html, selector: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr(attr))
        .find_map(|value| non_empty(Some(value)).map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>Acme Logistics | LinkedIn</title>
  <meta name="description" content="Acme Logistics moves freight across Europe.">
  <script type="application/ld+json">
    {"@type":"Organization","url":"https://www.linkedin.com/company/acme-logistics",
     "industry":"Transportation","address":{"addressLocality":"Rotterdam"},
     "sameAs":"x","url":"https://acme-logistics.example"}
  </script>
</head>
<body><p>Company size: 51-200 employees</p></body>
</html>"#;

    fn result(link: &str) -> SearchResult {
        SearchResult {
            title: Some("Acme Logistics - Overview".to_string()),
            link: Some(link.to_string()),
            snippet: Some("Freight forwarding".to_string()),
        }
    }

    fn source() -> CompanySource<'static> {
        CompanySource {
            job_id: "job-1",
            user_id: Some("user-1"),
            search_query: "site:linkedin.com/company Acme",
        }
    }

    #[test]
    fn test_extract_full_page() {
        let company = extract_company(
            PAGE,
            &result("https://www.linkedin.com/company/acme-logistics/"),
            &source(),
        );

        assert_eq!(company.company_name, "Acme Logistics");
        assert_eq!(company.linkedin_id.as_deref(), Some("acme-logistics"));
        assert_eq!(company.industry.as_deref(), Some("Transportation"));
        assert_eq!(company.employee_count.as_deref(), Some("51-200"));
        assert_eq!(company.headquarters.as_deref(), Some("Rotterdam"));
        assert_eq!(
            company.website.as_deref(),
            Some("https://acme-logistics.example")
        );
        assert_eq!(
            company.description.as_deref(),
            Some("Acme Logistics moves freight across Europe.")
        );
        assert_eq!(company.user_id.as_deref(), Some("user-1"));
        assert_eq!(
            company.search_query.as_deref(),
            Some("site:linkedin.com/company Acme")
        );
    }

    #[test]
    fn test_bare_page_falls_back_to_search_result() {
        let company = extract_company(
            "<html><head></head><body>nothing here</body></html>",
            &result("https://www.linkedin.com/company/acme"),
            &source(),
        );

        assert_eq!(company.company_name, "Acme Logistics - Overview");
        assert_eq!(company.description.as_deref(), Some("Freight forwarding"));
        assert_eq!(company.industry.as_deref(), Some(NOT_FOUND));
        assert_eq!(company.employee_count.as_deref(), Some(NOT_FOUND));
        assert_eq!(company.headquarters.as_deref(), Some(NOT_FOUND));
        assert_eq!(company.website.as_deref(), Some(NOT_FOUND));
    }

    #[test]
    fn test_description_is_capped() {
        let long = "x".repeat(500);
        let html = format!(r#"<html><head><meta name="description" content="{}"></head></html>"#, long);
        let company = extract_company(&html, &result("https://www.linkedin.com/company/a"), &source());
        assert_eq!(
            company.description.map(|d| d.chars().count()),
            Some(MAX_DESCRIPTION_CHARS)
        );
    }

    #[test]
    fn test_linkedin_company_id() {
        assert_eq!(
            linkedin_company_id("https://www.linkedin.com/company/acme-corp/about?trk=x").as_deref(),
            Some("acme-corp")
        );
        assert_eq!(
            linkedin_company_id("https://www.linkedin.com/company/acme?trk=x").as_deref(),
            Some("acme")
        );
        assert_eq!(linkedin_company_id("https://www.linkedin.com/in/jane"), None);
        assert_eq!(linkedin_company_id("https://www.linkedin.com/company/"), None);
    }
}
