// src/leads/title_parser.rs
//! Fallback profile built from a search-result title when no enrichment
//! vendor returns data. Titles look like `"Name - Title at Company | LinkedIn"`.

use super::types::{ContactInfo, FallbackContext, Profile, ProfileCompany};
use crate::utils::{non_empty, non_empty_owned};

const LINKEDIN_MARKER: &str = "| LinkedIn";
const SEGMENT_SEPARATOR: &str = " - ";
const EMPLOYER_SEPARATOR: &str = " at ";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedTitle {
    pub name: Option<String>,
    pub role: Option<String>,
    pub company: Option<String>,
}

/// Parse a search-result title into name, role and company.
///
/// Only titles with at least two segments yield anything; everything after the
/// first separator is the second segment.
pub fn parse_title(title: &str) -> ParsedTitle {
    let title = title.trim();
    let title = title.strip_suffix(LINKEDIN_MARKER).unwrap_or(title).trim();

    let Some((name, role_company)) = title.split_once(SEGMENT_SEPARATOR) else {
        return ParsedTitle::default();
    };

    let role_company = role_company.trim();
    let (role, company) = match role_company.split_once(EMPLOYER_SEPARATOR) {
        Some((role, company)) => (non_empty_owned(Some(role)), non_empty_owned(Some(company))),
        None => (non_empty_owned(Some(role_company)), None),
    };

    ParsedTitle {
        name: non_empty_owned(Some(name)),
        role,
        company,
    }
}

/// Build a profile from a search-result title, filling gaps from the
/// searched values. The result carries empty contact lists.
pub fn profile_from_search_title(title: Option<&str>, context: &FallbackContext) -> Profile {
    let parsed = non_empty(title).map(parse_title).unwrap_or_default();

    let company = parsed
        .company
        .or_else(|| non_empty_owned(context.company_name.as_deref()));

    Profile {
        full_name: parsed
            .name
            .or_else(|| non_empty_owned(context.full_name.as_deref())),
        title: parsed
            .role
            .or_else(|| non_empty_owned(context.job_title.as_deref())),
        company: company.map(ProfileCompany::named),
        location: non_empty_owned(context.location.as_deref()),
        contact_info: Some(ContactInfo::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::normalizer::normalize;

    fn context() -> FallbackContext {
        FallbackContext {
            job_id: "job-1".to_string(),
            linkedin_url: "https://www.linkedin.com/in/jane-doe".to_string(),
            company_name: Some("Searched Co".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_title_with_company() {
        let parsed = parse_title("Jane Doe - CEO at Acme | LinkedIn");
        assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.role.as_deref(), Some("CEO"));
        assert_eq!(parsed.company.as_deref(), Some("Acme"));
    }

    #[test]
    fn test_parse_title_without_employer() {
        let parsed = parse_title("Jane Doe - Head of Sales | LinkedIn");
        assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.role.as_deref(), Some("Head of Sales"));
        assert_eq!(parsed.company, None);
    }

    #[test]
    fn test_parse_title_keeps_later_segments_in_role() {
        let parsed = parse_title("Jane Doe - Founder - Acme Labs | LinkedIn");
        assert_eq!(parsed.name.as_deref(), Some("Jane Doe"));
        assert_eq!(parsed.role.as_deref(), Some("Founder - Acme Labs"));
        assert_eq!(parsed.company, None);
    }

    #[test]
    fn test_parse_title_splits_on_first_at() {
        let parsed = parse_title("Jane Doe - VP at Acme at Scale");
        assert_eq!(parsed.role.as_deref(), Some("VP"));
        assert_eq!(parsed.company.as_deref(), Some("Acme at Scale"));
    }

    #[test]
    fn test_parse_title_single_segment_yields_nothing() {
        assert_eq!(parse_title("Jane Doe | LinkedIn"), ParsedTitle::default());
        assert_eq!(parse_title(""), ParsedTitle::default());
    }

    #[test]
    fn test_fallback_profile_normalizes_to_expected_lead() {
        let ctx = context();
        let profile = profile_from_search_title(Some("Jane Doe - CEO at Acme | LinkedIn"), &ctx);
        let lead = normalize(Some(&profile), &ctx);

        assert_eq!(lead.full_name, "Jane Doe");
        assert_eq!(lead.job_title, "CEO");
        assert_eq!(lead.company_name, "Acme");
        assert_eq!(lead.email, None);
        assert_eq!(lead.phone, None);
    }

    #[test]
    fn test_fallback_without_employer_uses_context_company() {
        let ctx = context();
        let profile =
            profile_from_search_title(Some("Jane Doe - Head of Sales | LinkedIn"), &ctx);
        let lead = normalize(Some(&profile), &ctx);

        assert_eq!(lead.job_title, "Head of Sales");
        assert_eq!(lead.company_name, "Searched Co");
    }

    #[test]
    fn test_fallback_uses_searched_name_and_title_when_unparseable() {
        let ctx = FallbackContext {
            full_name: Some("John Smith".to_string()),
            job_title: Some("CTO".to_string()),
            location: Some("Austin".to_string()),
            ..context()
        };
        let profile = profile_from_search_title(Some("LinkedIn"), &ctx);
        let lead = normalize(Some(&profile), &ctx);

        assert_eq!(lead.full_name, "John Smith");
        assert_eq!(lead.last_name, "Smith");
        assert_eq!(lead.job_title, "CTO");
        assert_eq!(lead.location.as_deref(), Some("Austin"));

        let untitled = profile_from_search_title(None, &FallbackContext::default());
        let lead = normalize(Some(&untitled), &FallbackContext::default());
        assert_eq!(lead.full_name, "Unknown");
        assert_eq!(lead.company_name, "Unknown");
    }
}
