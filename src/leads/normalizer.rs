// src/leads/normalizer.rs
//! Reduces a vendor profile, or the lack of one, to a single lead record.
//!
//! Resolution is first-non-empty-wins per field, falling back to the search
//! context and finally to `"Unknown"` or null. Normalization never fails.

use super::types::{FallbackContext, Lead, Profile};
use crate::utils::{collapse_whitespace, first_non_empty, non_empty};

pub const UNKNOWN: &str = "Unknown";

pub fn normalize(profile: Option<&Profile>, context: &FallbackContext) -> Lead {
    let empty = Profile::default();
    let profile = profile.unwrap_or(&empty);

    let full_name = non_empty(profile.full_name.as_deref())
        .map(collapse_whitespace)
        .unwrap_or_else(|| UNKNOWN.to_string());
    let (first_name, last_name) = split_full_name(&full_name);

    let job_title = non_empty(profile.title.as_deref())
        .unwrap_or(UNKNOWN)
        .to_string();

    let company_name = non_empty(profile.company_name())
        .or_else(|| non_empty(context.company_name.as_deref()))
        .unwrap_or(UNKNOWN)
        .to_string();

    let location = non_empty(profile.location.as_deref())
        .or_else(|| non_empty(context.location.as_deref()))
        .map(str::to_string);

    Lead {
        job_id: context.job_id.clone(),
        user_id: context.user_id.clone(),
        full_name,
        first_name,
        last_name,
        job_title,
        company_name,
        location,
        email: resolve_email(profile),
        phone: resolve_phone(profile),
        linkedin_url: context.linkedin_url.clone(),
    }
}

/// Work address first, then personal, then whatever the vendor lists generically.
pub fn resolve_email(profile: &Profile) -> Option<String> {
    let contact = profile.contact_info.as_ref()?;
    first_non_empty(&contact.work_emails)
        .or_else(|| first_non_empty(&contact.personal_emails))
        .or_else(|| first_non_empty(&contact.emails))
}

pub fn resolve_phone(profile: &Profile) -> Option<String> {
    profile
        .contact_info
        .as_ref()
        .and_then(|contact| first_non_empty(&contact.phones))
}

/// Split on the first space; the remainder is the last name and may be empty.
pub fn split_full_name(full_name: &str) -> (String, String) {
    match full_name.split_once(' ') {
        Some((first, rest)) => (first.to_string(), rest.to_string()),
        None => (full_name.to_string(), String::new()),
    }
}
