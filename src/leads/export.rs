// src/leads/export.rs
use super::types::Lead;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use csv::{QuoteStyle, WriterBuilder};

use crate::utils::short_id;

pub const CSV_HEADERS: [&str; 7] = [
    "Full Name",
    "Job Title",
    "Company",
    "Location",
    "Email",
    "Phone",
    "LinkedIn URL",
];

/// Render leads as CSV with every field quoted. Null fields become empty strings.
pub fn leads_to_csv<'a, I>(leads: I) -> Result<String>
where
    I: IntoIterator<Item = &'a Lead>,
{
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(Vec::new());

    writer
        .write_record(CSV_HEADERS)
        .context("Failed to write CSV header")?;

    for lead in leads {
        writer
            .write_record([
                lead.full_name.as_str(),
                lead.job_title.as_str(),
                lead.company_name.as_str(),
                lead.location.as_deref().unwrap_or(""),
                lead.email.as_deref().unwrap_or(""),
                lead.phone.as_deref().unwrap_or(""),
                lead.linkedin_url.as_str(),
            ])
            .with_context(|| format!("Failed to write CSV row for {}", lead.linkedin_url))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Failed to flush CSV writer: {}", e))?;
    String::from_utf8(bytes).context("CSV output is not valid UTF-8")
}

pub fn export_filename(job_id: &str, at: DateTime<Utc>) -> String {
    format!("leads-{}-{}.csv", short_id(job_id), at.timestamp_millis())
}
