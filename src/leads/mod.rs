// src/leads/mod.rs
pub mod export;
pub mod normalizer;
pub mod title_parser;
pub mod types;

pub use export::{export_filename, leads_to_csv};
pub use normalizer::{normalize, UNKNOWN};
pub use title_parser::{parse_title, profile_from_search_title};
pub use types::{ContactInfo, FallbackContext, Lead, LeadRecord, Profile, ProfileCompany, SearchResult};
