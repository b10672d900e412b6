// src/search/mod.rs
pub mod company_scraper;
pub mod processor;
pub mod request;

pub use company_scraper::{extract_company, Company, CompanyRecord};
pub use processor::{spawn_job, JobOutcome, JobProcessor};
pub use request::{SearchRequest, SearchType};
