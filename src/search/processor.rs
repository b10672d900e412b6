// src/search/processor.rs
//! Runs one scrape job end to end: search, filter, enrich or fall back,
//! normalize, store. A job-level failure lands in the job's error message;
//! a failure on a single result only skips that result.

use anyhow::{Context, Result};
use tracing::{error, info, warn};

use super::company_scraper::{extract_company, CompanySource};
use super::request::{SearchRequest, SearchType};
use crate::core::database::{Database, Job};
use crate::leads::{normalize, profile_from_search_title, SearchResult};
use crate::vendors::Vendors;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobOutcome {
    pub leads: usize,
    pub companies: usize,
    pub result_id: Option<String>,
}

#[derive(Clone)]
pub struct JobProcessor {
    db: Database,
    vendors: Vendors,
}

impl JobProcessor {
    pub fn new(db: Database, vendors: Vendors) -> Self {
        Self { db, vendors }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Store a validated request as a queued job
    pub async fn enqueue(&self, request: &SearchRequest, user_id: Option<&str>) -> Result<Job> {
        let request = request.clone().normalized();
        request.validate()?;
        let payload = serde_json::to_value(&request).context("Failed to serialize search request")?;
        self.db.jobs().create(payload, user_id).await
    }

    /// Process a queued job to completion. Returns `Err` once the job has
    /// been marked failed (or could not be started at all).
    pub async fn run(&self, job_id: &str) -> Result<JobOutcome> {
        let job = self
            .db
            .jobs()
            .find(job_id)
            .await?
            .with_context(|| format!("Job {} not found", job_id))?;

        self.db.jobs().mark_processing(&job.id).await?;

        let outcome = match serde_json::from_value::<SearchRequest>(job.payload.0.clone()) {
            Ok(request) => self.execute(&job, &request).await,
            Err(e) => Err(anyhow::anyhow!("Invalid job payload: {}", e)),
        };

        match outcome {
            Ok(outcome) => {
                self.db
                    .jobs()
                    .mark_completed(&job.id, outcome.result_id.as_deref())
                    .await?;
                info!(
                    "Job {} completed: {} leads, {} companies",
                    job.id, outcome.leads, outcome.companies
                );
                Ok(outcome)
            }
            Err(e) => {
                let message = e.to_string();
                error!("Job {} failed: {}", job.id, message);
                self.db.jobs().mark_failed(&job.id, &message).await?;
                Err(e)
            }
        }
    }

    async fn execute(&self, job: &Job, request: &SearchRequest) -> Result<JobOutcome> {
        let search = self
            .vendors
            .search
            .as_ref()
            .context("SERPAPI_KEY is not configured")?;

        let query = request.query();
        let results = search.search(&query, request.num_results()).await?;

        if results.is_empty() {
            anyhow::bail!(match request.search_type {
                SearchType::Name => "No LinkedIn profiles found for this name",
                SearchType::Company => "No LinkedIn profiles found",
                SearchType::CompanyPages => "No LinkedIn company pages found",
            });
        }

        let marker = request.link_marker();
        let matching: Vec<&SearchResult> = results.iter().filter(|r| r.links_to(marker)).collect();
        info!(
            "Job {}: {} of {} results link to {}",
            job.id,
            matching.len(),
            results.len(),
            marker
        );

        match request.search_type {
            SearchType::CompanyPages => self.scrape_companies(job, &query, &matching).await,
            SearchType::Company | SearchType::Name => {
                self.collect_leads(job, request, &matching).await
            }
        }
    }

    async fn collect_leads(
        &self,
        job: &Job,
        request: &SearchRequest,
        results: &[&SearchResult],
    ) -> Result<JobOutcome> {
        let context = request.fallback_context(&job.id, job.user_id.as_deref());
        let enricher = self.vendors.enricher(request.enrichment_provider);
        if enricher.is_none() {
            warn!(
                "No {} API key configured, using search titles only",
                request.enrichment_provider
            );
        }

        let mut outcome = JobOutcome::default();

        for result in results {
            let Some(url) = result.link() else { continue };
            let item_context = context.with_linkedin_url(url);

            let enriched = match enricher {
                Some(enricher) => match enricher.enrich(url).await {
                    Ok(profile) => profile,
                    Err(e) => {
                        warn!("{} lookup failed for {}: {:#}", enricher.provider(), url, e);
                        None
                    }
                },
                None => None,
            };

            let profile = enriched.unwrap_or_else(|| {
                info!("Using search title fallback for {}", url);
                profile_from_search_title(result.title.as_deref(), &item_context)
            });

            let lead = normalize(Some(&profile), &item_context);
            match self.db.leads().insert(&lead).await {
                Ok(record) => {
                    info!("Saved lead: {}", record.lead.full_name);
                    outcome.result_id.get_or_insert(record.id);
                    outcome.leads += 1;
                }
                Err(e) => error!("Skipping lead {}: {:#}", url, e),
            }
        }

        Ok(outcome)
    }

    async fn scrape_companies(
        &self,
        job: &Job,
        query: &str,
        results: &[&SearchResult],
    ) -> Result<JobOutcome> {
        let source = CompanySource {
            job_id: &job.id,
            user_id: job.user_id.as_deref(),
            search_query: query,
        };

        let mut outcome = JobOutcome::default();

        for result in results {
            let Some(url) = result.link() else { continue };

            let html = match &self.vendors.pages {
                Some(pages) => match pages.fetch(url).await {
                    Ok(html) => html,
                    Err(e) => {
                        error!("Failed to scrape {}: {:#}", url, e);
                        continue;
                    }
                },
                None => String::new(),
            };

            let company = extract_company(&html, result, &source);
            match self.db.companies().insert(&company).await {
                Ok(record) => {
                    info!("Saved company: {}", record.company.company_name);
                    outcome.result_id.get_or_insert(record.id);
                    outcome.companies += 1;
                }
                Err(e) => error!("Skipping company {}: {:#}", url, e),
            }
        }

        Ok(outcome)
    }
}

/// Run a job in the background; failures are already recorded on the job.
pub fn spawn_job(processor: JobProcessor, job_id: String) {
    tokio::spawn(async move {
        if let Err(e) = processor.run(&job_id).await {
            warn!("Background job {} ended with error: {:#}", job_id, e);
        }
    });
}
