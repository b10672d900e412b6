// src/cli.rs
use crate::core::{ConfigManager, Database};
use crate::leads::{export_filename, leads_to_csv};
use crate::search::{JobOutcome, JobProcessor, SearchRequest, SearchType};
use crate::utils::short_id;
use crate::vendors::{EnrichmentProvider, Vendors};
use crate::web::start_web_server;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "leadgen")]
#[command(about = "Find, enrich and export B2B leads from LinkedIn search results")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Override the configured SQLite database path
    #[arg(long, global = true)]
    pub database_path: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run a search job in the foreground
    #[command(subcommand)]
    Search(SearchCommand),
    /// List jobs with their lead counts
    Jobs {
        #[arg(long)]
        user: Option<String>,
    },
    /// Show the leads of a job
    Leads { job_id: String },
    /// Write the leads of a job to a CSV file
    Export {
        job_id: String,
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete a job with its leads and companies
    Delete { job_id: String },
}

#[derive(Subcommand)]
pub enum SearchCommand {
    /// Decision makers at a company or in a location
    Company {
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        location: Option<String>,
        /// Role filter, e.g. "CTO OR VP Engineering"
        #[arg(long)]
        roles: Option<String>,
        #[command(flatten)]
        common: CommonSearchArgs,
    },
    /// A specific person
    Name {
        full_name: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[command(flatten)]
        common: CommonSearchArgs,
    },
    /// LinkedIn company pages
    CompanyPages {
        #[arg(long)]
        company: Option<String>,
        #[arg(long)]
        business_type: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[command(flatten)]
        common: CommonSearchArgs,
    },
}

#[derive(Args)]
pub struct CommonSearchArgs {
    /// contactout or rocketreach
    #[arg(long, default_value = "contactout")]
    pub provider: EnrichmentProvider,
    /// Owner recorded on the job
    #[arg(long)]
    pub user: Option<String>,
}

impl SearchCommand {
    fn into_request(self) -> (SearchRequest, Option<String>) {
        match self {
            SearchCommand::Company {
                company,
                location,
                roles,
                common,
            } => (
                SearchRequest {
                    search_type: SearchType::Company,
                    company_name: company,
                    location,
                    business_type: roles,
                    enrichment_provider: common.provider,
                    ..Default::default()
                },
                common.user,
            ),
            SearchCommand::Name {
                full_name,
                title,
                company,
                location,
                common,
            } => (
                SearchRequest {
                    search_type: SearchType::Name,
                    full_name: Some(full_name),
                    job_title: title,
                    company_name: company,
                    location,
                    enrichment_provider: common.provider,
                    ..Default::default()
                },
                common.user,
            ),
            SearchCommand::CompanyPages {
                company,
                business_type,
                location,
                common,
            } => (
                SearchRequest {
                    search_type: SearchType::CompanyPages,
                    company_name: company,
                    business_type,
                    location,
                    enrichment_provider: common.provider,
                    ..Default::default()
                },
                common.user,
            ),
        }
    }
}

pub async fn handle_command(cli: Cli, mut config: ConfigManager) -> Result<()> {
    if let Some(path) = cli.database_path {
        config.environment.database_path = path;
    }

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.environment.port = port;
            }
            start_web_server(config).await?;
        }

        Command::Search(search) => {
            let (request, user) = search.into_request();
            let db = open_database(&config).await?;
            let processor = JobProcessor::new(db, Vendors::from_config(&config.vendors)?);

            run_search(&processor, &request, user.as_deref()).await?;
        }

        Command::Jobs { user } => {
            let db = open_database(&config).await?;
            let jobs = db.jobs().list_with_lead_counts(user.as_deref()).await?;
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                println!(
                    "{:<38} {:<11} {:<6} {:<25} {:<20}",
                    "ID", "Status", "Leads", "Search", "Created"
                );
                println!("{}", "-".repeat(104));

                for summary in jobs {
                    let job = &summary.job;
                    let label = serde_json::from_value::<SearchRequest>(job.payload.0.clone())
                        .map(|request| request.label())
                        .unwrap_or_else(|_| "-".to_string());
                    println!(
                        "{:<38} {:<11} {:<6} {:<25} {:<20}",
                        job.id,
                        job.status.as_str(),
                        summary.lead_count,
                        label,
                        job.created_at.format("%Y-%m-%d %H:%M").to_string()
                    );
                    if let Some(message) = &job.error_message {
                        println!("    error: {}", message);
                    }
                }
            }
        }

        Command::Leads { job_id } => {
            let db = open_database(&config).await?;
            let leads = db.leads().list_by_job(&job_id).await?;
            if leads.is_empty() {
                println!("No leads for job {}.", short_id(&job_id));
            }
            for record in leads {
                let lead = &record.lead;
                println!(
                    "{} | {} | {} | {} | {}",
                    lead.full_name,
                    lead.job_title,
                    lead.company_name,
                    lead.email.as_deref().unwrap_or("-"),
                    lead.linkedin_url
                );
            }
        }

        Command::Export { job_id, output } => {
            let db = open_database(&config).await?;
            if db.jobs().find(&job_id).await?.is_none() {
                anyhow::bail!("Job {} not found", job_id);
            }
            let leads = db.leads().list_by_job(&job_id).await?;
            let csv = leads_to_csv(leads.iter().map(|record| &record.lead))?;

            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(&job_id, Utc::now())));
            tokio::fs::write(&path, csv)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;

            info!("Exported {} leads to {}", leads.len(), path.display());
            println!("✅ Exported {} leads to {}", leads.len(), path.display());
        }

        Command::Delete { job_id } => {
            let db = open_database(&config).await?;
            match db.jobs().delete(&job_id).await? {
                true => println!("✅ Deleted job {}", job_id),
                false => println!("❌ No job found with id {}", job_id),
            }
        }
    }

    Ok(())
}

/// Queue and run a job inline. A failed job is an error so the exit status reflects it.
async fn run_search(
    processor: &JobProcessor,
    request: &SearchRequest,
    user: Option<&str>,
) -> Result<JobOutcome> {
    let job = processor.enqueue(request, user).await?;
    println!("Job {} queued: {}", job.id, request.query());

    match processor.run(&job.id).await {
        Ok(outcome) => {
            println!(
                "✅ Job {} completed: {} leads, {} companies",
                job.id, outcome.leads, outcome.companies
            );
            Ok(outcome)
        }
        Err(e) => {
            error!("Job {} failed: {}", job.id, e);
            println!("❌ Job {} failed: {}", job.id, e);
            Err(e.context(format!("Job {} failed", job.id)))
        }
    }
}

async fn open_database(config: &ConfigManager) -> Result<Database> {
    config.ensure_directories().await?;
    Database::connect(&config.environment.database_path).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_company_search() {
        let cli = Cli::parse_from([
            "leadgen",
            "search",
            "company",
            "--company",
            "Acme",
            "--location",
            "Berlin",
            "--provider",
            "rocketreach",
        ]);

        let Some(Command::Search(search)) = cli.command else {
            panic!("expected search command");
        };
        let (request, user) = search.into_request();
        assert_eq!(request.search_type, SearchType::Company);
        assert_eq!(request.company_name.as_deref(), Some("Acme"));
        assert_eq!(request.enrichment_provider, EnrichmentProvider::RocketReach);
        assert_eq!(user, None);
    }

    #[test]
    fn test_parse_name_search_and_defaults() {
        let cli = Cli::parse_from(["leadgen", "search", "name", "Jane Doe", "--user", "u1"]);
        let Some(Command::Search(search)) = cli.command else {
            panic!("expected search command");
        };
        let (request, user) = search.into_request();
        assert_eq!(request.full_name.as_deref(), Some("Jane Doe"));
        assert_eq!(request.enrichment_provider, EnrichmentProvider::ContactOut);
        assert_eq!(user.as_deref(), Some("u1"));
    }

    #[tokio::test]
    async fn test_failed_search_is_an_error() {
        let db = Database::in_memory().await.unwrap();
        let processor = JobProcessor::new(db.clone(), Vendors::default());
        let request = SearchRequest {
            company_name: Some("Acme".to_string()),
            ..Default::default()
        };

        let err = run_search(&processor, &request, Some("u1")).await.unwrap_err();
        assert!(format!("{:#}", err).contains("SERPAPI_KEY is not configured"));

        let jobs = db.jobs().list_with_lead_counts(None).await.unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].job.status, crate::core::JobStatus::Failed);
    }

    #[test]
    fn test_serve_is_default() {
        let cli = Cli::parse_from(["leadgen", "--database-path", "/tmp/x.db"]);
        assert!(cli.command.is_none());
        assert_eq!(cli.database_path, Some(PathBuf::from("/tmp/x.db")));
    }
}
