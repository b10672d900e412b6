// src/core/database.rs
//! SQLite-backed job store, lead and company tables, and scrape request log

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::types::Json;
use sqlx::SqlitePool;
use std::path::Path;
use tracing::{info, warn};
use uuid::Uuid;

use crate::leads::{Lead, LeadRecord};
use crate::search::company_scraper::{Company, CompanyRecord};

// ===== Core Database Connection Management =====

#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open (creating if needed) the database file and run migrations
    pub async fn connect(database_path: &Path) -> Result<Self> {
        if let Some(parent) = database_path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .context("Failed to create database directory")?;
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path.display());
        let pool = SqlitePool::connect(&database_url).await.with_context(|| {
            format!("Failed to connect to database: {}", database_path.display())
        })?;

        info!("Database connection established: {}", database_path.display());

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Private in-memory database, used by tests and dry runs
    pub async fn in_memory() -> Result<Self> {
        // Every connection to :memory: is a separate database, so keep exactly one.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .context("Failed to open in-memory database")?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn jobs(&self) -> JobRepository<'_> {
        JobRepository::new(&self.pool)
    }

    pub fn leads(&self) -> LeadRepository<'_> {
        LeadRepository::new(&self.pool)
    }

    pub fn companies(&self) -> CompanyRepository<'_> {
        CompanyRepository::new(&self.pool)
    }

    pub fn scrape_logs(&self) -> ScrapeLogRepository<'_> {
        ScrapeLogRepository::new(&self.pool)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id TEXT PRIMARY KEY,
                user_id TEXT,
                status TEXT NOT NULL DEFAULT 'queued'
                    CHECK (status IN ('queued', 'processing', 'completed', 'failed')),
                payload TEXT NOT NULL,
                result_id TEXT,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS leads (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                user_id TEXT,
                full_name TEXT NOT NULL,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                job_title TEXT NOT NULL,
                company_name TEXT NOT NULL,
                location TEXT,
                email TEXT,
                phone TEXT,
                linkedin_url TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS companies (
                id TEXT PRIMARY KEY,
                job_id TEXT NOT NULL REFERENCES jobs(id) ON DELETE CASCADE,
                user_id TEXT,
                company_name TEXT NOT NULL,
                linkedin_url TEXT,
                linkedin_id TEXT,
                industry TEXT,
                employee_count TEXT,
                headquarters TEXT,
                website TEXT,
                description TEXT,
                search_query TEXT,
                scraped_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scrape_logs (
                id TEXT PRIMARY KEY,
                request_payload TEXT,
                response_status INTEGER,
                error TEXT,
                created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_leads_job_id ON leads(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_companies_job_id ON companies(job_id);")
            .execute(&self.pool)
            .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_jobs_user_id ON jobs(user_id);")
            .execute(&self.pool)
            .await?;

        info!("Database migrations completed");
        Ok(())
    }

    /// Check database health
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database health check failed")?;
        Ok(())
    }
}

// ===== Job Models =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "queued",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }

    /// queued -> processing -> completed | failed; a queued job may also fail outright
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (JobStatus::Queued, JobStatus::Processing)
                | (JobStatus::Queued, JobStatus::Failed)
                | (JobStatus::Processing, JobStatus::Completed)
                | (JobStatus::Processing, JobStatus::Failed)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Job {
    pub id: String,
    pub user_id: Option<String>,
    pub status: JobStatus,
    pub payload: Json<serde_json::Value>,
    pub result_id: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct JobSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub job: Job,
    pub lead_count: i64,
}

// ===== Job Repository =====

pub struct JobRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> JobRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a queued job
    pub async fn create(&self, payload: serde_json::Value, user_id: Option<&str>) -> Result<Job> {
        let now = Utc::now();
        let job = Job {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.map(str::to_string),
            status: JobStatus::Queued,
            payload: Json(payload),
            result_id: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO jobs (id, user_id, status, payload, result_id, error_message, created_at, updated_at)
            VALUES (?, ?, ?, ?, NULL, NULL, ?, ?)
            "#,
        )
        .bind(&job.id)
        .bind(&job.user_id)
        .bind(job.status)
        .bind(&job.payload)
        .bind(job.created_at)
        .bind(job.updated_at)
        .execute(self.pool)
        .await
        .context("Failed to create job")?;

        info!("Created job {}", job.id);
        Ok(job)
    }

    pub async fn find(&self, id: &str) -> Result<Option<Job>> {
        let job = sqlx::query_as::<_, Job>(
            r#"
            SELECT id, user_id, status, payload, result_id, error_message, created_at, updated_at
            FROM jobs
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(job)
    }

    /// Jobs newest first with their lead counts, optionally for one user
    pub async fn list_with_lead_counts(&self, user_id: Option<&str>) -> Result<Vec<JobSummary>> {
        let jobs = sqlx::query_as::<_, JobSummary>(
            r#"
            SELECT j.id, j.user_id, j.status, j.payload, j.result_id, j.error_message,
                   j.created_at, j.updated_at,
                   (SELECT COUNT(*) FROM leads l WHERE l.job_id = j.id) AS lead_count
            FROM jobs j
            WHERE ?1 IS NULL OR j.user_id IS NULL OR j.user_id = ?1
            ORDER BY j.rowid DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(jobs)
    }

    pub async fn mark_processing(&self, id: &str) -> Result<()> {
        self.transition(id, &[JobStatus::Queued], JobStatus::Processing, None, None)
            .await
    }

    pub async fn mark_completed(&self, id: &str, result_id: Option<&str>) -> Result<()> {
        self.transition(
            id,
            &[JobStatus::Processing],
            JobStatus::Completed,
            result_id,
            None,
        )
        .await
    }

    pub async fn mark_failed(&self, id: &str, error_message: &str) -> Result<()> {
        self.transition(
            id,
            &[JobStatus::Queued, JobStatus::Processing],
            JobStatus::Failed,
            None,
            Some(error_message),
        )
        .await
    }

    /// Move a job to `next`; refused unless the stored status is one of `from`.
    async fn transition(
        &self,
        id: &str,
        from: &[JobStatus],
        next: JobStatus,
        result_id: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<()> {
        debug_assert!(from.iter().all(|s| s.can_transition_to(next)));

        let placeholders = vec!["?"; from.len()].join(", ");
        let sql = format!(
            r#"
            UPDATE jobs
            SET status = ?, result_id = COALESCE(?, result_id), error_message = ?, updated_at = ?
            WHERE id = ? AND status IN ({})
            "#,
            placeholders
        );

        let mut query = sqlx::query(&sql)
            .bind(next)
            .bind(result_id)
            .bind(error_message)
            .bind(Utc::now())
            .bind(id);
        for status in from {
            query = query.bind(*status);
        }

        let result = query.execute(self.pool).await?;
        if result.rows_affected() == 0 {
            let current = self.find(id).await?.map(|job| job.status);
            warn!(
                "Rejected job {} transition to {} (current: {:?})",
                id, next, current
            );
            anyhow::bail!(
                "Job {} cannot move to {} from {}",
                id,
                next,
                current.map_or("missing".to_string(), |s| s.to_string())
            );
        }

        info!("Job {} is now {}", id, next);
        Ok(())
    }

    /// Delete a job together with its leads and companies
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM leads WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM companies WHERE job_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM jobs WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!("Deleted job {} and its results", id);
        }
        Ok(deleted)
    }
}

// ===== Lead Repository =====

pub struct LeadRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> LeadRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, lead: &Lead) -> Result<LeadRecord> {
        let record = LeadRecord {
            id: Uuid::new_v4().to_string(),
            lead: lead.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO leads (id, job_id, user_id, full_name, first_name, last_name, job_title,
                               company_name, location, email, phone, linkedin_url, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&lead.job_id)
        .bind(&lead.user_id)
        .bind(&lead.full_name)
        .bind(&lead.first_name)
        .bind(&lead.last_name)
        .bind(&lead.job_title)
        .bind(&lead.company_name)
        .bind(&lead.location)
        .bind(&lead.email)
        .bind(&lead.phone)
        .bind(&lead.linkedin_url)
        .bind(record.created_at)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to insert lead for {}", lead.linkedin_url))?;

        Ok(record)
    }

    /// Leads of a job, newest first
    pub async fn list_by_job(&self, job_id: &str) -> Result<Vec<LeadRecord>> {
        let leads = sqlx::query_as::<_, LeadRecord>(
            r#"
            SELECT id, job_id, user_id, full_name, first_name, last_name, job_title,
                   company_name, location, email, phone, linkedin_url, created_at
            FROM leads
            WHERE job_id = ?
            ORDER BY rowid DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;

        Ok(leads)
    }

    pub async fn count_by_job(&self, job_id: &str) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM leads WHERE job_id = ?")
            .bind(job_id)
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

// ===== Company Repository =====

pub struct CompanyRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CompanyRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, company: &Company) -> Result<CompanyRecord> {
        let record = CompanyRecord {
            id: Uuid::new_v4().to_string(),
            company: company.clone(),
            scraped_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO companies (id, job_id, user_id, company_name, linkedin_url, linkedin_id,
                                   industry, employee_count, headquarters, website, description,
                                   search_query, scraped_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&company.job_id)
        .bind(&company.user_id)
        .bind(&company.company_name)
        .bind(&company.linkedin_url)
        .bind(&company.linkedin_id)
        .bind(&company.industry)
        .bind(&company.employee_count)
        .bind(&company.headquarters)
        .bind(&company.website)
        .bind(&company.description)
        .bind(&company.search_query)
        .bind(record.scraped_at)
        .execute(self.pool)
        .await
        .with_context(|| format!("Failed to insert company {}", company.company_name))?;

        Ok(record)
    }

    pub async fn list_by_job(&self, job_id: &str) -> Result<Vec<CompanyRecord>> {
        let companies = sqlx::query_as::<_, CompanyRecord>(
            r#"
            SELECT id, job_id, user_id, company_name, linkedin_url, linkedin_id, industry,
                   employee_count, headquarters, website, description, search_query, scraped_at
            FROM companies
            WHERE job_id = ?
            ORDER BY rowid DESC
            "#,
        )
        .bind(job_id)
        .fetch_all(self.pool)
        .await?;

        Ok(companies)
    }
}

// ===== Scrape Log Repository =====

pub struct ScrapeLogRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ScrapeLogRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn record(
        &self,
        request_payload: &serde_json::Value,
        response_status: u16,
        error: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO scrape_logs (id, request_payload, response_status, error, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(Json(request_payload))
        .bind(i64::from(response_status))
        .bind(error)
        .bind(Utc::now())
        .execute(self.pool)
        .await
        .context("Failed to record scrape log")?;
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM scrape_logs")
            .fetch_one(self.pool)
            .await?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leads::{normalize, FallbackContext, Profile};
    use serde_json::json;

    fn sample_lead(job_id: &str, name: &str) -> Lead {
        let ctx = FallbackContext::for_job(job_id)
            .with_linkedin_url(&format!("https://www.linkedin.com/in/{}", name));
        let profile = Profile {
            full_name: Some(name.to_string()),
            ..Default::default()
        };
        normalize(Some(&profile), &ctx)
    }

    #[test]
    fn test_status_transitions() {
        use JobStatus::*;
        assert!(Queued.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Completed));
        assert!(Processing.can_transition_to(Failed));
        assert!(!Completed.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Completed));
        assert!(!Queued.can_transition_to(Completed));
        assert!(Completed.is_terminal() && Failed.is_terminal());
    }

    #[tokio::test]
    async fn test_job_lifecycle() {
        let db = Database::in_memory().await.unwrap();
        let jobs = db.jobs();

        let job = jobs
            .create(json!({"search_type": "company"}), Some("user-1"))
            .await
            .unwrap();
        assert_eq!(job.status, JobStatus::Queued);

        // cannot complete a job that never started
        assert!(jobs.mark_completed(&job.id, None).await.is_err());

        jobs.mark_processing(&job.id).await.unwrap();
        jobs.mark_completed(&job.id, Some("lead-1")).await.unwrap();

        let stored = jobs.find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Completed);
        assert_eq!(stored.result_id.as_deref(), Some("lead-1"));
        assert_eq!(stored.error_message, None);
        assert_eq!(stored.payload.0["search_type"], "company");

        // terminal states are never revisited
        assert!(jobs.mark_processing(&job.id).await.is_err());
        assert!(jobs.mark_failed(&job.id, "late").await.is_err());
    }

    #[tokio::test]
    async fn test_failed_job_keeps_message() {
        let db = Database::in_memory().await.unwrap();
        let job = db.jobs().create(json!({}), None).await.unwrap();

        db.jobs().mark_processing(&job.id).await.unwrap();
        db.jobs()
            .mark_failed(&job.id, "SERPAPI_KEY is not configured")
            .await
            .unwrap();

        let stored = db.jobs().find(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.status, JobStatus::Failed);
        assert_eq!(
            stored.error_message.as_deref(),
            Some("SERPAPI_KEY is not configured")
        );
    }

    #[tokio::test]
    async fn test_leads_counts_and_delete() {
        let db = Database::in_memory().await.unwrap();
        let first = db.jobs().create(json!({}), Some("alice")).await.unwrap();
        let second = db.jobs().create(json!({}), Some("bob")).await.unwrap();

        db.leads().insert(&sample_lead(&first.id, "jane")).await.unwrap();
        db.leads().insert(&sample_lead(&first.id, "john")).await.unwrap();

        assert_eq!(db.leads().count_by_job(&first.id).await.unwrap(), 2);
        assert_eq!(db.leads().count_by_job(&second.id).await.unwrap(), 0);

        let leads = db.leads().list_by_job(&first.id).await.unwrap();
        assert_eq!(leads[0].lead.full_name, "john");
        assert_eq!(leads[1].lead.full_name, "jane");
        assert_eq!(leads[0].lead.job_title, "Unknown");

        let all = db.jobs().list_with_lead_counts(None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].job.id, second.id);
        assert_eq!(all[1].lead_count, 2);

        let mine = db.jobs().list_with_lead_counts(Some("alice")).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].job.id, first.id);

        assert!(db.jobs().delete(&first.id).await.unwrap());
        assert!(!db.jobs().delete(&first.id).await.unwrap());
        assert_eq!(db.leads().count_by_job(&first.id).await.unwrap(), 0);
        assert!(db.jobs().find(&first.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_scrape_log() {
        let db = Database::in_memory().await.unwrap();
        db.scrape_logs()
            .record(&json!({"company_name": "Acme"}), 200, None)
            .await
            .unwrap();
        db.scrape_logs()
            .record(&json!({}), 400, Some("Please provide at least one search parameter"))
            .await
            .unwrap();
        assert_eq!(db.scrape_logs().count().await.unwrap(), 2);
    }
}
