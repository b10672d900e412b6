// src/web/handlers/job_handlers.rs

use crate::core::database::Job;
use crate::leads::{export_filename, leads_to_csv, LeadRecord};
use crate::search::{spawn_job, JobProcessor, SearchRequest};
use crate::web::types::*;

use chrono::Utc;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info, warn};

pub async fn scrape_handler(
    body: Json<serde_json::Value>,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<JobCreated>, ApiError> {
    let body = body.into_inner();
    let request = match serde_json::from_value::<SearchRequest>(body.clone()) {
        Ok(request) => request.normalized(),
        Err(e) => {
            let error_msg = format!("Invalid request body: {}", e);
            warn!("Rejected scrape request: {}", error_msg);
            log_scrape(processor, &body, 400, Some(&error_msg)).await;

            return Err(StandardErrorResponse::new(
                error_msg,
                "INVALID_BODY".to_string(),
                vec![
                    "search_type must be company, name or company_pages".to_string(),
                    "enrichment_provider must be contactout or rocketreach".to_string(),
                ],
            )
            .with_status(Status::BadRequest));
        }
    };
    let payload = serde_json::to_value(&request).unwrap_or_default();

    info!(
        "Scrape request ({:?} search, {}) from {}",
        request.search_type,
        request.enrichment_provider,
        user.id().unwrap_or("anonymous")
    );

    if let Err(e) = request.validate() {
        let error_msg = e.to_string();
        warn!("Rejected scrape request: {}", error_msg);
        log_scrape(processor, &payload, 400, Some(&error_msg)).await;

        let (error_code, suggestions) = categorize_error(&error_msg);
        return Err(StandardErrorResponse::new(error_msg, error_code, suggestions)
            .with_status(Status::BadRequest));
    }

    let job = match processor.enqueue(&request, user.id()).await {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to create job: {}", e);
            log_scrape(processor, &payload, 500, Some(&e.to_string())).await;
            return Err(database_error(format!("Failed to create job: {}", e)));
        }
    };

    log_scrape(processor, &payload, 200, None).await;
    spawn_job(processor.inner().clone(), job.id.clone());

    info!("Queued job {} ({})", job.id, request.label());
    Ok(Json(JobCreated {
        success: true,
        job_id: job.id,
        status: job.status,
    }))
}

pub async fn list_jobs_handler(
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<Vec<crate::core::JobSummary>>>, ApiError> {
    match processor.database().jobs().list_with_lead_counts(user.id()).await {
        Ok(jobs) => Ok(Json(DataResponse::success(
            format!("Found {} jobs", jobs.len()),
            jobs,
        ))),
        Err(e) => {
            error!("Failed to list jobs: {}", e);
            Err(database_error("Failed to list jobs".to_string()))
        }
    }
}

pub async fn job_detail_handler(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<JobDetail>>, ApiError> {
    let job = find_visible_job(processor, id, &user).await?;
    let db = processor.database();

    let leads = db.leads().list_by_job(&job.id).await.map_err(|e| {
        error!("Failed to load leads for {}: {}", job.id, e);
        database_error("Failed to load leads".to_string())
    })?;
    let companies = db.companies().list_by_job(&job.id).await.map_err(|e| {
        error!("Failed to load companies for {}: {}", job.id, e);
        database_error("Failed to load companies".to_string())
    })?;

    Ok(Json(DataResponse::success(
        format!("Job is {}", job.status),
        JobDetail {
            job,
            leads,
            companies,
        },
    )))
}

pub async fn job_leads_handler(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<Vec<LeadRecord>>>, ApiError> {
    let job = find_visible_job(processor, id, &user).await?;
    let leads = load_leads(processor, &job).await?;

    Ok(Json(DataResponse::success(
        format!("Found {} leads", leads.len()),
        leads,
    )))
}

pub async fn export_job_handler(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<CsvResponse, ApiError> {
    let job = find_visible_job(processor, id, &user).await?;
    let leads = load_leads(processor, &job).await?;

    let csv = leads_to_csv(leads.iter().map(|record| &record.lead)).map_err(|e| {
        error!("CSV export failed for {}: {}", job.id, e);
        StandardErrorResponse::new(
            "Failed to export leads".to_string(),
            "EXPORT_ERROR".to_string(),
            vec!["Try again in a few moments".to_string()],
        )
        .with_status(Status::InternalServerError)
    })?;

    let filename = export_filename(&job.id, Utc::now());
    info!("Exported {} leads of job {} as {}", leads.len(), job.id, filename);
    Ok(CsvResponse::with_filename(csv, filename))
}

pub async fn delete_job_handler(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<ActionResponse>, ApiError> {
    let job = find_visible_job(processor, id, &user).await?;

    match processor.database().jobs().delete(&job.id).await {
        Ok(true) => Ok(Json(ActionResponse::success(
            format!("Job {} deleted", job.id),
            "job_deleted".to_string(),
        ))),
        Ok(false) => Err(job_not_found(id)),
        Err(e) => {
            error!("Failed to delete job {}: {}", job.id, e);
            Err(database_error("Failed to delete job".to_string()))
        }
    }
}

async fn find_visible_job(
    processor: &JobProcessor,
    id: &str,
    user: &RequestUser,
) -> Result<Job, ApiError> {
    match processor.database().jobs().find(id).await {
        Ok(Some(job)) if user.can_see(&job) => Ok(job),
        Ok(_) => Err(job_not_found(id)),
        Err(e) => {
            error!("Failed to load job {}: {}", id, e);
            Err(database_error("Failed to load job".to_string()))
        }
    }
}

async fn load_leads(processor: &JobProcessor, job: &Job) -> Result<Vec<LeadRecord>, ApiError> {
    processor
        .database()
        .leads()
        .list_by_job(&job.id)
        .await
        .map_err(|e| {
            error!("Failed to load leads for {}: {}", job.id, e);
            database_error("Failed to load leads".to_string())
        })
}

async fn log_scrape(
    processor: &JobProcessor,
    payload: &serde_json::Value,
    status: u16,
    error_msg: Option<&str>,
) {
    if let Err(e) = processor
        .database()
        .scrape_logs()
        .record(payload, status, error_msg)
        .await
    {
        warn!("Failed to record scrape log: {}", e);
    }
}

fn job_not_found(id: &str) -> ApiError {
    StandardErrorResponse::new(
        format!("Job {} not found", id),
        "JOB_NOT_FOUND".to_string(),
        vec!["List your jobs to see available job ids".to_string()],
    )
    .with_status(Status::NotFound)
}

fn database_error(message: String) -> ApiError {
    StandardErrorResponse::new(
        message,
        "DATABASE_ERROR".to_string(),
        vec!["Try again in a few moments".to_string()],
    )
    .with_status(Status::InternalServerError)
}

fn categorize_error(error_msg: &str) -> (String, Vec<String>) {
    if error_msg.contains("Full name is required") {
        (
            "MISSING_FULL_NAME".to_string(),
            vec![
                "Provide full_name for name searches".to_string(),
                "Use search_type \"company\" to search by company instead".to_string(),
            ],
        )
    } else if error_msg.contains("at least one search parameter") {
        (
            "MISSING_SEARCH_PARAMETER".to_string(),
            vec!["Provide company_name, location or business_type".to_string()],
        )
    } else {
        (
            "VALIDATION_ERROR".to_string(),
            vec!["Check your request fields".to_string()],
        )
    }
}
