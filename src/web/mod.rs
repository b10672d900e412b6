// src/web/mod.rs

pub mod handlers;
pub mod types;

pub use handlers::*;
pub use types::*;

use crate::core::{ConfigManager, Database, JobSummary};
use crate::leads::LeadRecord;
use crate::search::JobProcessor;
use crate::vendors::Vendors;
use anyhow::{Context, Result};
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::serde::json::Json;
use rocket::{catchers, delete, get, options, post, routes, Build, Request, Response, Rocket, State};
use tracing::info;

// CORS Fairing
pub struct Cors;

#[rocket::async_trait]
impl Fairing for Cors {
    fn info(&self) -> Info {
        Info {
            name: "Add CORS headers to responses",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, _request: &'r Request<'_>, response: &mut Response<'r>) {
        response.set_header(Header::new("Access-Control-Allow-Origin", "*"));
        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "POST, GET, DELETE, OPTIONS",
        ));
        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "authorization, x-client-info, apikey, content-type, x-user-id",
        ));
    }
}

#[post("/scrape", data = "<request>")]
pub async fn scrape(
    request: Json<serde_json::Value>,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<JobCreated>, ApiError> {
    handlers::scrape_handler(request, user, processor).await
}

#[get("/jobs")]
pub async fn list_jobs(
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<Vec<JobSummary>>>, ApiError> {
    handlers::list_jobs_handler(user, processor).await
}

#[get("/jobs/<id>")]
pub async fn job_detail(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<JobDetail>>, ApiError> {
    handlers::job_detail_handler(id, user, processor).await
}

#[get("/jobs/<id>/leads")]
pub async fn job_leads(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<DataResponse<Vec<LeadRecord>>>, ApiError> {
    handlers::job_leads_handler(id, user, processor).await
}

#[get("/jobs/<id>/export")]
pub async fn export_job(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<CsvResponse, ApiError> {
    handlers::export_job_handler(id, user, processor).await
}

#[delete("/jobs/<id>")]
pub async fn delete_job(
    id: &str,
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<ActionResponse>, ApiError> {
    handlers::delete_job_handler(id, user, processor).await
}

#[get("/health")]
pub async fn health(
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<TextResponse>, ApiError> {
    handlers::health_handler(user, processor).await
}

#[options("/<_..>")]
pub async fn options() -> Status {
    Status::Ok
}

// Error catchers
#[rocket::catch(400)]
pub fn bad_request() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Invalid request format".to_string(),
        "BAD_REQUEST".to_string(),
        vec![
            "Check your request JSON format".to_string(),
            "Verify all required fields are present".to_string(),
        ],
    ))
}

#[rocket::catch(404)]
pub fn not_found() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Resource not found".to_string(),
        "NOT_FOUND".to_string(),
        vec!["Check the request path".to_string()],
    ))
}

#[rocket::catch(422)]
pub fn unprocessable() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Request body does not match the expected shape".to_string(),
        "INVALID_BODY".to_string(),
        vec![
            "search_type must be company, name or company_pages".to_string(),
            "enrichment_provider must be contactout or rocketreach".to_string(),
        ],
    ))
}

#[rocket::catch(500)]
pub fn internal_error() -> Json<StandardErrorResponse> {
    Json(StandardErrorResponse::new(
        "Internal server error".to_string(),
        "INTERNAL_ERROR".to_string(),
        vec![
            "Try again in a few moments".to_string(),
            "Contact support if the problem persists".to_string(),
        ],
    ))
}

/// Assemble the API without launching it
pub fn build_rocket(rocket: Rocket<Build>, processor: JobProcessor) -> Rocket<Build> {
    rocket
        .attach(Cors)
        .manage(processor)
        .register(
            "/api",
            catchers![bad_request, not_found, unprocessable, internal_error],
        )
        .mount(
            "/api",
            routes![
                scrape,
                list_jobs,
                job_detail,
                job_leads,
                export_job,
                delete_job,
                health,
                options,
            ],
        )
}

// Main server start function
pub async fn start_web_server(config: ConfigManager) -> Result<()> {
    let db = Database::connect(&config.environment.database_path).await?;
    let vendors = Vendors::from_config(&config.vendors)?;
    let processor = JobProcessor::new(db, vendors);

    info!("Starting lead generator API server");
    info!("Environment: {}", config.environment_name);
    info!("Database: {}", config.environment.database_path.display());
    info!("Server: http://0.0.0.0:{}", config.environment.port);

    let figment = rocket::Config::figment()
        .merge(("address", "0.0.0.0"))
        .merge(("port", config.environment.port));

    let _rocket = build_rocket(rocket::custom(figment), processor)
        .launch()
        .await
        .context("Rocket server failed")?;

    Ok(())
}
