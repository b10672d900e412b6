// src/web/handlers/system_handlers.rs
use crate::search::JobProcessor;
use crate::web::types::*;

use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::State;
use tracing::{error, info};

pub async fn health_handler(
    user: RequestUser,
    processor: &State<JobProcessor>,
) -> Result<Json<TextResponse>, ApiError> {
    match user.id() {
        Some(id) => info!("Health check by user: {}", id),
        None => info!("Health check by anonymous user"),
    }

    if let Err(e) = processor.database().health_check().await {
        error!("Health check failed: {}", e);
        return Err(StandardErrorResponse::new(
            "Database unavailable".to_string(),
            "DATABASE_ERROR".to_string(),
            vec!["Check DATABASE_PATH and disk space".to_string()],
        )
        .with_status(Status::ServiceUnavailable));
    }

    Ok(Json(TextResponse::success(
        "Lead generator API is running".to_string(),
    )))
}
