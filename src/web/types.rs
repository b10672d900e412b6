// src/web/types.rs

use rocket::http::{ContentType, Status};
use rocket::request::{FromRequest, Outcome};
use rocket::response::{self, status, Responder};
use rocket::serde::json::Json;
use rocket::serde::Serialize;
use rocket::{Request, Response};

use crate::core::database::{Job, JobStatus};
use crate::leads::LeadRecord;
use crate::search::CompanyRecord;
use crate::utils::non_empty_owned;

pub const USER_ID_HEADER: &str = "X-User-Id";

pub struct CsvResponse {
    pub data: String,
    pub filename: String,
}

impl CsvResponse {
    pub fn with_filename(data: String, filename: String) -> Self {
        Self { data, filename }
    }
}

impl<'r> Responder<'r, 'static> for CsvResponse {
    fn respond_to(self, _: &'r Request<'_>) -> response::Result<'static> {
        Response::build()
            .header(ContentType::CSV)
            .raw_header(
                "Content-Disposition",
                format!("attachment; filename=\"{}\"", self.filename),
            )
            .sized_body(self.data.len(), std::io::Cursor::new(self.data))
            .ok()
    }
}

/// Caller identity from the `X-User-Id` header. Absent or blank means anonymous.
pub struct RequestUser(pub Option<String>);

impl RequestUser {
    pub fn id(&self) -> Option<&str> {
        self.0.as_deref()
    }

    /// Anonymous callers see every job; identified callers only their own
    /// and unowned ones.
    pub fn can_see(&self, job: &Job) -> bool {
        match (self.id(), job.user_id.as_deref()) {
            (Some(caller), Some(owner)) => caller == owner,
            _ => true,
        }
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestUser {
    type Error = ();

    async fn from_request(req: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        Outcome::Success(RequestUser(non_empty_owned(
            req.headers().get_one(USER_ID_HEADER),
        )))
    }
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobCreated {
    pub success: bool,
    pub job_id: String,
    pub status: JobStatus,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct JobDetail {
    pub job: Job,
    pub leads: Vec<LeadRecord>,
    pub companies: Vec<CompanyRecord>,
}

// Standard response envelopes

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde", rename_all = "lowercase")]
pub enum ResponseType {
    Text,
    Data,
    Action,
    Error,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct TextResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct DataResponse<T> {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
#[serde(crate = "rocket::serde")]
pub struct ActionResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub message: String,
    pub action: String,
}

#[derive(Debug, Serialize)]
#[serde(crate = "rocket::serde")]
pub struct StandardErrorResponse {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
    pub success: bool,
    pub error: String,
    pub error_code: String,
    pub suggestions: Vec<String>,
}

/// Error body plus the HTTP status it is sent with
pub type ApiError = status::Custom<Json<StandardErrorResponse>>;

impl TextResponse {
    pub fn success(message: String) -> Self {
        Self {
            response_type: ResponseType::Text,
            success: true,
            message,
        }
    }
}

impl<T> DataResponse<T> {
    pub fn success(message: String, data: T) -> Self {
        Self {
            response_type: ResponseType::Data,
            success: true,
            message,
            data,
        }
    }
}

impl ActionResponse {
    pub fn success(message: String, action: String) -> Self {
        Self {
            response_type: ResponseType::Action,
            success: true,
            message,
            action,
        }
    }
}

impl StandardErrorResponse {
    pub fn new(error: String, error_code: String, suggestions: Vec<String>) -> Self {
        Self {
            response_type: ResponseType::Error,
            success: false,
            error,
            error_code,
            suggestions,
        }
    }

    pub fn with_status(self, status: Status) -> ApiError {
        status::Custom(status, Json(self))
    }
}
