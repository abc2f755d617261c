use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::Error as SqlxError;
use std::collections::HashMap;
use thiserror::Error as ThisError;
use tracing::error;

#[derive(Debug, ThisError)]
pub enum ForgeError {
    #[error("Not enough credits for a portrait")]
    InsufficientCredit,

    #[error("Generation failed: {0}")]
    GenerationFailed(String),

    #[error("Invalid or expired sign-in code: {0}")]
    InvalidSession(String),

    #[error("Invalid selection: {0}")]
    InvalidSelection(String),

    #[error("Invalid email address")]
    InvalidEmail,

    #[error("Too many requests; retry in {0} secs")]
    RateLimited(u64),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(&'static str),

    #[error("Unsupported media: {0}")]
    UnsupportedMedia(String),

    #[error("Unprocessable payload: {0}")]
    Unprocessable(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    DatabaseError(#[from] SqlxError),
}

impl From<reqwest::Error> for ForgeError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            "timeout"
        } else if e.is_connect() {
            "connect"
        } else if e.is_decode() {
            "decode"
        } else {
            "request"
        };
        ForgeError::GenerationFailed(format!("upstream {kind} error: {e}"))
    }
}

impl From<OpenAiError> for ForgeError {
    fn from(e: OpenAiError) -> Self {
        let kind = e.error.kind.as_deref().unwrap_or("unknown");
        ForgeError::GenerationFailed(format!("upstream {kind}: {}", e.error.message))
    }
}

impl IntoResponse for ForgeError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message) = match &self {
            ForgeError::InsufficientCredit => (
                StatusCode::PAYMENT_REQUIRED,
                "INSUFFICIENT_CREDIT",
                "You have no credits remaining. Top up to generate another portrait.".to_string(),
            ),
            ForgeError::GenerationFailed(detail) => {
                error!(detail = %detail, "generation failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "GENERATION_FAILED",
                    "The villain generator is unavailable right now. Please try again.".to_string(),
                )
            }
            ForgeError::InvalidSession(reason) => (
                StatusCode::UNAUTHORIZED,
                "INVALID_SESSION",
                format!("{reason} Please request a new code."),
            ),
            ForgeError::InvalidSelection(reason) => {
                (StatusCode::BAD_REQUEST, "INVALID_SELECTION", reason.clone())
            }
            ForgeError::InvalidEmail => (
                StatusCode::BAD_REQUEST,
                "INVALID_EMAIL",
                self.to_string(),
            ),
            ForgeError::RateLimited(_) => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMIT",
                self.to_string(),
            ),
            ForgeError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Sign in required.".to_string(),
            ),
            ForgeError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{what} not found."),
            ),
            ForgeError::UnsupportedMedia(reason) => (
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                "UNSUPPORTED_MEDIA",
                reason.clone(),
            ),
            ForgeError::Unprocessable(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "UNPROCESSABLE",
                reason.clone(),
            ),
            ForgeError::Json(_) | ForgeError::UrlParse(_) | ForgeError::DatabaseError(_) => {
                error!(error = %self, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                )
            }
        };
        let body = ApiErrorBody {
            code: code.to_string(),
            message,
        };
        (status, Json(ApiErrorResponse { error: body })).into_response()
    }
}

/// Standardized API error response body
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// OpenAI-style error response structure
#[derive(Deserialize, Debug)]
pub struct OpenAiError {
    pub error: OpenAiErrorBody,
}

#[derive(Deserialize, Debug)]
pub struct OpenAiErrorBody {
    pub message: String,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub code: Option<Value>,
    #[serde(flatten)]
    pub extra: HashMap<String, Value>,
}

impl OpenAiError {
    /// Quota exhaustion is reported as 429 with `insufficient_quota`.
    pub fn is_quota(&self) -> bool {
        self.error.kind.as_deref() == Some("insufficient_quota")
            || self.error.code.as_ref().and_then(Value::as_str) == Some("insufficient_quota")
    }
}
