//! Response types for the attendance API.
//!
//! Every body is wrapped in the `{success, message, data?, error?}`
//! envelope. Listings add a `meta` block describing the page.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{EngineError, ErrorKind};
use crate::models::Page;

/// What handlers return.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiErrorResponse>;

/// Pagination details of a listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    /// One-based page number.
    pub page: u32,
    /// Page size.
    pub limit: u32,
    /// Items across all pages.
    pub total: usize,
    /// Number of pages.
    pub total_pages: u32,
}

/// The success envelope.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    /// Always true.
    pub success: bool,
    /// Human-readable summary.
    pub message: String,
    /// The payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Present on paginated listings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wraps a payload.
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
            meta: None,
        })
    }
}

impl<T: Serialize> ApiResponse<Vec<T>> {
    /// Wraps one page of a listing.
    pub fn page(message: impl Into<String>, page: Page<T>) -> Json<Self> {
        let meta = PageMeta {
            page: page.page,
            limit: page.limit,
            total: page.total,
            total_pages: page.total_pages(),
        };
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(page.items),
            meta: Some(meta),
        })
    }
}

impl ApiResponse<()> {
    /// An envelope without a payload.
    pub fn done(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
            meta: None,
        })
    }
}

/// API error structure carried in the envelope's `error` field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a validation error.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    /// Creates a malformed body error.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    success: bool,
    message: &'a str,
    error: &'a ApiError,
}

/// API error with HTTP status code.
#[derive(Debug)]
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl ApiErrorResponse {
    /// A 400 with a validation error.
    pub fn bad_request(error: ApiError) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error,
        }
    }

    /// The caller sent no usable identity.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            error: ApiError::new("UNAUTHORIZED", message),
        }
    }

    /// The caller lacks the role for the route.
    pub fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            error: ApiError::new("FORBIDDEN", "Administrator access required"),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let body = ErrorEnvelope {
            success: false,
            message: &self.error.message,
            error: &self.error,
        };
        (self.status, Json(body)).into_response()
    }
}

fn error_code(error: &EngineError) -> &'static str {
    match error {
        EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
            "CONFIG_ERROR"
        }
        EngineError::InvalidCoordinate { .. } => "INVALID_COORDINATE",
        EngineError::InvalidPeriod { .. } => "INVALID_PERIOD",
        EngineError::InvalidPolicy { .. } => "INVALID_POLICY",
        EngineError::InvalidLocation { .. } => "INVALID_LOCATION",
        EngineError::InvalidAmount => "INVALID_AMOUNT",
        EngineError::InvalidRequest { .. } => "VALIDATION_ERROR",
        EngineError::PhotoRequired => "PHOTO_REQUIRED",
        EngineError::InvalidPhotoFormat { .. } => "INVALID_PHOTO_FORMAT",
        EngineError::NoEligibleDays { .. } => "NO_ELIGIBLE_DAYS",
        EngineError::AlreadyCheckedIn { .. } => "ALREADY_CHECKED_IN",
        EngineError::AlreadyClaimed { .. } => "ALREADY_CLAIMED",
        EngineError::DuplicateClaim { .. } => "DUPLICATE_CLAIM",
        EngineError::AlreadyProcessed { .. } => "ALREADY_PROCESSED",
        EngineError::NoActiveCheckIn => "NO_ACTIVE_CHECK_IN",
        EngineError::NotApproved { .. } => "NOT_APPROVED",
        EngineError::AttendanceNotFound { .. } => "ATTENDANCE_NOT_FOUND",
        EngineError::ClaimNotFound { .. } => "CLAIM_NOT_FOUND",
        EngineError::UserNotFound { .. } => "USER_NOT_FOUND",
        EngineError::LocationNotFound { .. } => "LOCATION_NOT_FOUND",
        EngineError::UniqueViolation { .. } | EngineError::Storage { .. } => "INTERNAL_ERROR",
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let code = error_code(&error);
        let (status, error) = match error.kind() {
            ErrorKind::Validation => (StatusCode::BAD_REQUEST, ApiError::new(code, error.to_string())),
            ErrorKind::Conflict => (StatusCode::CONFLICT, ApiError::new(code, error.to_string())),
            ErrorKind::NotFound => (StatusCode::NOT_FOUND, ApiError::new(code, error.to_string())),
            ErrorKind::State => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ApiError::new(code, error.to_string()),
            ),
            ErrorKind::Storage | ErrorKind::Configuration => {
                warn!(error = %error, "Request failed with an internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::new(code, "Internal server error"),
                )
            }
        };
        ApiErrorResponse { status, error }
    }
}
