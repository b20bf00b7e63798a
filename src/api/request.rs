//! Request types for the attendance API.
//!
//! Query strings and JSON bodies are parsed into the structs below. Parse
//! failures become 400 responses in the shared error envelope instead of
//! axum's plain-text rejections.

use axum::{
    Json,
    extract::{
        Multipart, Path, Query,
        multipart::MultipartError,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::attendance::{HistoryStatus, PhotoUpload};
use crate::error::EngineError;
use crate::models::{ClaimPeriod, ClaimStatus, Coordinate, LocationType, PageRequest};
use crate::statistics::HistoryQuery;
use crate::storage::{ClaimFilter, LocationFilter};

use super::caller::Caller;
use super::response::{ApiError, ApiErrorResponse};

/// Unwraps a JSON body, mapping rejections to 400.
pub fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiErrorResponse> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(rejection) => {
            let error = match rejection {
                JsonRejection::JsonDataError(err) => {
                    let body_text = err.body_text();
                    warn!(error = %body_text, "JSON data error");
                    if body_text.contains("missing field") {
                        ApiError::validation_error(body_text)
                    } else {
                        ApiError::malformed_json(body_text)
                    }
                }
                JsonRejection::JsonSyntaxError(err) => {
                    warn!(error = %err, "JSON syntax error");
                    ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
                }
                JsonRejection::MissingJsonContentType(_) => {
                    ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
                }
                _ => ApiError::malformed_json("Failed to parse request body"),
            };
            Err(ApiErrorResponse::bad_request(error))
        }
    }
}

/// Unwraps a query string, mapping rejections to 400.
pub fn query_params<T>(params: Result<Query<T>, QueryRejection>) -> Result<T, ApiErrorResponse> {
    params.map(|Query(p)| p).map_err(|rejection| {
        let body_text = rejection.body_text();
        warn!(error = %body_text, "Invalid query string");
        ApiErrorResponse::bad_request(ApiError::with_details(
            "INVALID_QUERY",
            "Invalid query parameters",
            body_text,
        ))
    })
}

/// Unwraps an id path segment, mapping rejections to 400.
pub fn path_id(path: Result<Path<Uuid>, PathRejection>) -> Result<Uuid, ApiErrorResponse> {
    path.map(|Path(id)| id).map_err(|rejection| {
        ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "Invalid id: {}",
            rejection.body_text()
        )))
    })
}

/// Filters for `/attendance/history` and its CSV export.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HistoryParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Only this user; ignored for non-administrators.
    pub user_id: Option<Uuid>,
    /// Only this local date.
    pub date: Option<NaiveDate>,
    /// Only this month (1-12).
    pub month: Option<u32>,
    /// Only this year.
    pub year: Option<i32>,
    /// Only this derived status.
    pub status: Option<HistoryStatus>,
}

impl HistoryParams {
    /// Clamped page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    /// The history filter as seen by `caller`.
    pub fn query(&self, caller: &Caller) -> HistoryQuery {
        HistoryQuery {
            user_id: caller.scope(self.user_id),
            date: self.date,
            month: self.month,
            year: self.year,
            status: self.status,
        }
    }
}

/// A `YYYY-MM` month, defaulting to the current one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthParams {
    /// Month as `YYYY-MM`.
    pub month: Option<String>,
    /// Only this user; ignored for non-administrators.
    pub user_id: Option<Uuid>,
}

impl MonthParams {
    /// The requested month, or the one containing `today`.
    pub fn period(&self, today: NaiveDate) -> Result<ClaimPeriod, EngineError> {
        parse_month(self.month.as_deref(), today)
    }
}

/// Query for `/dashboard/monthly`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MonthlyDashboardParams {
    /// Month as `YYYY-MM`.
    pub month: Option<String>,
    /// Name or email fragment.
    pub search: Option<String>,
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
}

impl MonthlyDashboardParams {
    /// The requested month, or the one containing `today`.
    pub fn period(&self, today: NaiveDate) -> Result<ClaimPeriod, EngineError> {
        parse_month(self.month.as_deref(), today)
    }

    /// Clamped page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

fn parse_month(month: Option<&str>, today: NaiveDate) -> Result<ClaimPeriod, EngineError> {
    match month.map(str::trim).filter(|m| !m.is_empty()) {
        Some(month) => ClaimPeriod::parse(month),
        None => Ok(ClaimPeriod::containing(today)),
    }
}

/// Query for `/dashboard/date`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DateParams {
    /// Local date, defaulting to today.
    pub date: Option<NaiveDate>,
}

/// Numeric `month` and `year`, defaulting to the current month.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodParams {
    /// Month (1-12).
    pub month: Option<u32>,
    /// Year.
    pub year: Option<i32>,
}

impl PeriodParams {
    /// Fills unset parts from `today`.
    pub fn resolve(&self, today: NaiveDate) -> (u32, i32) {
        let current = ClaimPeriod::containing(today);
        (
            self.month.unwrap_or(current.month),
            self.year.unwrap_or(current.year),
        )
    }
}

/// Filters for claim listings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimListParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Only claims in this status.
    pub status: Option<ClaimStatus>,
    /// Only this month.
    pub month: Option<u32>,
    /// Only this year.
    pub year: Option<i32>,
    /// Only this user.
    pub user_id: Option<Uuid>,
}

impl ClaimListParams {
    /// Clamped page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    /// The claim filter, restricted to `user_id` when given.
    pub fn filter(&self, user_id: Option<Uuid>) -> ClaimFilter {
        ClaimFilter {
            user_id,
            status: self.status,
            month: self.month,
            year: self.year,
        }
    }
}

/// Body of `POST /meal-allowance/claim`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClaimRequest {
    /// Claim month.
    pub month: u32,
    /// Claim year.
    pub year: i32,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

/// Body of `PUT /meal-allowance/{id}/reject`.
#[derive(Debug, Clone, Deserialize)]
pub struct RejectRequest {
    /// Why the claim was rejected.
    pub reason: String,
}

/// Filters for `GET /locations`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocationListParams {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size.
    pub limit: Option<u32>,
    /// Only this type.
    #[serde(rename = "type")]
    pub location_type: Option<LocationType>,
    /// Only this active flag.
    pub is_active: Option<bool>,
}

impl LocationListParams {
    /// Clamped page request.
    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }

    /// The store filter.
    pub fn filter(&self) -> LocationFilter {
        LocationFilter {
            location_type: self.location_type,
            is_active: self.is_active,
        }
    }
}

/// Query for `GET /locations/nearby`.
#[derive(Debug, Clone, Deserialize)]
pub struct NearbyParams {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Search radius in meters.
    pub radius: Option<f64>,
}

/// Body of `POST /locations/validate`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointRequest {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl PointRequest {
    /// The point as a coordinate.
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Multipart fields of a check-in or check-out.
#[derive(Debug, Default)]
pub struct AttendanceForm {
    /// `latitude` field.
    pub latitude: Option<f64>,
    /// `longitude` field.
    pub longitude: Option<f64>,
    /// `notes` field.
    pub notes: String,
    /// `photo` file.
    pub photo: Option<PhotoUpload>,
}

fn multipart_error(err: MultipartError) -> ApiErrorResponse {
    warn!(error = %err, "Malformed multipart body");
    ApiErrorResponse::bad_request(ApiError::with_details(
        "MALFORMED_MULTIPART",
        "Failed to read form data",
        err.body_text(),
    ))
}

fn parse_number(field: &str, value: &str) -> Result<f64, ApiErrorResponse> {
    value.trim().parse().map_err(|_| {
        ApiErrorResponse::bad_request(ApiError::validation_error(format!(
            "Invalid {}: '{}'",
            field, value
        )))
    })
}

impl AttendanceForm {
    /// Reads every field of the form. Unknown fields are skipped.
    pub async fn read(mut multipart: Multipart) -> Result<Self, ApiErrorResponse> {
        let mut form = AttendanceForm::default();
        while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "photo" => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let content = field.bytes().await.map_err(multipart_error)?;
                    form.photo = Some(PhotoUpload {
                        file_name,
                        content: content.to_vec(),
                    });
                }
                "latitude" => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.latitude = Some(parse_number("latitude", &text)?);
                }
                "longitude" => {
                    let text = field.text().await.map_err(multipart_error)?;
                    form.longitude = Some(parse_number("longitude", &text)?);
                }
                "notes" => {
                    form.notes = field.text().await.map_err(multipart_error)?;
                }
                _ => {}
            }
        }
        Ok(form)
    }

    /// The submitted position. Both fields are required.
    pub fn coordinate(&self) -> Result<Coordinate, ApiErrorResponse> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Ok(Coordinate::new(latitude, longitude)),
            _ => Err(ApiErrorResponse::bad_request(ApiError::validation_error(
                "latitude and longitude are required",
            ))),
        }
    }
}
