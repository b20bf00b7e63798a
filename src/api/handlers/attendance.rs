//! Handlers under `/attendance`.

use axum::{
    Json,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::header,
    response::{IntoResponse, Response},
};
use uuid::Uuid;

use crate::attendance::{CheckIn, CheckOut, TodayAttendance};
use crate::models::{AttendanceRecord, AttendanceUpdate};
use crate::statistics::{HistoryEntry, PeriodStats};

use crate::api::caller::Caller;
use crate::api::request::{AttendanceForm, HistoryParams, MonthParams, json_body, path_id, query_params};
use crate::api::response::{ApiError, ApiErrorResponse, ApiResponse, ApiResult};
use crate::api::state::AppState;

/// `POST /attendance/check-in` with a multipart form of `latitude`,
/// `longitude`, `photo` and optional `notes`.
pub async fn check_in(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<AttendanceRecord> {
    let multipart = multipart.map_err(|rejection| {
        ApiErrorResponse::bad_request(ApiError::validation_error(rejection.body_text()))
    })?;
    let form = AttendanceForm::read(multipart).await?;
    let coordinate = form.coordinate()?;

    let record = state.attendance().check_in(CheckIn {
        user_id: caller.user_id,
        coordinate,
        photo: form.photo,
        notes: form.notes,
    })?;

    let message = if record.is_valid {
        "Check-in successful"
    } else {
        "Check-in recorded outside approved locations"
    };
    Ok(ApiResponse::ok(message, record))
}

/// `POST /attendance/check-out`, optionally with a multipart `photo`.
pub async fn check_out(
    State(state): State<AppState>,
    caller: Caller,
    multipart: Option<Multipart>,
) -> ApiResult<AttendanceRecord> {
    let photo = match multipart {
        Some(multipart) => AttendanceForm::read(multipart).await?.photo,
        None => None,
    };
    let record = state.attendance().check_out(CheckOut {
        user_id: caller.user_id,
        photo,
    })?;
    Ok(ApiResponse::ok("Check-out successful", record))
}

/// `GET /attendance/today`.
pub async fn today(State(state): State<AppState>, caller: Caller) -> ApiResult<TodayAttendance> {
    let today = state.attendance().today(caller.user_id)?;
    Ok(ApiResponse::ok("Today's attendance", today))
}

/// `GET /attendance/history`. Employees only see their own records.
pub async fn history(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Vec<HistoryEntry>> {
    let params = query_params(params)?;
    let page = state
        .statistics()
        .history(&params.query(&caller), params.page_request())?;
    Ok(ApiResponse::page("Attendance history", page))
}

/// `GET /attendance/history/export` as a CSV attachment.
pub async fn export_history(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Response, ApiErrorResponse> {
    let params = query_params(params)?;
    let csv = state.statistics().export_csv(&params.query(&caller))?;
    let disposition = format!(
        "attachment; filename=\"attendance_history_{}.csv\"",
        state.today().format("%Y-%m-%d")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

/// `GET /attendance/stats?month=YYYY-MM`. Administrators may pass `user_id`
/// or omit it for everyone.
pub async fn stats(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<MonthParams>, QueryRejection>,
) -> ApiResult<PeriodStats> {
    let params = query_params(params)?;
    let period = params.period(state.today())?;
    let stats = state
        .statistics()
        .period_stats(caller.scope(params.user_id), period)?;
    Ok(ApiResponse::ok("Attendance statistics", stats))
}

/// `PUT /attendance/{id}` (admin).
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AttendanceUpdate>, JsonRejection>,
) -> ApiResult<AttendanceRecord> {
    caller.require_admin()?;
    let id = path_id(id)?;
    let changes = json_body(payload)?;
    let record = state.attendance().update(id, changes)?;
    Ok(ApiResponse::ok("Attendance updated", record))
}

/// `DELETE /attendance/{id}` (admin).
pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    caller.require_admin()?;
    state.attendance().delete(path_id(id)?)?;
    Ok(ApiResponse::done("Attendance deleted"))
}
