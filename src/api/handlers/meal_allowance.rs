//! Handlers under `/meal-allowance`.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::meal_allowance::{ClaimPreview, ClaimStats, DirectApproval, ManagementReport, PolicyUpdate};
use crate::models::{MealAllowanceClaim, MealAllowancePolicy};

use crate::api::caller::Caller;
use crate::api::request::{
    ClaimListParams, ClaimRequest, PeriodParams, RejectRequest, json_body, path_id, query_params,
};
use crate::api::response::{ApiErrorResponse, ApiResponse, ApiResult};
use crate::api::state::AppState;

type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiErrorResponse>;

/// `GET /meal-allowance/preview?month=&year=` for the caller.
pub async fn preview(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> ApiResult<ClaimPreview> {
    let (month, year) = query_params(params)?.resolve(state.today());
    let preview = state.meal_allowance().preview(caller.user_id, month, year)?;
    Ok(ApiResponse::ok("Meal allowance preview", preview))
}

/// `POST /meal-allowance/claim` for the caller.
pub async fn claim(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<ClaimRequest>, JsonRejection>,
) -> Created<MealAllowanceClaim> {
    let request = json_body(payload)?;
    let claim = state.meal_allowance().submit_claim(
        caller.user_id,
        request.month,
        request.year,
        request.notes,
    )?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Meal allowance claim submitted", claim),
    ))
}

/// `GET /meal-allowance/my`.
pub async fn my_claims(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ClaimListParams>, QueryRejection>,
) -> ApiResult<Vec<MealAllowanceClaim>> {
    let params = query_params(params)?;
    let claims = state
        .meal_allowance()
        .list_claims(&params.filter(Some(caller.user_id)))?;
    Ok(ApiResponse::page(
        "Meal allowance claims",
        params.page_request().paginate(claims),
    ))
}

/// `GET /meal-allowance/all` (admin).
pub async fn all_claims(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ClaimListParams>, QueryRejection>,
) -> ApiResult<Vec<MealAllowanceClaim>> {
    caller.require_admin()?;
    let params = query_params(params)?;
    let claims = state
        .meal_allowance()
        .list_claims(&params.filter(params.user_id))?;
    Ok(ApiResponse::page(
        "Meal allowance claims",
        params.page_request().paginate(claims),
    ))
}

/// `GET /meal-allowance/policy`.
pub async fn policy(State(state): State<AppState>, _caller: Caller) -> ApiResult<MealAllowancePolicy> {
    let policy = state.meal_allowance().policy()?;
    Ok(ApiResponse::ok("Meal allowance policy", policy))
}

/// `PUT /meal-allowance/policy` (admin).
pub async fn update_policy(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<PolicyUpdate>, JsonRejection>,
) -> ApiResult<MealAllowancePolicy> {
    caller.require_admin()?;
    let update = json_body(payload)?;
    let policy = state.meal_allowance().update_policy(update)?;
    Ok(ApiResponse::ok("Meal allowance policy updated", policy))
}

/// `GET /meal-allowance/stats` (admin), filtered like the claim listing.
pub async fn stats(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<ClaimListParams>, QueryRejection>,
) -> ApiResult<ClaimStats> {
    caller.require_admin()?;
    let params = query_params(params)?;
    let stats = state
        .meal_allowance()
        .claim_stats(&params.filter(params.user_id))?;
    Ok(ApiResponse::ok("Meal allowance statistics", stats))
}

/// `GET /meal-allowance/management?month=&year=` (admin).
pub async fn management(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<PeriodParams>, QueryRejection>,
) -> ApiResult<ManagementReport> {
    caller.require_admin()?;
    let (month, year) = query_params(params)?.resolve(state.today());
    let engine = state.meal_allowance();
    let report = engine.management_report(engine.period(month, year)?)?;
    Ok(ApiResponse::ok("Meal allowance management report", report))
}

/// `POST /meal-allowance/direct-approve` (admin).
pub async fn direct_approve(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<DirectApproval>, JsonRejection>,
) -> Created<MealAllowanceClaim> {
    caller.require_admin()?;
    let request = json_body(payload)?;
    let claim = state
        .meal_allowance()
        .direct_approve(request, caller.user_id)?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Meal allowance claim approved", claim),
    ))
}

/// `PUT /meal-allowance/{id}/approve` (admin).
pub async fn approve(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<MealAllowanceClaim> {
    caller.require_admin()?;
    let claim = state.meal_allowance().approve(path_id(id)?, caller.user_id)?;
    Ok(ApiResponse::ok("Meal allowance claim approved", claim))
}

/// `PUT /meal-allowance/{id}/reject` (admin).
pub async fn reject(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<RejectRequest>, JsonRejection>,
) -> ApiResult<MealAllowanceClaim> {
    caller.require_admin()?;
    let id = path_id(id)?;
    let request = json_body(payload)?;
    let claim = state.meal_allowance().reject(id, request.reason)?;
    Ok(ApiResponse::ok("Meal allowance claim rejected", claim))
}

/// `PUT /meal-allowance/{id}/claimed` (admin).
pub async fn mark_claimed(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<MealAllowanceClaim> {
    caller.require_admin()?;
    let claim = state.meal_allowance().mark_claimed(path_id(id)?)?;
    Ok(ApiResponse::ok("Meal allowance marked as claimed", claim))
}
