//! Handlers under `/locations`.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use uuid::Uuid;

use crate::geo::{LocationUpdate, LocationValidation, NearbyLocation, NewLocation};
use crate::models::{Coordinate, Location};

use crate::api::caller::Caller;
use crate::api::request::{
    LocationListParams, NearbyParams, PointRequest, json_body, path_id, query_params,
};
use crate::api::response::{ApiErrorResponse, ApiResponse, ApiResult};
use crate::api::state::AppState;

/// `GET /locations`, filtered by `type` and `is_active`.
pub async fn list(
    State(state): State<AppState>,
    _caller: Caller,
    params: Result<Query<LocationListParams>, QueryRejection>,
) -> ApiResult<Vec<Location>> {
    let params = query_params(params)?;
    let locations = state.locations().list(&params.filter())?;
    Ok(ApiResponse::page(
        "Locations",
        params.page_request().paginate(locations),
    ))
}

/// `POST /locations` (admin).
pub async fn create(
    State(state): State<AppState>,
    caller: Caller,
    payload: Result<Json<NewLocation>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Location>>), ApiErrorResponse> {
    caller.require_admin()?;
    let input = json_body(payload)?;
    let location = state.locations().create(input, Some(caller.user_id))?;
    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Location created", location),
    ))
}

/// `GET /locations/{id}`.
pub async fn get(
    State(state): State<AppState>,
    _caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Location> {
    let location = state.locations().get(path_id(id)?)?;
    Ok(ApiResponse::ok("Location", location))
}

/// `PUT /locations/{id}` (admin).
pub async fn update(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<LocationUpdate>, JsonRejection>,
) -> ApiResult<Location> {
    caller.require_admin()?;
    let id = path_id(id)?;
    let changes = json_body(payload)?;
    let location = state.locations().update(id, changes)?;
    Ok(ApiResponse::ok("Location updated", location))
}

/// `DELETE /locations/{id}` (admin).
pub async fn delete(
    State(state): State<AppState>,
    caller: Caller,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<()> {
    caller.require_admin()?;
    state.locations().delete(path_id(id)?)?;
    Ok(ApiResponse::done("Location deleted"))
}

/// `GET /locations/nearby?latitude=&longitude=&radius=`.
pub async fn nearby(
    State(state): State<AppState>,
    _caller: Caller,
    params: Result<Query<NearbyParams>, QueryRejection>,
) -> ApiResult<Vec<NearbyLocation>> {
    let params = query_params(params)?;
    let point = Coordinate::new(params.latitude, params.longitude);
    let locations = state.locations().nearby(point, params.radius)?;
    Ok(ApiResponse::ok("Nearby locations", locations))
}

/// `POST /locations/validate`.
pub async fn validate(
    State(state): State<AppState>,
    _caller: Caller,
    payload: Result<Json<PointRequest>, JsonRejection>,
) -> ApiResult<LocationValidation> {
    let point = json_body(payload)?.coordinate();
    let result = state.locations().validate(point)?;
    let message = result.message.clone();
    Ok(ApiResponse::ok(message, result))
}
