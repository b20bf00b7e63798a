//! Handlers under `/dashboard`.

use axum::extract::{Query, State, rejection::QueryRejection};

use crate::statistics::{AdminOverview, DailyDashboard, EmployeeDashboard, MonthlyDashboard};

use crate::api::caller::Caller;
use crate::api::request::{DateParams, MonthlyDashboardParams, query_params};
use crate::api::response::{ApiResponse, ApiResult};
use crate::api::state::AppState;

/// `GET /dashboard/today` (admin).
pub async fn today(State(state): State<AppState>, caller: Caller) -> ApiResult<DailyDashboard> {
    caller.require_admin()?;
    let dashboard = state.statistics().daily_dashboard()?;
    Ok(ApiResponse::ok("Daily dashboard", dashboard))
}

/// `GET /dashboard/date?date=YYYY-MM-DD` (admin).
pub async fn date(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<DateParams>, QueryRejection>,
) -> ApiResult<DailyDashboard> {
    caller.require_admin()?;
    let date = query_params(params)?.date.unwrap_or_else(|| state.today());
    let dashboard = state.statistics().date_dashboard(date)?;
    Ok(ApiResponse::ok("Daily dashboard", dashboard))
}

/// `GET /dashboard/monthly?month=YYYY-MM&search=&page=&limit=` (admin).
pub async fn monthly(
    State(state): State<AppState>,
    caller: Caller,
    params: Result<Query<MonthlyDashboardParams>, QueryRejection>,
) -> ApiResult<MonthlyDashboard> {
    caller.require_admin()?;
    let params = query_params(params)?;
    let period = params.period(state.today())?;
    let dashboard = state.statistics().monthly_dashboard(
        period,
        params.search.as_deref(),
        params.page_request(),
    )?;
    Ok(ApiResponse::ok("Monthly dashboard", dashboard))
}

/// `GET /dashboard/admin` (admin).
pub async fn admin(State(state): State<AppState>, caller: Caller) -> ApiResult<AdminOverview> {
    caller.require_admin()?;
    let overview = state.statistics().admin_overview()?;
    Ok(ApiResponse::ok("Admin overview", overview))
}

/// `GET /dashboard/employee` for the caller.
pub async fn employee(State(state): State<AppState>, caller: Caller) -> ApiResult<EmployeeDashboard> {
    let dashboard = state.statistics().employee_dashboard(caller.user_id)?;
    Ok(ApiResponse::ok("Employee dashboard", dashboard))
}
