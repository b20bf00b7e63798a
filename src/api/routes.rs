//! Route table.

use axum::{
    Router, middleware,
    routing::{get, post, put},
};

use super::handlers::{attendance, dashboard, locations, meal_allowance};
use super::middleware::track_request;
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/attendance/check-in", post(attendance::check_in))
        .route("/attendance/check-out", post(attendance::check_out))
        .route("/attendance/today", get(attendance::today))
        .route("/attendance/history", get(attendance::history))
        .route("/attendance/history/export", get(attendance::export_history))
        .route("/attendance/stats", get(attendance::stats))
        .route(
            "/attendance/:id",
            put(attendance::update).delete(attendance::delete),
        )
        .route("/locations", get(locations::list).post(locations::create))
        .route("/locations/nearby", get(locations::nearby))
        .route("/locations/validate", post(locations::validate))
        .route(
            "/locations/:id",
            get(locations::get)
                .put(locations::update)
                .delete(locations::delete),
        )
        .route("/meal-allowance/preview", get(meal_allowance::preview))
        .route("/meal-allowance/claim", post(meal_allowance::claim))
        .route("/meal-allowance/my", get(meal_allowance::my_claims))
        .route("/meal-allowance/all", get(meal_allowance::all_claims))
        .route(
            "/meal-allowance/policy",
            get(meal_allowance::policy).put(meal_allowance::update_policy),
        )
        .route("/meal-allowance/stats", get(meal_allowance::stats))
        .route("/meal-allowance/management", get(meal_allowance::management))
        .route(
            "/meal-allowance/direct-approve",
            post(meal_allowance::direct_approve),
        )
        .route("/meal-allowance/:id/approve", put(meal_allowance::approve))
        .route("/meal-allowance/:id/reject", put(meal_allowance::reject))
        .route("/meal-allowance/:id/claimed", put(meal_allowance::mark_claimed))
        .route("/dashboard/today", get(dashboard::today))
        .route("/dashboard/date", get(dashboard::date))
        .route("/dashboard/monthly", get(dashboard::monthly))
        .route("/dashboard/admin", get(dashboard::admin))
        .route("/dashboard/employee", get(dashboard::employee))
        .layer(middleware::from_fn_with_state(state.clone(), track_request))
        .with_state(state)
}
