//! HTTP API module for the attendance engine.
//!
//! A thin axum layer over the engines. Caller identity arrives in headers
//! set by the authentication gateway; administrator-only routes answer 403
//! to everyone else.

mod caller;
mod handlers;
mod middleware;
mod request;
mod response;
mod routes;
mod state;

pub use caller::{Caller, USER_ID_HEADER, USER_ROLE_HEADER};
pub use middleware::AUDIT_PATH_PREFIX;
pub use response::{ApiError, ApiErrorResponse, ApiResponse, ApiResult, PageMeta};
pub use routes::create_router;
pub use state::{AppState, Stores};
