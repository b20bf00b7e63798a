//! Caller identity forwarded by the authentication gateway.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{HeaderMap, request::Parts},
};
use uuid::Uuid;

use crate::models::Role;

use super::response::ApiErrorResponse;

/// Header carrying the authenticated user's id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// The authenticated user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    /// The user's id.
    pub user_id: Uuid,
    /// The user's role.
    pub role: Role,
}

impl Caller {
    /// Reads the identity headers. `None` if either is missing or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok());
        let user_id = header(USER_ID_HEADER)?.trim().parse().ok()?;
        let role = header(USER_ROLE_HEADER)?.trim().parse().ok()?;
        Some(Self { user_id, role })
    }

    /// Returns true for administrators.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with 403 unless the caller is an administrator.
    pub fn require_admin(&self) -> Result<(), ApiErrorResponse> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiErrorResponse::forbidden())
        }
    }

    /// The user a self-service query should cover. Administrators may name
    /// anyone or nobody; everyone else only sees themselves.
    pub fn scope(&self, requested: Option<Uuid>) -> Option<Uuid> {
        if self.is_admin() {
            requested
        } else {
            Some(self.user_id)
        }
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Caller::from_headers(&parts.headers).ok_or_else(|| {
            ApiErrorResponse::unauthorized(format!(
                "Missing or invalid {} / {} headers",
                USER_ID_HEADER, USER_ROLE_HEADER
            ))
        })
    }
}
