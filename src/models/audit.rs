//! Audit log entry model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One audited request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Unique identifier.
    pub id: Uuid,
    /// The acting user.
    pub user_id: Uuid,
    /// What was done, e.g. the HTTP method.
    pub action: String,
    /// What it was done to, e.g. the request path.
    pub resource: String,
    /// Peer address, if known.
    pub ip_address: Option<String>,
    /// Client user agent, if sent.
    pub user_agent: Option<String>,
    /// When the entry was recorded.
    pub created_at: DateTime<Utc>,
}

impl AuditEntry {
    /// Creates an entry stamped with a fresh id.
    pub fn new(
        user_id: Uuid,
        action: impl Into<String>,
        resource: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            action: action.into(),
            resource: resource.into(),
            ip_address: None,
            user_agent: None,
            created_at,
        }
    }
}
