//! User directory entries.
//!
//! Users are owned by the external identity service; the engine only reads
//! them to label reports and to exclude administrators from staff figures.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrators manage locations and claims and are excluded from staff figures.
    Admin,
    /// Regular staff.
    Employee,
}

impl std::str::FromStr for Role {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "employee" => Ok(Role::Employee),
            other => Err(crate::error::EngineError::InvalidRequest {
                message: format!("Unknown role '{}'", other),
            }),
        }
    }
}

/// A user as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Role.
    pub role: Role,
    /// Inactive users are left out of reports.
    pub is_active: bool,
}

impl User {
    /// Returns true for administrators.
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing_is_case_insensitive() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("employee".parse::<Role>().unwrap(), Role::Employee);
        assert!("manager".parse::<Role>().is_err());
    }

    #[test]
    fn test_is_admin() {
        let user = User {
            id: Uuid::new_v4(),
            name: "Siti".to_string(),
            email: "siti@example.com".to_string(),
            role: Role::Admin,
            is_active: true,
        };
        assert!(user.is_admin());
    }
}
