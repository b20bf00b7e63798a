//! Meal-allowance policy and claim models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};

use super::ClaimPeriod;

/// The rules the meal-allowance engine applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAllowancePolicy {
    /// Unique identifier.
    pub id: Uuid,
    /// Allowance paid per valid attendance day.
    pub amount_per_day: Decimal,
    /// Minimum qualifying working hours.
    pub min_working_hours: Decimal,
    /// Maximum number of claims per month.
    pub max_claims_per_month: u32,
    /// Only the active policy is read by the engine.
    pub is_active: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl MealAllowancePolicy {
    /// Checks the policy's invariants.
    pub fn validate(&self) -> EngineResult<()> {
        if self.amount_per_day <= Decimal::ZERO {
            return Err(EngineError::InvalidPolicy {
                field: "amount_per_day",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.min_working_hours <= Decimal::ZERO {
            return Err(EngineError::InvalidPolicy {
                field: "min_working_hours",
                message: "must be greater than 0".to_string(),
            });
        }
        if self.max_claims_per_month < 1 {
            return Err(EngineError::InvalidPolicy {
                field: "max_claims_per_month",
                message: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

/// Lifecycle of a claim.
///
/// `pending → approved | rejected`, then `approved → claimed`.
/// No transition leads back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    /// Submitted and awaiting review.
    Pending,
    /// Accepted by an administrator.
    Approved,
    /// Declined by an administrator.
    Rejected,
    /// Paid out.
    Claimed,
}

impl ClaimStatus {
    /// Returns true if moving from `self` to `next` is permitted.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::ClaimStatus;
    ///
    /// assert!(ClaimStatus::Pending.can_transition_to(ClaimStatus::Approved));
    /// assert!(!ClaimStatus::Rejected.can_transition_to(ClaimStatus::Approved));
    /// ```
    pub fn can_transition_to(self, next: ClaimStatus) -> bool {
        matches!(
            (self, next),
            (ClaimStatus::Pending, ClaimStatus::Approved)
                | (ClaimStatus::Pending, ClaimStatus::Rejected)
                | (ClaimStatus::Approved, ClaimStatus::Claimed)
        )
    }

    /// The wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Approved => "approved",
            ClaimStatus::Rejected => "rejected",
            ClaimStatus::Claimed => "claimed",
        }
    }
}

impl std::fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ClaimStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "approved" => Ok(ClaimStatus::Approved),
            "rejected" => Ok(ClaimStatus::Rejected),
            "claimed" => Ok(ClaimStatus::Claimed),
            other => Err(EngineError::InvalidRequest {
                message: format!("Unknown claim status '{}'", other),
            }),
        }
    }
}

/// A monthly meal-allowance claim.
///
/// `total_amount` is fixed at submission from the snapshot of
/// `valid_attendance × amount_per_day` and never recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAllowanceClaim {
    /// Unique identifier.
    pub id: Uuid,
    /// The claimant.
    pub user_id: Uuid,
    /// Claim month.
    pub month: u32,
    /// Claim year.
    pub year: i32,
    /// Attendance records in the period at submission.
    pub total_attendance: u32,
    /// Valid attendance records in the period at submission.
    pub valid_attendance: u32,
    /// Policy rate at submission.
    pub amount_per_day: Decimal,
    /// Amount owed.
    pub total_amount: Decimal,
    /// Current lifecycle status.
    pub status: ClaimStatus,
    /// When the claim was made.
    pub claim_date: DateTime<Utc>,
    /// The approving administrator.
    pub approved_by: Option<Uuid>,
    /// When the claim was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the claim was marked as paid.
    pub claimed_at: Option<DateTime<Utc>>,
    /// Why the claim was rejected.
    pub rejection_reason: Option<String>,
    /// Free-text notes.
    pub notes: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl MealAllowanceClaim {
    /// The period this claim occupies.
    pub fn period(&self) -> ClaimPeriod {
        ClaimPeriod {
            month: self.month,
            year: self.year,
        }
    }
}
