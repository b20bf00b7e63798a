//! Eligibility counting, claim submission and the approval workflow.

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::{AppConfig, ClaimRules, MealAllowanceConfig};
use crate::error::{EngineError, EngineResult};
use crate::models::{ClaimPeriod, ClaimStatus, MealAllowanceClaim, MealAllowancePolicy};
use crate::storage::{
    AttendanceFilter, AttendanceStore, ClaimFilter, ClaimStore, Clock, PolicyStore, UserDirectory,
};

/// Attendance counts for one user and month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AttendanceCount {
    /// Records checked in during the month.
    pub total_days: u32,
    /// Records that are checked out and inside a geofence.
    pub valid_days: u32,
}

/// Read-only projection of what a claim for a period would look like.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimPreview {
    /// Claim month.
    pub month: u32,
    /// Claim year.
    pub year: i32,
    /// Records checked in during the month.
    pub total_days: u32,
    /// Valid records.
    pub valid_days: u32,
    /// Active policy rate.
    pub amount_per_day: Decimal,
    /// `valid_days × amount_per_day`.
    pub total_amount: Decimal,
    /// No claim exists and there is at least one valid day.
    pub can_claim: bool,
    /// A claim already occupies the period.
    pub already_claimed: bool,
    /// Status of the occupying claim.
    pub claim_status: Option<ClaimStatus>,
}

/// New values for the active policy.
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyUpdate {
    /// Allowance per valid day.
    pub amount_per_day: Decimal,
    /// Minimum qualifying hours.
    pub min_working_hours: Decimal,
    /// Maximum claims per month.
    pub max_claims_per_month: u32,
}

/// An administrator-created claim with an explicit amount.
#[derive(Debug, Clone, Deserialize)]
pub struct DirectApproval {
    /// The claimant.
    pub user_id: Uuid,
    /// Claim month.
    pub month: u32,
    /// Claim year.
    pub year: i32,
    /// Amount paid, overriding the computed snapshot.
    pub amount: Decimal,
    /// Free-text notes.
    #[serde(default)]
    pub notes: String,
}

/// Computes eligibility and drives claims through their lifecycle.
///
/// One claim may exist per user and month. The slot stays occupied whatever
/// the claim's status, so a rejected claim still blocks resubmission.
#[derive(Clone)]
pub struct MealAllowanceEngine {
    pub(super) attendance: Arc<dyn AttendanceStore>,
    pub(super) claims: Arc<dyn ClaimStore>,
    policies: Arc<dyn PolicyStore>,
    pub(super) users: Arc<dyn UserDirectory>,
    clock: Arc<dyn Clock>,
    pub(super) offset: FixedOffset,
    rules: ClaimRules,
    pub(super) settings: MealAllowanceConfig,
}

impl MealAllowanceEngine {
    /// Creates an engine over the given stores.
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        claims: Arc<dyn ClaimStore>,
        policies: Arc<dyn PolicyStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        config: &AppConfig,
    ) -> Self {
        Self {
            attendance,
            claims,
            policies,
            users,
            clock,
            offset: config.engine().offset(),
            rules: config.engine().claims.clone(),
            settings: config.meal_allowance().clone(),
        }
    }

    /// Validates a month and year against the accepted claim range.
    pub fn period(&self, month: u32, year: i32) -> EngineResult<ClaimPeriod> {
        ClaimPeriod::within_years(month, year, self.rules.min_year, self.rules.max_year)
    }

    /// Counts a user's records for a period.
    pub fn count_attendance(&self, user_id: Uuid, period: ClaimPeriod) -> EngineResult<AttendanceCount> {
        let records = self
            .attendance
            .list(&AttendanceFilter::for_user_in(user_id, period.window(self.offset)?))?;

        Ok(AttendanceCount {
            total_days: records.len() as u32,
            valid_days: records.iter().filter(|r| r.counts_as_valid()).count() as u32,
        })
    }

    /// True if no claim occupies the period, whatever its status.
    ///
    /// Eligibility is not considered: a user with no valid days can still
    /// claim here, and [`submit_claim`](Self::submit_claim) rejects it.
    pub fn can_claim(&self, user_id: Uuid, period: ClaimPeriod) -> EngineResult<bool> {
        Ok(self.claims.find_by_period(user_id, period)?.is_none())
    }

    /// Combines counts, the active policy and any existing claim.
    pub fn preview(&self, user_id: Uuid, month: u32, year: i32) -> EngineResult<ClaimPreview> {
        let period = self.period(month, year)?;
        let policy = self.policy()?;
        let count = self.count_attendance(user_id, period)?;
        let existing = self.claims.find_by_period(user_id, period)?;

        Ok(ClaimPreview {
            month,
            year,
            total_days: count.total_days,
            valid_days: count.valid_days,
            amount_per_day: policy.amount_per_day,
            total_amount: Decimal::from(count.valid_days) * policy.amount_per_day,
            can_claim: existing.is_none() && count.valid_days > 0,
            already_claimed: existing.is_some(),
            claim_status: existing.map(|c| c.status),
        })
    }

    /// The active policy, or the configured default when none is stored.
    pub fn policy(&self) -> EngineResult<MealAllowancePolicy> {
        match self.policies.active_policy()? {
            Some(policy) => Ok(policy),
            None => {
                let defaults = &self.settings.default_policy;
                let now = self.clock.now();
                Ok(MealAllowancePolicy {
                    id: Uuid::nil(),
                    amount_per_day: defaults.amount_per_day,
                    min_working_hours: defaults.min_working_hours,
                    max_claims_per_month: defaults.max_claims_per_month,
                    is_active: true,
                    created_at: now,
                    updated_at: now,
                })
            }
        }
    }

    /// Replaces the active policy's values. Existing claims keep their snapshot.
    pub fn update_policy(&self, update: PolicyUpdate) -> EngineResult<MealAllowancePolicy> {
        let now = self.clock.now();
        let mut policy = match self.policies.active_policy()? {
            Some(policy) => policy,
            None => MealAllowancePolicy {
                id: Uuid::new_v4(),
                amount_per_day: Decimal::ZERO,
                min_working_hours: Decimal::ZERO,
                max_claims_per_month: 0,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        };
        policy.amount_per_day = update.amount_per_day;
        policy.min_working_hours = update.min_working_hours;
        policy.max_claims_per_month = update.max_claims_per_month;
        policy.updated_at = now;
        policy.validate()?;

        self.policies.save_policy(&policy)?;
        info!(
            policy_id = %policy.id,
            amount_per_day = %policy.amount_per_day,
            "Meal allowance policy updated"
        );
        Ok(policy)
    }

    /// Submits a pending claim for a period.
    ///
    /// The amount is `valid_days × amount_per_day` at submission and is
    /// never recomputed.
    pub fn submit_claim(
        &self,
        user_id: Uuid,
        month: u32,
        year: i32,
        notes: impl Into<String>,
    ) -> EngineResult<MealAllowanceClaim> {
        let period = self.period(month, year)?;
        if !self.can_claim(user_id, period)? {
            warn!(user_id = %user_id, %period, "Claim rejected, period already claimed");
            return Err(EngineError::AlreadyClaimed { month, year });
        }

        let policy = self.policy()?;
        let count = self.count_attendance(user_id, period)?;
        if count.valid_days == 0 {
            warn!(user_id = %user_id, %period, "Claim rejected, no valid attendance");
            return Err(EngineError::NoEligibleDays { month, year });
        }

        let now = self.clock.now();
        let claim = MealAllowanceClaim {
            id: Uuid::new_v4(),
            user_id,
            month,
            year,
            total_attendance: count.total_days,
            valid_attendance: count.valid_days,
            amount_per_day: policy.amount_per_day,
            total_amount: Decimal::from(count.valid_days) * policy.amount_per_day,
            status: ClaimStatus::Pending,
            claim_date: now,
            approved_by: None,
            approved_at: None,
            claimed_at: None,
            rejection_reason: None,
            notes: notes.into(),
            created_at: now,
            updated_at: now,
        };

        self.claims
            .insert_unique(claim.clone())
            .map_err(|err| match err {
                EngineError::UniqueViolation { .. } => EngineError::AlreadyClaimed { month, year },
                other => other,
            })?;

        info!(
            user_id = %user_id,
            claim_id = %claim.id,
            %period,
            valid_days = count.valid_days,
            total_amount = %claim.total_amount,
            "Meal allowance claim submitted"
        );
        Ok(claim)
    }

    /// Fetches a claim.
    pub fn get_claim(&self, id: Uuid) -> EngineResult<MealAllowanceClaim> {
        self.claims.get(id)?.ok_or(EngineError::ClaimNotFound { id })
    }

    /// Approves a pending claim.
    pub fn approve(&self, claim_id: Uuid, approver: Uuid) -> EngineResult<MealAllowanceClaim> {
        let now = self.clock.now();
        let claim = self.transition(claim_id, ClaimStatus::Approved, |claim| {
            claim.approved_by = Some(approver);
            claim.approved_at = Some(now);
        })?;
        info!(claim_id = %claim_id, approver = %approver, "Meal allowance claim approved");
        Ok(claim)
    }

    /// Rejects a pending claim. The claim keeps its period slot.
    pub fn reject(&self, claim_id: Uuid, reason: impl Into<String>) -> EngineResult<MealAllowanceClaim> {
        let reason = reason.into();
        let claim = self.transition(claim_id, ClaimStatus::Rejected, |claim| {
            claim.rejection_reason = Some(reason);
        })?;
        info!(claim_id = %claim_id, "Meal allowance claim rejected");
        Ok(claim)
    }

    /// Marks an approved claim as paid.
    pub fn mark_claimed(&self, claim_id: Uuid) -> EngineResult<MealAllowanceClaim> {
        let now = self.clock.now();
        let claim = self.transition(claim_id, ClaimStatus::Claimed, |claim| {
            claim.claimed_at = Some(now);
        })?;
        info!(claim_id = %claim_id, "Meal allowance claim marked as claimed");
        Ok(claim)
    }

    /// Creates a claim already in the `claimed` state with an explicit amount.
    ///
    /// The existence check and the insert are one store operation, so two
    /// concurrent calls for a period cannot both succeed.
    pub fn direct_approve(
        &self,
        request: DirectApproval,
        approver: Uuid,
    ) -> EngineResult<MealAllowanceClaim> {
        let DirectApproval {
            user_id,
            month,
            year,
            amount,
            notes,
        } = request;

        self.period(month, year)?;
        if amount <= Decimal::ZERO {
            return Err(EngineError::InvalidAmount);
        }
        if self.users.find_user(user_id)?.is_none() {
            return Err(EngineError::UserNotFound { id: user_id });
        }

        let now = self.clock.now();
        let claim = MealAllowanceClaim {
            id: Uuid::new_v4(),
            user_id,
            month,
            year,
            total_attendance: 0,
            valid_attendance: 0,
            amount_per_day: Decimal::ZERO,
            total_amount: amount,
            status: ClaimStatus::Claimed,
            claim_date: now,
            approved_by: Some(approver),
            approved_at: Some(now),
            claimed_at: Some(now),
            rejection_reason: None,
            notes,
            created_at: now,
            updated_at: now,
        };

        self.claims
            .insert_unique(claim.clone())
            .map_err(|err| match err {
                EngineError::UniqueViolation { .. } => {
                    warn!(user_id = %user_id, month, year, "Direct approval rejected, claim exists");
                    EngineError::DuplicateClaim { month, year }
                }
                other => other,
            })?;

        info!(
            user_id = %user_id,
            claim_id = %claim.id,
            approver = %approver,
            total_amount = %amount,
            "Meal allowance claim created and approved"
        );
        Ok(claim)
    }

    /// Claims matching the filter, newest first.
    pub fn list_claims(&self, filter: &ClaimFilter) -> EngineResult<Vec<MealAllowanceClaim>> {
        self.claims.list(filter)
    }

    /// Moves the claim to `next` and applies `change`, atomically with
    /// respect to other transitions. The move must be allowed by
    /// [`ClaimStatus::can_transition_to`].
    fn transition(
        &self,
        claim_id: Uuid,
        next: ClaimStatus,
        change: impl FnOnce(&mut MealAllowanceClaim),
    ) -> EngineResult<MealAllowanceClaim> {
        let mut claim = self.get_claim(claim_id)?;
        let current = claim.status;
        if !current.can_transition_to(next) {
            return Err(self.wrong_status(&claim, next));
        }

        change(&mut claim);
        claim.status = next;
        claim.updated_at = self.clock.now();

        if self.claims.replace_if_status(&claim, current)? {
            return Ok(claim);
        }

        // Lost a race: report the state that won.
        let winner = self.get_claim(claim_id)?;
        Err(self.wrong_status(&winner, next))
    }

    fn wrong_status(&self, claim: &MealAllowanceClaim, next: ClaimStatus) -> EngineError {
        warn!(
            claim_id = %claim.id,
            status = %claim.status,
            next = %next,
            "Claim transition rejected"
        );
        match next {
            ClaimStatus::Claimed => EngineError::NotApproved {
                claim_id: claim.id,
                status: claim.status,
            },
            _ => EngineError::AlreadyProcessed {
                claim_id: claim.id,
                status: claim.status,
            },
        }
    }
}
