//! Claim statistics and the per-record allowance report.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{ClaimPeriod, ClaimStatus};
use crate::storage::{AttendanceFilter, ClaimFilter};

use super::MealAllowanceEngine;

/// Counts and sums over a set of claims.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ClaimStats {
    /// Claims considered.
    pub total_claims: u32,
    /// Awaiting review.
    pub pending_claims: u32,
    /// Approved, not yet paid.
    pub approved_claims: u32,
    /// Rejected.
    pub rejected_claims: u32,
    /// Paid.
    pub claimed_claims: u32,
    /// Sum of approved claims' amounts.
    pub total_amount: Decimal,
    /// Sum of paid claims' amounts.
    pub claimed_amount: Decimal,
}

/// One employee's line in the management report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeAllowance {
    /// The employee.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Records in the period.
    pub total_attendance: u32,
    /// Records flagged inside a geofence, checked out or not.
    pub valid_attendance: u32,
    /// `valid_attendance × per_record_rate`.
    pub allowance_amount: Decimal,
    /// Status of the employee's monthly claim, if one exists.
    pub claim_status: Option<ClaimStatus>,
    /// When that claim was made.
    pub claim_date: Option<DateTime<Utc>>,
}

/// Totals across the management report.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReportSummary {
    /// Employees listed.
    pub total_employees: u32,
    /// Sum of per-record allowances.
    pub total_allowance: Decimal,
    /// Employees with a claim for the period.
    pub claimed_count: u32,
    /// Employees without one.
    pub unclaimed_count: u32,
}

/// Per-record allowance for every employee over a period.
///
/// This is a separate figure from the monthly claim amount and never
/// feeds it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManagementReport {
    /// The reported month.
    pub period: ClaimPeriod,
    /// Rate paid per valid record.
    pub per_record_rate: Decimal,
    /// One line per employee, by name.
    pub employees: Vec<EmployeeAllowance>,
    /// Totals.
    pub summary: ReportSummary,
}

impl ClaimStats {
    fn record(&mut self, status: ClaimStatus, amount: Decimal) {
        self.total_claims += 1;
        match status {
            ClaimStatus::Pending => self.pending_claims += 1,
            ClaimStatus::Approved => {
                self.approved_claims += 1;
                self.total_amount += amount;
            }
            ClaimStatus::Rejected => self.rejected_claims += 1,
            ClaimStatus::Claimed => {
                self.claimed_claims += 1;
                self.claimed_amount += amount;
            }
        }
    }
}

impl MealAllowanceEngine {
    /// Status counts and amounts over the claims matching `filter`.
    pub fn claim_stats(&self, filter: &ClaimFilter) -> EngineResult<ClaimStats> {
        let mut stats = ClaimStats::default();
        for claim in self.claims.list(filter)? {
            stats.record(claim.status, claim.total_amount);
        }
        Ok(stats)
    }

    /// Per-record allowance for each employee over a period.
    pub fn management_report(&self, period: ClaimPeriod) -> EngineResult<ManagementReport> {
        let rate = self.settings.per_record_rate;
        let window = period.window(self.offset)?;

        let mut employees = Vec::new();
        let mut summary = ReportSummary::default();

        for user in self.users.list_staff()? {
            let records = self
                .attendance
                .list(&AttendanceFilter::for_user_in(user.id, window))?;
            let valid = records.iter().filter(|r| r.is_valid).count() as u32;
            let claim = self.claims.find_by_period(user.id, period)?;
            let allowance = Decimal::from(valid) * rate;

            summary.total_employees += 1;
            summary.total_allowance += allowance;
            if claim.is_some() {
                summary.claimed_count += 1;
            } else {
                summary.unclaimed_count += 1;
            }

            employees.push(EmployeeAllowance {
                user_id: user.id,
                name: user.name,
                email: user.email,
                total_attendance: records.len() as u32,
                valid_attendance: valid,
                allowance_amount: allowance,
                claim_status: claim.as_ref().map(|c| c.status),
                claim_date: claim.map(|c| c.claim_date),
            });
        }

        Ok(ManagementReport {
            period,
            per_record_rate: rate,
            employees,
            summary,
        })
    }
}
