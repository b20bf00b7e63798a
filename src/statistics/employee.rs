//! The signed-in employee's own dashboard.

use chrono::Duration;
use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::attendance::{DayStatus, TodayAttendance};
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, ClaimPeriod, ClaimStatus, TimeWindow};
use crate::storage::ClaimFilter;

use super::{EmployeeMonthStats, HistoryEntry, StatisticsAggregator};

/// Meal allowance for the current month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllowanceSummary {
    /// The month.
    pub period: ClaimPeriod,
    /// Valid attendance days so far.
    pub attendance_count: u32,
    /// `attendance_count × amount_per_day`.
    pub total_amount: Decimal,
    /// Amount of the month's claim, if any.
    pub used_amount: Decimal,
    /// What is left to claim, never negative.
    pub remaining_amount: Decimal,
    /// No claim yet and at least one valid day.
    pub can_claim: bool,
    /// Status of the month's claim. `None` means not claimed.
    pub claim_status: Option<ClaimStatus>,
}

/// Everything an employee sees on their home screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDashboard {
    /// Today's attendance.
    pub today: TodayAttendance,
    /// This month's allowance.
    pub meal_allowance: AllowanceSummary,
    /// This month's attendance figures.
    pub monthly: EmployeeMonthStats,
    /// The last seven days, newest first.
    pub recent_activity: Vec<HistoryEntry>,
}

const RECENT_DAYS: i64 = 7;

impl StatisticsAggregator {
    /// Builds the dashboard for one employee.
    pub fn employee_dashboard(&self, user_id: Uuid) -> EngineResult<EmployeeDashboard> {
        let user = self
            .users
            .find_user(user_id)?
            .ok_or(EngineError::UserNotFound { id: user_id })?;

        let today = self.today();
        let offset = self.rules.offset;
        let period = ClaimPeriod::containing(today);

        let record = self
            .records_in(Some(user_id), TimeWindow::for_day(today, offset))?
            .into_iter()
            .next();
        let today_status = TodayAttendance {
            date: today,
            checked_in: record.is_some(),
            checked_out: record.as_ref().is_some_and(AttendanceRecord::is_checked_out),
            status: DayStatus::of(record.as_ref()),
            is_late: record
                .as_ref()
                .is_some_and(|r| self.rules.is_late(r.check_in_time)),
            working_hours: record
                .as_ref()
                .map_or(Decimal::ZERO, AttendanceRecord::working_hours),
            record,
        };

        let month_records = self.records_in(Some(user_id), period.window(offset)?)?;
        let monthly = self.month_stats(&user, &month_records, period.working_days()?);

        let meal_allowance = self.allowance_summary(user_id, period)?;

        let recent = TimeWindow::for_days(today - Duration::days(RECENT_DAYS - 1), today, offset);
        let recent_activity = self
            .records_in(Some(user_id), recent)?
            .into_iter()
            .map(|r| self.entry(r, Some(&user)))
            .collect();

        Ok(EmployeeDashboard {
            today: today_status,
            meal_allowance,
            monthly,
            recent_activity,
        })
    }

    fn allowance_summary(&self, user_id: Uuid, period: ClaimPeriod) -> EngineResult<AllowanceSummary> {
        let engine = &self.meal_allowance;
        let count = engine.count_attendance(user_id, period)?;
        let policy = engine.policy()?;
        let claim = engine
            .list_claims(&ClaimFilter {
                user_id: Some(user_id),
                month: Some(period.month),
                year: Some(period.year),
                ..Default::default()
            })?
            .into_iter()
            .next();

        let total_amount = Decimal::from(count.valid_days) * policy.amount_per_day;
        let used_amount = claim.as_ref().map_or(Decimal::ZERO, |c| c.total_amount);

        Ok(AllowanceSummary {
            period,
            attendance_count: count.valid_days,
            total_amount,
            used_amount,
            remaining_amount: (total_amount - used_amount).max(Decimal::ZERO),
            can_claim: claim.is_none() && count.valid_days > 0,
            claim_status: claim.map(|c| c.status),
        })
    }
}
