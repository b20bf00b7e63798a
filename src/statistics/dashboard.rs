//! Organisation-wide daily and monthly dashboards.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::attendance::{DayStatus, WorkRules};
use crate::error::EngineResult;
use crate::meal_allowance::MealAllowanceEngine;
use crate::models::{AttendanceRecord, ClaimPeriod, Page, PageRequest, TimeWindow, User, local_date};
use crate::storage::{AttendanceFilter, AttendanceStore, Clock, UserDirectory};

use super::HistoryEntry;

/// Headline counts for one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    /// The local date.
    pub date: NaiveDate,
    /// Staff considered.
    pub total_employees: u32,
    /// Staff with a record.
    pub present: u32,
    /// Staff without one.
    pub absent: u32,
    /// Staff who checked in after work start.
    pub late: u32,
    /// Staff who have checked out.
    pub checked_out: u32,
}

/// One employee's day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeDayStatus {
    /// The employee.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Absent, checked in or checked out.
    pub status: DayStatus,
    /// Checked in after work start.
    pub is_late: bool,
    /// Check-in time.
    pub check_in_time: Option<DateTime<Utc>>,
    /// Check-out time.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Matched location address.
    pub address: Option<String>,
    /// Record notes.
    pub notes: Option<String>,
    /// Hours worked, zero until check-out.
    pub working_hours: Decimal,
}

/// The daily dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyDashboard {
    /// Counts.
    pub stats: DailyStats,
    /// Every staff member, by name.
    pub employees: Vec<EmployeeDayStatus>,
    /// The day's latest check-ins.
    pub recent_activity: Vec<HistoryEntry>,
}

/// One employee's month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeMonthStats {
    /// The employee.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// Days with a record.
    pub present_days: u32,
    /// Days checked in after work start.
    pub late_days: u32,
    /// Working days without a record.
    pub absent_days: u32,
    /// Monday-to-Friday days in the month.
    pub working_days: u32,
    /// Hours across all records.
    pub total_working_hours: Decimal,
    /// Hours per present day.
    pub average_working_hours: Decimal,
    /// `present_days / working_days × 100`.
    pub attendance_rate: Decimal,
}

/// Totals across every matching employee, not just the current page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySummary {
    /// Employees matching the search.
    pub total_employees: u32,
    /// Sum of present days.
    pub total_present_days: u32,
    /// Sum of late days.
    pub total_late_days: u32,
    /// Mean of the employees' attendance rates.
    pub average_attendance_rate: Decimal,
}

/// The monthly dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyDashboard {
    /// The month.
    pub period: ClaimPeriod,
    /// Monday-to-Friday days in the month.
    pub working_days: u32,
    /// Totals.
    pub summary: MonthlySummary,
    /// One page of employees, by name.
    pub employees: Page<EmployeeMonthStats>,
}

/// Organisation-wide rates for administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminOverview {
    /// Today's local date.
    pub date: NaiveDate,
    /// Staff considered.
    pub total_employees: u32,
    /// Staff with a record today.
    pub present_today: u32,
    /// Staff late today.
    pub late_today: u32,
    /// `present_today / total_employees × 100`.
    pub today_rate: Decimal,
    /// This month's mean attendance rate.
    pub monthly_rate: Decimal,
    /// Last month's mean attendance rate.
    pub previous_monthly_rate: Decimal,
    /// `monthly_rate − previous_monthly_rate`.
    pub trend: Decimal,
}

/// Read-only aggregation over attendance records.
///
/// Figures cover active non-administrator users only.
#[derive(Clone)]
pub struct StatisticsAggregator {
    pub(super) attendance: Arc<dyn AttendanceStore>,
    pub(super) users: Arc<dyn UserDirectory>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) rules: WorkRules,
    pub(super) meal_allowance: MealAllowanceEngine,
}

const RECENT_ACTIVITY_LIMIT: usize = 10;

impl StatisticsAggregator {
    /// Creates an aggregator.
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        users: Arc<dyn UserDirectory>,
        clock: Arc<dyn Clock>,
        rules: WorkRules,
        meal_allowance: MealAllowanceEngine,
    ) -> Self {
        Self {
            attendance,
            users,
            clock,
            rules,
            meal_allowance,
        }
    }

    /// The current local date.
    pub fn today(&self) -> NaiveDate {
        local_date(self.clock.now(), self.rules.offset)
    }

    /// Dashboard for today.
    pub fn daily_dashboard(&self) -> EngineResult<DailyDashboard> {
        self.date_dashboard(self.today())
    }

    /// Dashboard for any local date.
    pub fn date_dashboard(&self, date: NaiveDate) -> EngineResult<DailyDashboard> {
        let staff = self.users.list_staff()?;
        let records = self.records_in(None, TimeWindow::for_day(date, self.rules.offset))?;
        let by_user: HashMap<Uuid, &AttendanceRecord> =
            records.iter().map(|r| (r.user_id, r)).collect();

        let mut stats = DailyStats {
            date,
            total_employees: staff.len() as u32,
            present: 0,
            absent: 0,
            late: 0,
            checked_out: 0,
        };

        let employees: Vec<EmployeeDayStatus> = staff
            .iter()
            .map(|user| {
                let record = by_user.get(&user.id).copied();
                let status = DayStatus::of(record);
                let is_late = record.is_some_and(|r| self.rules.is_late(r.check_in_time));
                match status {
                    DayStatus::Absent => {}
                    DayStatus::CheckedIn => stats.present += 1,
                    DayStatus::CheckedOut => {
                        stats.present += 1;
                        stats.checked_out += 1;
                    }
                }
                if is_late {
                    stats.late += 1;
                }

                EmployeeDayStatus {
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    status,
                    is_late,
                    check_in_time: record.map(|r| r.check_in_time),
                    check_out_time: record.and_then(|r| r.check_out_time),
                    address: record.map(|r| r.address.clone()),
                    notes: record.map(|r| r.notes.clone()),
                    working_hours: record.map_or(Decimal::ZERO, AttendanceRecord::working_hours),
                }
            })
            .collect();
        stats.absent = stats.total_employees - stats.present;

        let staff_by_id: HashMap<Uuid, &User> = staff.iter().map(|u| (u.id, u)).collect();
        let recent_activity = records
            .iter()
            .filter_map(|r| staff_by_id.get(&r.user_id).map(|u| self.entry(r.clone(), Some(*u))))
            .take(RECENT_ACTIVITY_LIMIT)
            .collect();

        Ok(DailyDashboard {
            stats,
            employees,
            recent_activity,
        })
    }

    /// Per-employee figures for a month, searched by name or email and paged.
    pub fn monthly_dashboard(
        &self,
        period: ClaimPeriod,
        search: Option<&str>,
        page: PageRequest,
    ) -> EngineResult<MonthlyDashboard> {
        let working_days = period.working_days()?;
        let needle = search
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty());

        let staff: Vec<User> = self
            .users
            .list_staff()?
            .into_iter()
            .filter(|u| {
                needle.as_ref().is_none_or(|n| {
                    u.name.to_lowercase().contains(n) || u.email.to_lowercase().contains(n)
                })
            })
            .collect();

        let grouped = self.records_by_user(period.window(self.rules.offset)?)?;
        let rows: Vec<EmployeeMonthStats> = staff
            .iter()
            .map(|u| {
                let records = grouped.get(&u.id).map_or(&[][..], Vec::as_slice);
                self.month_stats(u, records, working_days)
            })
            .collect();

        let summary = MonthlySummary {
            total_employees: rows.len() as u32,
            total_present_days: rows.iter().map(|r| r.present_days).sum(),
            total_late_days: rows.iter().map(|r| r.late_days).sum(),
            average_attendance_rate: mean(rows.iter().map(|r| r.attendance_rate)),
        };

        Ok(MonthlyDashboard {
            period,
            working_days,
            summary,
            employees: page.paginate(rows),
        })
    }

    /// Today's rate, this and last month's mean rates, and the trend between them.
    pub fn admin_overview(&self) -> EngineResult<AdminOverview> {
        let today = self.date_dashboard(self.today())?;
        let this_month = ClaimPeriod::containing(today.stats.date);

        let monthly_rate = self.average_rate(this_month)?;
        let previous_monthly_rate = self.average_rate(this_month.previous()?)?;

        Ok(AdminOverview {
            date: today.stats.date,
            total_employees: today.stats.total_employees,
            present_today: today.stats.present,
            late_today: today.stats.late,
            today_rate: percentage(today.stats.present, today.stats.total_employees),
            monthly_rate,
            previous_monthly_rate,
            trend: monthly_rate - previous_monthly_rate,
        })
    }

    /// Month figures for one user from their records in that month.
    pub(super) fn month_stats(
        &self,
        user: &User,
        records: &[AttendanceRecord],
        working_days: u32,
    ) -> EmployeeMonthStats {
        let present_days = records.len() as u32;
        let late_days = records
            .iter()
            .filter(|r| self.rules.is_late(r.check_in_time))
            .count() as u32;
        let total_working_hours: Decimal = records.iter().map(AttendanceRecord::working_hours).sum();

        EmployeeMonthStats {
            user_id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            present_days,
            late_days,
            absent_days: working_days.saturating_sub(present_days),
            working_days,
            total_working_hours: total_working_hours.round_dp(2),
            average_working_hours: average(total_working_hours, present_days),
            attendance_rate: percentage(present_days, working_days),
        }
    }

    pub(super) fn records_in(
        &self,
        user_id: Option<Uuid>,
        window: TimeWindow,
    ) -> EngineResult<Vec<AttendanceRecord>> {
        self.attendance.list(&AttendanceFilter {
            user_id,
            window: Some(window),
        })
    }

    fn records_by_user(&self, window: TimeWindow) -> EngineResult<HashMap<Uuid, Vec<AttendanceRecord>>> {
        let mut grouped: HashMap<Uuid, Vec<AttendanceRecord>> = HashMap::new();
        for record in self.records_in(None, window)? {
            grouped.entry(record.user_id).or_default().push(record);
        }
        Ok(grouped)
    }

    fn average_rate(&self, period: ClaimPeriod) -> EngineResult<Decimal> {
        let working_days = period.working_days()?;
        let grouped = self.records_by_user(period.window(self.rules.offset)?)?;
        let staff = self.users.list_staff()?;
        Ok(mean(staff.iter().map(|u| {
            let present = grouped.get(&u.id).map_or(0, Vec::len) as u32;
            percentage(present, working_days)
        })))
    }
}

/// `part / whole × 100` to two places, zero for an empty whole.
pub(super) fn percentage(part: u32, whole: u32) -> Decimal {
    if whole == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(part) * Decimal::ONE_HUNDRED / Decimal::from(whole)).round_dp(2)
}

/// `total / count` to two places, zero for no items.
pub(super) fn average(total: Decimal, count: u32) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count)).round_dp(2)
}

fn mean(values: impl Iterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(s, c), v| (s + v, c + 1));
    average(sum, count)
}
