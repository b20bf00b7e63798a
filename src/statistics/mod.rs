//! Read-side attendance statistics.
//!
//! [`StatisticsAggregator`] never writes. It groups records by the local day
//! or month, derives lateness and history status through
//! [`WorkRules`](crate::attendance::WorkRules), and reports over active
//! non-administrator users.

mod dashboard;
mod employee;
mod history;

pub use dashboard::{
    AdminOverview, DailyDashboard, DailyStats, EmployeeDayStatus, EmployeeMonthStats,
    MonthlyDashboard, MonthlySummary, StatisticsAggregator,
};
pub use employee::{AllowanceSummary, EmployeeDashboard};
pub use history::{CSV_HEADER, HistoryEntry, HistoryQuery, PeriodStats};
