//! Monthly meal-allowance claims.
//!
//! A claim is keyed by user and month. Its amount is the number of valid
//! attendance days (checked out and inside a geofence) times the active
//! policy's daily rate, fixed when the claim is submitted. The separate
//! per-record allowance appears only in the [`ManagementReport`].

mod engine;
mod report;

pub use engine::{AttendanceCount, ClaimPreview, DirectApproval, MealAllowanceEngine, PolicyUpdate};
pub use report::{ClaimStats, EmployeeAllowance, ManagementReport, ReportSummary};
