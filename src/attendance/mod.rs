//! Attendance record lifecycle.
//!
//! [`AttendanceService`] creates a record at check-in, completes it once at
//! check-out, and offers the administrative correction and delete paths.
//! [`WorkRules`] derives lateness and history status from a record.

mod service;
mod timing;

pub use service::{AttendanceService, CheckIn, CheckOut, PhotoUpload, TodayAttendance};
pub use timing::{DayStatus, HistoryStatus, WorkRules, working_hours};
