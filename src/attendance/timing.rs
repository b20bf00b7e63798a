//! Working-hours and lateness rules.
//!
//! Records are stored in UTC; these rules read them in the configured local
//! offset.

use chrono::{DateTime, FixedOffset, NaiveTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::AttendanceRecord;

/// Classification of a record in history views and exports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryStatus {
    /// On time and a full day worked.
    Present,
    /// Checked in after work start, full day worked.
    Late,
    /// Not checked out, or fewer than the full-day hours.
    Incomplete,
}

impl HistoryStatus {
    /// The wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Present => "present",
            HistoryStatus::Late => "late",
            HistoryStatus::Incomplete => "incomplete",
        }
    }
}

impl std::fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HistoryStatus {
    type Err = crate::error::EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(HistoryStatus::Present),
            "late" => Ok(HistoryStatus::Late),
            "incomplete" => Ok(HistoryStatus::Incomplete),
            other => Err(crate::error::EngineError::InvalidRequest {
                message: format!("Unknown attendance status '{}'", other),
            }),
        }
    }
}

/// Where a user stands for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    /// No record.
    Absent,
    /// Checked in, not yet out.
    CheckedIn,
    /// Checked in and out.
    CheckedOut,
}

impl DayStatus {
    /// Status implied by the day's record, if any.
    pub fn of(record: Option<&AttendanceRecord>) -> Self {
        match record {
            None => DayStatus::Absent,
            Some(r) if r.is_checked_out() => DayStatus::CheckedOut,
            Some(_) => DayStatus::CheckedIn,
        }
    }
}

/// Office-hour rules in a local offset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkRules {
    /// Local offset for time-of-day comparisons.
    pub offset: FixedOffset,
    /// Work-start threshold.
    pub work_start: NaiveTime,
    /// Hours below which a day is incomplete.
    pub full_day_hours: Decimal,
}

impl WorkRules {
    /// Rules from the engine configuration.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            offset: config.offset(),
            work_start: config.work_start(),
            full_day_hours: config.work_schedule.full_day_hours,
        }
    }

    /// True if `check_in` is after the work-start threshold on its local day.
    ///
    /// Compared at minute resolution: 09:00:59 is on time for a 09:00 start.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::attendance::WorkRules;
    /// use attendance_engine::config::EngineConfig;
    /// use chrono::{TimeZone, Utc};
    ///
    /// let rules = WorkRules::from_config(&EngineConfig::default());
    /// // 02:01 UTC is 09:01 in Jakarta
    /// assert!(rules.is_late(Utc.with_ymd_and_hms(2025, 6, 2, 2, 1, 0).unwrap()));
    /// assert!(!rules.is_late(Utc.with_ymd_and_hms(2025, 6, 2, 1, 59, 0).unwrap()));
    /// ```
    pub fn is_late(&self, check_in: DateTime<Utc>) -> bool {
        let local = check_in.with_timezone(&self.offset);
        (local.hour(), local.minute()) > (self.work_start.hour(), self.work_start.minute())
    }

    /// True if the record has no check-out or fewer than the full-day hours.
    pub fn is_incomplete(&self, record: &AttendanceRecord) -> bool {
        !record.is_checked_out() || record.working_hours() < self.full_day_hours
    }

    /// History classification. Incomplete takes priority over late.
    pub fn history_status(&self, record: &AttendanceRecord) -> HistoryStatus {
        if self.is_incomplete(record) {
            HistoryStatus::Incomplete
        } else if self.is_late(record.check_in_time) {
            HistoryStatus::Late
        } else {
            HistoryStatus::Present
        }
    }
}

impl Default for WorkRules {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

/// Hours between check-in and check-out, zero while checked in.
pub fn working_hours(record: &AttendanceRecord) -> Decimal {
    record.working_hours()
}
