//! Calendar periods and time windows.
//!
//! Attendance is stored as UTC instants but grouped by the calendar day or
//! month of the configured local offset. These helpers turn a local date or
//! month into the half-open UTC window that covers it.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// A half-open `[start, end)` range of UTC instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Inclusive start.
    pub start: DateTime<Utc>,
    /// Exclusive end.
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Returns true if the instant falls inside the window.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    /// The window covering one local calendar day.
    pub fn for_day(date: NaiveDate, offset: FixedOffset) -> Self {
        let start = local_midnight(date, offset);
        Self {
            start,
            end: after_days(start, 1),
        }
    }

    /// The window covering every local day in `[first, last]`.
    pub fn for_days(first: NaiveDate, last: NaiveDate, offset: FixedOffset) -> Self {
        Self {
            start: local_midnight(first, offset),
            end: after_days(local_midnight(last, offset), 1),
        }
    }
}

fn after_days(instant: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    instant
        .checked_add_signed(Duration::days(days))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn local_midnight(date: NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let naive = date.and_time(NaiveTime::MIN);
    offset
        .from_local_datetime(&naive)
        .single()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// The local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, offset: FixedOffset) -> NaiveDate {
    instant.with_timezone(&offset).date_naive()
}

/// A calendar month, the unit meal-allowance claims are computed against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClaimPeriod {
    /// Month, 1 through 12.
    pub month: u32,
    /// Four-digit year.
    pub year: i32,
}

impl ClaimPeriod {
    /// Builds a period, rejecting an out-of-range month or a month whose
    /// days cannot be represented.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::ClaimPeriod;
    ///
    /// assert!(ClaimPeriod::new(6, 2025).is_ok());
    /// assert!(ClaimPeriod::new(13, 2025).is_err());
    /// assert!(ClaimPeriod::new(12, i32::MAX).is_err());
    /// ```
    pub fn new(month: u32, year: i32) -> EngineResult<Self> {
        let period = Self { month, year };
        period.bounds()?;
        Ok(period)
    }

    /// Builds a period and also checks the year against an accepted range.
    pub fn within_years(month: u32, year: i32, min_year: i32, max_year: i32) -> EngineResult<Self> {
        if !(min_year..=max_year).contains(&year) {
            return Err(EngineError::InvalidPeriod { month, year });
        }
        Self::new(month, year)
    }

    /// The period containing a local date.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    /// Parses a `YYYY-MM` string.
    pub fn parse(value: &str) -> EngineResult<Self> {
        let invalid = || EngineError::InvalidRequest {
            message: format!("Invalid month format '{}'. Use YYYY-MM", value),
        };
        let (year, month) = value.split_once('-').ok_or_else(invalid)?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(month, year)
    }

    fn invalid(&self) -> EngineError {
        EngineError::InvalidPeriod {
            month: self.month,
            year: self.year,
        }
    }

    /// First day of this month and first day of the following month.
    fn bounds(&self) -> EngineResult<(NaiveDate, NaiveDate)> {
        if !(1..=12).contains(&self.month) {
            return Err(self.invalid());
        }
        let (next_month, next_year) = if self.month == 12 {
            (1, self.year.checked_add(1).ok_or_else(|| self.invalid())?)
        } else {
            (self.month + 1, self.year)
        };
        let first = NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| self.invalid())?;
        let following =
            NaiveDate::from_ymd_opt(next_year, next_month, 1).ok_or_else(|| self.invalid())?;
        Ok((first, following))
    }

    /// The first day of the month.
    pub fn first_day(&self) -> EngineResult<NaiveDate> {
        Ok(self.bounds()?.0)
    }

    /// The last day of the month.
    pub fn last_day(&self) -> EngineResult<NaiveDate> {
        self.bounds()?.1.pred_opt().ok_or_else(|| self.invalid())
    }

    /// The following month.
    pub fn next(&self) -> EngineResult<Self> {
        if self.month == 12 {
            let year = self.year.checked_add(1).ok_or_else(|| self.invalid())?;
            Self::new(1, year)
        } else {
            Self::new(self.month + 1, self.year)
        }
    }

    /// The preceding month.
    pub fn previous(&self) -> EngineResult<Self> {
        if self.month == 1 {
            let year = self.year.checked_sub(1).ok_or_else(|| self.invalid())?;
            Self::new(12, year)
        } else {
            Self::new(self.month - 1, self.year)
        }
    }

    /// The UTC window covering the month in the given offset.
    pub fn window(&self, offset: FixedOffset) -> EngineResult<TimeWindow> {
        let (first, following) = self.bounds()?;
        Ok(TimeWindow {
            start: local_midnight(first, offset),
            end: local_midnight(following, offset),
        })
    }

    /// Number of Monday-to-Friday days in the month. No holiday calendar applies.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::ClaimPeriod;
    ///
    /// // June 2025 starts on a Sunday and has 21 weekdays.
    /// assert_eq!(ClaimPeriod::new(6, 2025).unwrap().working_days().unwrap(), 21);
    /// ```
    pub fn working_days(&self) -> EngineResult<u32> {
        let (first, following) = self.bounds()?;
        Ok(first
            .iter_days()
            .take_while(|d| *d < following)
            .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
            .count() as u32)
    }
}

impl std::fmt::Display for ClaimPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
