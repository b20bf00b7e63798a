//! Attendance history, CSV export and period statistics.

use chrono::{Datelike, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

use crate::attendance::HistoryStatus;
use crate::error::{EngineError, EngineResult};
use crate::models::{AttendanceRecord, ClaimPeriod, Page, PageRequest, TimeWindow, User};
use crate::storage::AttendanceFilter;

use super::StatisticsAggregator;
use super::dashboard::{average, percentage};

/// Header row of the CSV export.
pub const CSV_HEADER: &str = "Name,Email,Date,Check In,Check Out,Working Hours,Status,Notes";

/// Filters for history and export. Unset filters match everything.
///
/// `date` wins over `month`/`year`. A month without a year means the
/// current year; a year alone covers the whole year.
#[derive(Debug, Clone, Default)]
pub struct HistoryQuery {
    /// Only this user's records.
    pub user_id: Option<Uuid>,
    /// Only this local date.
    pub date: Option<NaiveDate>,
    /// Only this month.
    pub month: Option<u32>,
    /// Only this year.
    pub year: Option<i32>,
    /// Only records with this derived status.
    pub status: Option<HistoryStatus>,
}

/// A record with its owner and derived status.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    /// The record.
    #[serde(flatten)]
    pub record: AttendanceRecord,
    /// Owner's name, empty if unknown.
    pub user_name: String,
    /// Owner's email, empty if unknown.
    pub user_email: String,
    /// Present, late or incomplete.
    pub status: HistoryStatus,
    /// Checked in after work start.
    pub is_late: bool,
    /// Hours worked.
    pub working_hours: Decimal,
}

/// Day counts and hours over a month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodStats {
    /// The month.
    pub period: ClaimPeriod,
    /// Records in the month.
    pub total_days: u32,
    /// Complete and on time.
    pub present_days: u32,
    /// Complete and late.
    pub late_days: u32,
    /// Open, or shorter than a full day.
    pub incomplete_days: u32,
    /// Hours across all records.
    pub total_working_hours: Decimal,
    /// Hours per record.
    pub average_working_hours: Decimal,
    /// `(present_days + late_days) / total_days × 100`.
    pub attendance_rate: Decimal,
}

impl HistoryQuery {
    fn window(&self, today: NaiveDate, offset: FixedOffset) -> EngineResult<Option<TimeWindow>> {
        if let Some(date) = self.date {
            return Ok(Some(TimeWindow::for_day(date, offset)));
        }
        match (self.month, self.year) {
            (Some(month), year) => {
                let period = ClaimPeriod::new(month, year.unwrap_or_else(|| today.year()))?;
                Ok(Some(period.window(offset)?))
            }
            (None, Some(year)) => {
                let first = NaiveDate::from_ymd_opt(year, 1, 1);
                let last = NaiveDate::from_ymd_opt(year, 12, 31);
                match (first, last) {
                    (Some(first), Some(last)) => Ok(Some(TimeWindow::for_days(first, last, offset))),
                    _ => Err(EngineError::InvalidRequest {
                        message: format!("Invalid year {}", year),
                    }),
                }
            }
            (None, None) => Ok(None),
        }
    }
}

impl StatisticsAggregator {
    /// One page of history, newest first.
    pub fn history(&self, query: &HistoryQuery, page: PageRequest) -> EngineResult<Page<HistoryEntry>> {
        Ok(page.paginate(self.history_entries(query)?))
    }

    /// Every matching record as CSV, newest first.
    ///
    /// Times are local `HH:MM`, a missing check-out is `-`, and every data
    /// field is quoted.
    pub fn export_csv(&self, query: &HistoryQuery) -> EngineResult<String> {
        let offset = self.rules.offset;
        let mut writer = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .from_writer(Vec::new());

        for entry in self.history_entries(query)? {
            let check_in = entry.record.check_in_time.with_timezone(&offset);
            let date = check_in.format("%Y-%m-%d").to_string();
            let check_in = check_in.format("%H:%M").to_string();
            let check_out = entry
                .record
                .check_out_time
                .map(|t| t.with_timezone(&offset).format("%H:%M").to_string())
                .unwrap_or_else(|| "-".to_string());
            let hours = format!("{:.2}", entry.working_hours);

            writer
                .write_record([
                    entry.user_name.as_str(),
                    entry.user_email.as_str(),
                    date.as_str(),
                    check_in.as_str(),
                    check_out.as_str(),
                    hours.as_str(),
                    entry.status.as_str(),
                    entry.record.notes.as_str(),
                ])
                .map_err(|e| EngineError::storage(format!("CSV export failed: {}", e)))?;
        }

        let body = writer
            .into_inner()
            .map_err(|e| EngineError::storage(format!("CSV export failed: {}", e)))?;
        let body = String::from_utf8(body)
            .map_err(|e| EngineError::storage(format!("CSV export failed: {}", e)))?;

        Ok(format!("{}\n{}", CSV_HEADER, body))
    }

    /// Day counts for one user, or everyone when `user_id` is `None`.
    pub fn period_stats(&self, user_id: Option<Uuid>, period: ClaimPeriod) -> EngineResult<PeriodStats> {
        let records = self.records_in(user_id, period.window(self.rules.offset)?)?;

        let mut stats = PeriodStats {
            period,
            total_days: records.len() as u32,
            present_days: 0,
            late_days: 0,
            incomplete_days: 0,
            total_working_hours: Decimal::ZERO,
            average_working_hours: Decimal::ZERO,
            attendance_rate: Decimal::ZERO,
        };
        for record in &records {
            match self.rules.history_status(record) {
                HistoryStatus::Present => stats.present_days += 1,
                HistoryStatus::Late => stats.late_days += 1,
                HistoryStatus::Incomplete => stats.incomplete_days += 1,
            }
            stats.total_working_hours += record.working_hours();
        }

        stats.average_working_hours = average(stats.total_working_hours, stats.total_days);
        stats.total_working_hours = stats.total_working_hours.round_dp(2);
        stats.attendance_rate = percentage(stats.present_days + stats.late_days, stats.total_days);
        Ok(stats)
    }

    pub(super) fn history_entries(&self, query: &HistoryQuery) -> EngineResult<Vec<HistoryEntry>> {
        let window = query.window(self.today(), self.rules.offset)?;
        let records = self.attendance.list(&AttendanceFilter {
            user_id: query.user_id,
            window,
        })?;

        let mut users: HashMap<Uuid, Option<User>> = HashMap::new();
        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let user = match users.get(&record.user_id) {
                Some(user) => user.clone(),
                None => {
                    let found = self.users.find_user(record.user_id)?;
                    users.insert(record.user_id, found.clone());
                    found
                }
            };
            let entry = self.entry(record, user.as_ref());
            if query.status.is_none_or(|s| s == entry.status) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    pub(super) fn entry(&self, record: AttendanceRecord, user: Option<&User>) -> HistoryEntry {
        HistoryEntry {
            user_name: user.map(|u| u.name.clone()).unwrap_or_default(),
            user_email: user.map(|u| u.email.clone()).unwrap_or_default(),
            status: self.rules.history_status(&record),
            is_late: self.rules.is_late(record.check_in_time),
            working_hours: record.working_hours(),
            record,
        }
    }
}
