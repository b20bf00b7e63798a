//! Attendance record model.
//!
//! One record per user per local calendar day. The record is created at
//! check-in and completed once at check-out.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single day's attendance for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Unique identifier.
    pub id: Uuid,
    /// The user the record belongs to.
    pub user_id: Uuid,
    /// When the user checked in.
    pub check_in_time: DateTime<Utc>,
    /// When the user checked out. Set once.
    pub check_out_time: Option<DateTime<Utc>>,
    /// Stored path of the check-in photo.
    pub photo_path: String,
    /// Stored path of the check-out photo, if one was taken.
    pub check_out_photo_path: Option<String>,
    /// Reported latitude at check-in.
    pub latitude: f64,
    /// Reported longitude at check-in.
    pub longitude: f64,
    /// Address of the matched location, empty when no geofence matched.
    pub address: String,
    /// Distance in meters to the matched location, 0 when none matched.
    pub distance: f64,
    /// Whether check-in happened inside an approved geofence.
    pub is_valid: bool,
    /// Free-text notes.
    pub notes: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
}

impl AttendanceRecord {
    /// Returns true once a check-out has been recorded.
    pub fn is_checked_out(&self) -> bool {
        self.check_out_time.is_some()
    }

    /// Hours between check-in and check-out, zero while still checked in.
    ///
    /// # Examples
    ///
    /// ```
    /// use attendance_engine::models::AttendanceRecord;
    /// use chrono::{TimeZone, Utc};
    /// use rust_decimal::Decimal;
    /// use uuid::Uuid;
    ///
    /// let check_in = Utc.with_ymd_and_hms(2025, 6, 2, 2, 0, 0).unwrap();
    /// let record = AttendanceRecord {
    ///     id: Uuid::new_v4(),
    ///     user_id: Uuid::new_v4(),
    ///     check_in_time: check_in,
    ///     check_out_time: Some(Utc.with_ymd_and_hms(2025, 6, 2, 10, 30, 0).unwrap()),
    ///     photo_path: "/uploads/attendance/in.jpg".to_string(),
    ///     check_out_photo_path: None,
    ///     latitude: -6.2,
    ///     longitude: 106.8,
    ///     address: String::new(),
    ///     distance: 0.0,
    ///     is_valid: true,
    ///     notes: String::new(),
    ///     created_at: check_in,
    ///     updated_at: check_in,
    /// };
    /// assert_eq!(record.working_hours(), Decimal::new(85, 1));
    /// ```
    pub fn working_hours(&self) -> Decimal {
        match self.check_out_time {
            Some(check_out) => {
                let seconds = (check_out - self.check_in_time).num_seconds().max(0);
                Decimal::from(seconds) / Decimal::from(3600)
            }
            None => Decimal::ZERO,
        }
    }

    /// Valid attendance: inside a geofence and checked out.
    pub fn counts_as_valid(&self) -> bool {
        self.is_valid && self.is_checked_out()
    }
}

/// Fields an administrator may correct on an existing record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    /// Replacement notes.
    #[serde(default)]
    pub notes: Option<String>,
    /// Replacement check-out time.
    #[serde(default)]
    pub check_out_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(check_out: Option<DateTime<Utc>>) -> AttendanceRecord {
        let check_in = Utc.with_ymd_and_hms(2025, 6, 2, 2, 0, 0).unwrap();
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            check_in_time: check_in,
            check_out_time: check_out,
            photo_path: "/uploads/attendance/a.jpg".to_string(),
            check_out_photo_path: None,
            latitude: 0.0,
            longitude: 0.0,
            address: String::new(),
            distance: 0.0,
            is_valid: true,
            notes: String::new(),
            created_at: check_in,
            updated_at: check_in,
        }
    }

    #[test]
    fn test_working_hours_zero_without_checkout() {
        assert_eq!(record(None).working_hours(), Decimal::ZERO);
    }

    #[test]
    fn test_working_hours_fractional() {
        let r = record(Some(Utc.with_ymd_and_hms(2025, 6, 2, 10, 15, 0).unwrap()));
        assert_eq!(r.working_hours(), Decimal::new(825, 2));
    }

    #[test]
    fn test_counts_as_valid_requires_checkout() {
        let open = record(None);
        assert!(!open.counts_as_valid());

        let mut closed = record(Some(Utc.with_ymd_and_hms(2025, 6, 2, 10, 0, 0).unwrap()));
        assert!(closed.counts_as_valid());

        closed.is_valid = false;
        assert!(!closed.counts_as_valid());
    }

    #[test]
    fn test_update_deserializes_partial() {
        let update: AttendanceUpdate = serde_json::from_str(r#"{"notes": "fixed"}"#).unwrap();
        assert_eq!(update.notes.as_deref(), Some("fixed"));
        assert!(update.check_out_time.is_none());
    }
}
