//! Check-in and check-out.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::geo::validate_against_locations;
use crate::models::{AttendanceRecord, AttendanceUpdate, Coordinate, TimeWindow, local_date};
use crate::storage::{
    AttendanceStore, Clock, LocationFilter, LocationStore, PhotoKind, PhotoStore,
};

use super::{DayStatus, WorkRules};

/// An uploaded photo.
#[derive(Debug, Clone)]
pub struct PhotoUpload {
    /// Client-side file name, used only for its extension.
    pub file_name: String,
    /// Raw bytes.
    pub content: Vec<u8>,
}

/// Input to [`AttendanceService::check_in`].
#[derive(Debug, Clone)]
pub struct CheckIn {
    /// The user checking in.
    pub user_id: Uuid,
    /// Reported position.
    pub coordinate: Coordinate,
    /// Required photo evidence.
    pub photo: Option<PhotoUpload>,
    /// Free-text notes.
    pub notes: String,
}

/// Input to [`AttendanceService::check_out`].
#[derive(Debug, Clone)]
pub struct CheckOut {
    /// The user checking out.
    pub user_id: Uuid,
    /// Optional photo evidence.
    pub photo: Option<PhotoUpload>,
}

/// A user's attendance for the current local day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodayAttendance {
    /// The local date.
    pub date: NaiveDate,
    /// Today's record, if any.
    pub record: Option<AttendanceRecord>,
    /// Whether a record exists.
    pub checked_in: bool,
    /// Whether the record has a check-out.
    pub checked_out: bool,
    /// Combined status.
    pub status: DayStatus,
    /// Whether check-in was after work start.
    pub is_late: bool,
    /// Hours worked so far, zero until check-out.
    pub working_hours: Decimal,
}

/// Owns the attendance record lifecycle.
///
/// A user moves from no record to checked in to checked out once per local
/// day. Check-in is the only way a record is created.
#[derive(Clone)]
pub struct AttendanceService {
    attendance: Arc<dyn AttendanceStore>,
    locations: Arc<dyn LocationStore>,
    photos: Arc<dyn PhotoStore>,
    clock: Arc<dyn Clock>,
    rules: WorkRules,
    allowed_extensions: Vec<String>,
}

impl AttendanceService {
    /// Creates a service.
    pub fn new(
        attendance: Arc<dyn AttendanceStore>,
        locations: Arc<dyn LocationStore>,
        photos: Arc<dyn PhotoStore>,
        clock: Arc<dyn Clock>,
        rules: WorkRules,
        allowed_extensions: Vec<String>,
    ) -> Self {
        Self {
            attendance,
            locations,
            photos,
            clock,
            rules,
            allowed_extensions,
        }
    }

    /// The rules this service judges lateness with.
    pub fn rules(&self) -> &WorkRules {
        &self.rules
    }

    /// Records a check-in.
    ///
    /// Fails with `InvalidCoordinate` for an out-of-domain position,
    /// `PhotoRequired` / `InvalidPhotoFormat` for bad evidence and
    /// `AlreadyCheckedIn` if the user has a record for today. The record is
    /// valid if the position lies in an active location's geofence.
    pub fn check_in(&self, input: CheckIn) -> EngineResult<AttendanceRecord> {
        input.coordinate.validate()?;
        let photo = input.photo.ok_or(EngineError::PhotoRequired)?;
        if photo.content.is_empty() {
            return Err(EngineError::PhotoRequired);
        }
        let extension = self.photo_extension(&photo.file_name)?;

        let now = self.clock.now();
        let date = local_date(now, self.rules.offset);
        let day = TimeWindow::for_day(date, self.rules.offset);

        if self.attendance.find_in_window(input.user_id, day)?.is_some() {
            warn!(user_id = %input.user_id, %date, "Duplicate check-in rejected");
            return Err(EngineError::AlreadyCheckedIn { date });
        }

        let locations = self.locations.list(&LocationFilter::active())?;
        let geofence = validate_against_locations(input.coordinate, &locations);

        let photo_path = self.photos.save(PhotoKind::CheckIn, &extension, &photo.content)?;

        let record = AttendanceRecord {
            id: Uuid::new_v4(),
            user_id: input.user_id,
            check_in_time: now,
            check_out_time: None,
            photo_path,
            check_out_photo_path: None,
            latitude: input.coordinate.latitude,
            longitude: input.coordinate.longitude,
            address: geofence.address().to_string(),
            distance: geofence.distance.unwrap_or(0.0),
            is_valid: geofence.is_valid,
            notes: input.notes,
            created_at: now,
            updated_at: now,
        };

        if let Err(err) = self.attendance.insert_unique_in_day(record.clone(), day) {
            self.discard_photo(&record.photo_path);
            return Err(match err {
                EngineError::UniqueViolation { .. } => {
                    warn!(user_id = %input.user_id, %date, "Concurrent check-in rejected");
                    EngineError::AlreadyCheckedIn { date }
                }
                other => other,
            });
        }

        info!(
            user_id = %record.user_id,
            attendance_id = %record.id,
            is_valid = record.is_valid,
            distance = record.distance,
            is_late = self.rules.is_late(now),
            "Checked in"
        );
        Ok(record)
    }

    /// Records the check-out on today's open record.
    ///
    /// Fails with `NoActiveCheckIn` if there is no record today or it is
    /// already checked out.
    pub fn check_out(&self, input: CheckOut) -> EngineResult<AttendanceRecord> {
        let extension = match &input.photo {
            Some(photo) => Some(self.photo_extension(&photo.file_name)?),
            None => None,
        };

        let now = self.clock.now();
        let day = TimeWindow::for_day(local_date(now, self.rules.offset), self.rules.offset);

        let photo_path = match (&input.photo, extension) {
            (Some(photo), Some(ext)) if !photo.content.is_empty() => {
                Some(self.photos.save(PhotoKind::CheckOut, &ext, &photo.content)?)
            }
            _ => None,
        };

        let completed = self
            .attendance
            .complete_check_out(input.user_id, day, now, photo_path.clone());

        match completed {
            Ok(Some(record)) => {
                info!(
                    user_id = %record.user_id,
                    attendance_id = %record.id,
                    working_hours = %record.working_hours().round_dp(2),
                    "Checked out"
                );
                Ok(record)
            }
            Ok(None) => {
                if let Some(path) = &photo_path {
                    self.discard_photo(path);
                }
                warn!(user_id = %input.user_id, "Check-out without open check-in");
                Err(EngineError::NoActiveCheckIn)
            }
            Err(err) => {
                if let Some(path) = &photo_path {
                    self.discard_photo(path);
                }
                Err(err)
            }
        }
    }

    /// Today's record and status for a user.
    pub fn today(&self, user_id: Uuid) -> EngineResult<TodayAttendance> {
        let now = self.clock.now();
        let date = local_date(now, self.rules.offset);
        let record = self
            .attendance
            .find_in_window(user_id, TimeWindow::for_day(date, self.rules.offset))?;

        Ok(TodayAttendance {
            date,
            checked_in: record.is_some(),
            checked_out: record.as_ref().is_some_and(|r| r.is_checked_out()),
            status: DayStatus::of(record.as_ref()),
            is_late: record
                .as_ref()
                .is_some_and(|r| self.rules.is_late(r.check_in_time)),
            working_hours: record
                .as_ref()
                .map_or(Decimal::ZERO, AttendanceRecord::working_hours),
            record,
        })
    }

    /// Fetches a record.
    pub fn get(&self, id: Uuid) -> EngineResult<AttendanceRecord> {
        self.attendance
            .get(id)?
            .ok_or(EngineError::AttendanceNotFound { id })
    }

    /// Administrative correction of notes and/or check-out time.
    ///
    /// Bypasses the lifecycle: the check-out time may be set or replaced on
    /// any record. The store still rejects a check-out before check-in.
    pub fn update(&self, id: Uuid, changes: AttendanceUpdate) -> EngineResult<AttendanceRecord> {
        let mut record = self.get(id)?;
        if let Some(notes) = changes.notes {
            record.notes = notes;
        }
        if let Some(check_out_time) = changes.check_out_time {
            record.check_out_time = Some(check_out_time);
        }
        record.updated_at = self.clock.now();

        self.attendance.save(&record)?;
        info!(attendance_id = %id, "Attendance record corrected");
        Ok(record)
    }

    /// Administrative delete. Photos are removed best-effort.
    pub fn delete(&self, id: Uuid) -> EngineResult<()> {
        let record = self.get(id)?;
        if !self.attendance.delete(id)? {
            return Err(EngineError::AttendanceNotFound { id });
        }

        self.discard_photo(&record.photo_path);
        if let Some(path) = &record.check_out_photo_path {
            self.discard_photo(path);
        }
        info!(attendance_id = %id, user_id = %record.user_id, "Attendance record deleted");
        Ok(())
    }

    fn photo_extension(&self, file_name: &str) -> EngineResult<String> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()));

        match extension {
            Some(ext) if self.allowed_extensions.contains(&ext) => Ok(ext),
            _ => Err(EngineError::InvalidPhotoFormat {
                file_name: file_name.to_string(),
            }),
        }
    }

    fn discard_photo(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        if let Err(err) = self.photos.remove(path) {
            warn!(path = %path, error = %err, "Failed to remove photo");
        }
    }
}
