//! Storage seams for the collaborators the engine depends on.
//!
//! The engine never talks to a database directly. Each table it reads or
//! writes is reached through one of the traits below, and uniqueness rules
//! are the store's job: an insert that would create a second attendance
//! record for a user's day, or a second claim for a user's period, must
//! fail with [`EngineError::UniqueViolation`](crate::error::EngineError::UniqueViolation)
//! atomically, not after a separate query.
//!
//! [`MemoryStore`] implements every trait for tests and single-process use.

mod clock;
mod memory;
mod photos;

pub use clock::{Clock, FixedClock, SystemClock};
pub use memory::{MemoryAuditSink, MemoryPhotoStore, MemoryStore};
pub use photos::LocalPhotoStore;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{
    AttendanceRecord, AuditEntry, ClaimPeriod, ClaimStatus, Location, LocationType,
    MealAllowanceClaim, MealAllowancePolicy, TimeWindow, User,
};

/// Constraint name reported when a user already has a record for the day.
pub const ATTENDANCE_USER_DAY: &str = "attendance_user_day";

/// Constraint name reported when a user already has a claim for the period.
pub const CLAIM_USER_PERIOD: &str = "claim_user_period";

/// Filters for listing attendance records.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    /// Only this user's records.
    pub user_id: Option<Uuid>,
    /// Only records checked in inside this window.
    pub window: Option<TimeWindow>,
}

impl AttendanceFilter {
    /// Records of one user inside a window.
    pub fn for_user_in(user_id: Uuid, window: TimeWindow) -> Self {
        Self {
            user_id: Some(user_id),
            window: Some(window),
        }
    }

    /// Returns true if the record passes every set filter.
    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.is_none_or(|id| record.user_id == id)
            && self
                .window
                .is_none_or(|window| window.contains(record.check_in_time))
    }
}

/// Attendance record persistence.
pub trait AttendanceStore: Send + Sync {
    /// Inserts a record unless the user already has one checked in inside `day`.
    ///
    /// Fails with `UniqueViolation { constraint: ATTENDANCE_USER_DAY }`.
    fn insert_unique_in_day(&self, record: AttendanceRecord, day: TimeWindow) -> EngineResult<()>;

    /// The user's record checked in inside `window`, if any.
    fn find_in_window(
        &self,
        user_id: Uuid,
        window: TimeWindow,
    ) -> EngineResult<Option<AttendanceRecord>>;

    /// Sets check-out fields on the user's record inside `day` only if it has
    /// no check-out yet. Returns `None` when no such record exists.
    fn complete_check_out(
        &self,
        user_id: Uuid,
        day: TimeWindow,
        check_out_time: DateTime<Utc>,
        photo_path: Option<String>,
    ) -> EngineResult<Option<AttendanceRecord>>;

    /// Fetches a record by id.
    fn get(&self, id: Uuid) -> EngineResult<Option<AttendanceRecord>>;

    /// Overwrites an existing record.
    fn save(&self, record: &AttendanceRecord) -> EngineResult<()>;

    /// Deletes a record. Returns false if it did not exist.
    fn delete(&self, id: Uuid) -> EngineResult<bool>;

    /// Lists matching records, newest check-in first.
    fn list(&self, filter: &AttendanceFilter) -> EngineResult<Vec<AttendanceRecord>>;
}

/// Filters for listing locations.
#[derive(Debug, Clone, Default)]
pub struct LocationFilter {
    /// Only locations of this type.
    pub location_type: Option<LocationType>,
    /// Only locations with this active flag.
    pub is_active: Option<bool>,
}

impl LocationFilter {
    /// Active locations of any type.
    pub fn active() -> Self {
        Self {
            location_type: None,
            is_active: Some(true),
        }
    }

    /// Returns true if the location passes every set filter.
    pub fn matches(&self, location: &Location) -> bool {
        self.location_type
            .is_none_or(|t| location.location_type == t)
            && self.is_active.is_none_or(|a| location.is_active == a)
    }
}

/// Location persistence.
pub trait LocationStore: Send + Sync {
    /// Inserts a new location.
    fn insert(&self, location: Location) -> EngineResult<()>;

    /// Fetches a location by id.
    fn get(&self, id: Uuid) -> EngineResult<Option<Location>>;

    /// Overwrites an existing location.
    fn save(&self, location: &Location) -> EngineResult<()>;

    /// Deletes a location. Returns false if it did not exist.
    fn delete(&self, id: Uuid) -> EngineResult<bool>;

    /// Lists matching locations in creation order.
    fn list(&self, filter: &LocationFilter) -> EngineResult<Vec<Location>>;
}

/// Filters for listing claims.
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    /// Only this user's claims.
    pub user_id: Option<Uuid>,
    /// Only claims in this status.
    pub status: Option<ClaimStatus>,
    /// Only claims for this month.
    pub month: Option<u32>,
    /// Only claims for this year.
    pub year: Option<i32>,
}

impl ClaimFilter {
    /// Returns true if the claim passes every set filter.
    pub fn matches(&self, claim: &MealAllowanceClaim) -> bool {
        self.user_id.is_none_or(|id| claim.user_id == id)
            && self.status.is_none_or(|s| claim.status == s)
            && self.month.is_none_or(|m| claim.month == m)
            && self.year.is_none_or(|y| claim.year == y)
    }
}

/// Meal-allowance claim persistence.
pub trait ClaimStore: Send + Sync {
    /// Inserts a claim unless the user already has one for its period.
    ///
    /// Fails with `UniqueViolation { constraint: CLAIM_USER_PERIOD }`.
    fn insert_unique(&self, claim: MealAllowanceClaim) -> EngineResult<()>;

    /// Fetches a claim by id.
    fn get(&self, id: Uuid) -> EngineResult<Option<MealAllowanceClaim>>;

    /// The user's claim for a period, whatever its status.
    fn find_by_period(
        &self,
        user_id: Uuid,
        period: ClaimPeriod,
    ) -> EngineResult<Option<MealAllowanceClaim>>;

    /// Replaces the stored claim only while its status is still `expected`.
    /// Returns false if the status had moved on or the claim is gone.
    fn replace_if_status(
        &self,
        claim: &MealAllowanceClaim,
        expected: ClaimStatus,
    ) -> EngineResult<bool>;

    /// Lists matching claims, newest claim date first.
    fn list(&self, filter: &ClaimFilter) -> EngineResult<Vec<MealAllowanceClaim>>;
}

/// Meal-allowance policy persistence.
pub trait PolicyStore: Send + Sync {
    /// The active policy, if one has been saved.
    fn active_policy(&self) -> EngineResult<Option<MealAllowancePolicy>>;

    /// Saves a policy. Saving an active policy deactivates any other.
    fn save_policy(&self, policy: &MealAllowancePolicy) -> EngineResult<()>;
}

/// Read access to the external user directory.
pub trait UserDirectory: Send + Sync {
    /// Looks a user up by id.
    fn find_user(&self, id: Uuid) -> EngineResult<Option<User>>;

    /// Active users who are not administrators.
    fn list_staff(&self) -> EngineResult<Vec<User>>;
}

/// Which moment a photo was taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoKind {
    /// Check-in evidence.
    CheckIn,
    /// Check-out evidence.
    CheckOut,
}

impl PhotoKind {
    /// Subdirectory the photo is filed under.
    pub fn directory(&self) -> &'static str {
        match self {
            PhotoKind::CheckIn => "attendance",
            PhotoKind::CheckOut => "attendance/checkout",
        }
    }
}

/// Blob storage for attendance photos.
pub trait PhotoStore: Send + Sync {
    /// Stores the bytes and returns a stable path.
    fn save(&self, kind: PhotoKind, extension: &str, content: &[u8]) -> EngineResult<String>;

    /// Removes a stored photo. Missing files are not an error.
    fn remove(&self, path: &str) -> EngineResult<()>;
}

/// Destination for audit entries.
pub trait AuditSink: Send + Sync {
    /// Persists one entry.
    fn write(&self, entry: AuditEntry) -> EngineResult<()>;
}
