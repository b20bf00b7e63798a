//! In-memory stores.
//!
//! Every table lives behind one mutex so a uniqueness check and the insert
//! it guards happen under the same lock.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::error::{EngineError, EngineResult};
use crate::models::{
    AttendanceRecord, AuditEntry, ClaimPeriod, ClaimStatus, Location, MealAllowanceClaim,
    MealAllowancePolicy, TimeWindow, User,
};

use super::{
    ATTENDANCE_USER_DAY, AttendanceFilter, AttendanceStore, AuditSink, CLAIM_USER_PERIOD,
    ClaimFilter, ClaimStore, LocationFilter, LocationStore, PhotoKind, PhotoStore, PolicyStore,
    UserDirectory,
};

#[derive(Debug, Default)]
struct Tables {
    attendance: Vec<AttendanceRecord>,
    locations: Vec<Location>,
    claims: Vec<MealAllowanceClaim>,
    policies: Vec<MealAllowancePolicy>,
    users: HashMap<Uuid, User>,
}

/// A single-process store implementing every storage trait.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a user in the directory.
    pub fn add_user(&self, user: User) -> EngineResult<()> {
        self.lock()?.users.insert(user.id, user);
        Ok(())
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| EngineError::storage("memory store lock poisoned"))
    }
}

impl AttendanceStore for MemoryStore {
    fn insert_unique_in_day(&self, record: AttendanceRecord, day: TimeWindow) -> EngineResult<()> {
        let mut tables = self.lock()?;
        let taken = tables
            .attendance
            .iter()
            .any(|r| r.user_id == record.user_id && day.contains(r.check_in_time));
        if taken {
            return Err(EngineError::UniqueViolation {
                constraint: ATTENDANCE_USER_DAY,
            });
        }
        tables.attendance.push(record);
        Ok(())
    }

    fn find_in_window(
        &self,
        user_id: Uuid,
        window: TimeWindow,
    ) -> EngineResult<Option<AttendanceRecord>> {
        Ok(self
            .lock()?
            .attendance
            .iter()
            .find(|r| r.user_id == user_id && window.contains(r.check_in_time))
            .cloned())
    }

    fn complete_check_out(
        &self,
        user_id: Uuid,
        day: TimeWindow,
        check_out_time: DateTime<Utc>,
        photo_path: Option<String>,
    ) -> EngineResult<Option<AttendanceRecord>> {
        let mut tables = self.lock()?;
        let open = tables.attendance.iter_mut().find(|r| {
            r.user_id == user_id && day.contains(r.check_in_time) && r.check_out_time.is_none()
        });

        let Some(record) = open else {
            return Ok(None);
        };
        if check_out_time < record.check_in_time {
            return Err(EngineError::storage("check-out precedes check-in"));
        }

        record.check_out_time = Some(check_out_time);
        record.check_out_photo_path = photo_path;
        record.updated_at = check_out_time;
        Ok(Some(record.clone()))
    }

    fn get(&self, id: Uuid) -> EngineResult<Option<AttendanceRecord>> {
        Ok(self.lock()?.attendance.iter().find(|r| r.id == id).cloned())
    }

    fn save(&self, record: &AttendanceRecord) -> EngineResult<()> {
        if record
            .check_out_time
            .is_some_and(|out| out < record.check_in_time)
        {
            return Err(EngineError::storage("check-out precedes check-in"));
        }
        let mut tables = self.lock()?;
        let slot = tables
            .attendance
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or(EngineError::AttendanceNotFound { id: record.id })?;
        *slot = record.clone();
        Ok(())
    }

    fn delete(&self, id: Uuid) -> EngineResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.attendance.len();
        tables.attendance.retain(|r| r.id != id);
        Ok(tables.attendance.len() != before)
    }

    fn list(&self, filter: &AttendanceFilter) -> EngineResult<Vec<AttendanceRecord>> {
        let mut records: Vec<AttendanceRecord> = self
            .lock()?
            .attendance
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.check_in_time.cmp(&a.check_in_time));
        Ok(records)
    }
}

impl LocationStore for MemoryStore {
    fn insert(&self, location: Location) -> EngineResult<()> {
        self.lock()?.locations.push(location);
        Ok(())
    }

    fn get(&self, id: Uuid) -> EngineResult<Option<Location>> {
        Ok(self.lock()?.locations.iter().find(|l| l.id == id).cloned())
    }

    fn save(&self, location: &Location) -> EngineResult<()> {
        let mut tables = self.lock()?;
        let slot = tables
            .locations
            .iter_mut()
            .find(|l| l.id == location.id)
            .ok_or(EngineError::LocationNotFound { id: location.id })?;
        *slot = location.clone();
        Ok(())
    }

    fn delete(&self, id: Uuid) -> EngineResult<bool> {
        let mut tables = self.lock()?;
        let before = tables.locations.len();
        tables.locations.retain(|l| l.id != id);
        Ok(tables.locations.len() != before)
    }

    fn list(&self, filter: &LocationFilter) -> EngineResult<Vec<Location>> {
        Ok(self
            .lock()?
            .locations
            .iter()
            .filter(|l| filter.matches(l))
            .cloned()
            .collect())
    }
}

impl ClaimStore for MemoryStore {
    fn insert_unique(&self, claim: MealAllowanceClaim) -> EngineResult<()> {
        let mut tables = self.lock()?;
        let taken = tables.claims.iter().any(|c| {
            c.user_id == claim.user_id && c.month == claim.month && c.year == claim.year
        });
        if taken {
            return Err(EngineError::UniqueViolation {
                constraint: CLAIM_USER_PERIOD,
            });
        }
        tables.claims.push(claim);
        Ok(())
    }

    fn get(&self, id: Uuid) -> EngineResult<Option<MealAllowanceClaim>> {
        Ok(self.lock()?.claims.iter().find(|c| c.id == id).cloned())
    }

    fn find_by_period(
        &self,
        user_id: Uuid,
        period: ClaimPeriod,
    ) -> EngineResult<Option<MealAllowanceClaim>> {
        Ok(self
            .lock()?
            .claims
            .iter()
            .find(|c| c.user_id == user_id && c.period() == period)
            .cloned())
    }

    fn replace_if_status(
        &self,
        claim: &MealAllowanceClaim,
        expected: ClaimStatus,
    ) -> EngineResult<bool> {
        let mut tables = self.lock()?;
        match tables
            .claims
            .iter_mut()
            .find(|c| c.id == claim.id && c.status == expected)
        {
            Some(slot) => {
                *slot = claim.clone();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn list(&self, filter: &ClaimFilter) -> EngineResult<Vec<MealAllowanceClaim>> {
        let mut claims: Vec<MealAllowanceClaim> = self
            .lock()?
            .claims
            .iter()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect();
        claims.sort_by(|a, b| b.claim_date.cmp(&a.claim_date));
        Ok(claims)
    }
}

impl PolicyStore for MemoryStore {
    fn active_policy(&self) -> EngineResult<Option<MealAllowancePolicy>> {
        Ok(self
            .lock()?
            .policies
            .iter()
            .find(|p| p.is_active)
            .cloned())
    }

    fn save_policy(&self, policy: &MealAllowancePolicy) -> EngineResult<()> {
        let mut tables = self.lock()?;
        if policy.is_active {
            for existing in tables.policies.iter_mut().filter(|p| p.id != policy.id) {
                existing.is_active = false;
            }
        }
        match tables.policies.iter_mut().find(|p| p.id == policy.id) {
            Some(slot) => *slot = policy.clone(),
            None => tables.policies.push(policy.clone()),
        }
        Ok(())
    }
}

impl UserDirectory for MemoryStore {
    fn find_user(&self, id: Uuid) -> EngineResult<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    fn list_staff(&self) -> EngineResult<Vec<User>> {
        let mut staff: Vec<User> = self
            .lock()?
            .users
            .values()
            .filter(|u| u.is_active && !u.is_admin())
            .cloned()
            .collect();
        staff.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(staff)
    }
}

/// Keeps photos in memory, keyed by their generated path.
#[derive(Debug, Default)]
pub struct MemoryPhotoStore {
    photos: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryPhotoStore {
    /// Creates an empty photo store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a photo is stored under `path`.
    pub fn contains(&self, path: &str) -> bool {
        self.photos
            .lock()
            .map(|photos| photos.contains_key(path))
            .unwrap_or(false)
    }

    /// Number of stored photos.
    pub fn len(&self) -> usize {
        self.photos.lock().map(|photos| photos.len()).unwrap_or(0)
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PhotoStore for MemoryPhotoStore {
    fn save(&self, kind: PhotoKind, extension: &str, content: &[u8]) -> EngineResult<String> {
        let path = format!("/uploads/{}/{}{}", kind.directory(), Uuid::new_v4(), extension);
        self.photos
            .lock()
            .map_err(|_| EngineError::storage("photo store lock poisoned"))?
            .insert(path.clone(), content.to_vec());
        Ok(path)
    }

    fn remove(&self, path: &str) -> EngineResult<()> {
        self.photos
            .lock()
            .map_err(|_| EngineError::storage("photo store lock poisoned"))?
            .remove(path);
        Ok(())
    }
}

/// Collects audit entries in memory.
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of every entry written so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }
}

impl AuditSink for MemoryAuditSink {
    fn write(&self, entry: AuditEntry) -> EngineResult<()> {
        self.entries
            .lock()
            .map_err(|_| EngineError::storage("audit sink lock poisoned"))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use chrono::{Duration, FixedOffset, NaiveDate, TimeZone};
    use rust_decimal::Decimal;

    fn jakarta() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn day() -> TimeWindow {
        TimeWindow::for_day(NaiveDate::from_ymd_opt(2025, 6, 2).unwrap(), jakarta())
    }

    fn record(user_id: Uuid, check_in: DateTime<Utc>) -> AttendanceRecord {
        AttendanceRecord {
            id: Uuid::new_v4(),
            user_id,
            check_in_time: check_in,
            check_out_time: None,
            photo_path: "/uploads/attendance/x.jpg".to_string(),
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

    fn claim(user_id: Uuid, month: u32, year: i32) -> MealAllowanceClaim {
        let now = Utc.with_ymd_and_hms(2025, 7, 1, 3, 0, 0).unwrap();
        MealAllowanceClaim {
            id: Uuid::new_v4(),
            user_id,
            month,
            year,
            total_attendance: 1,
            valid_attendance: 1,
            amount_per_day: Decimal::from(15000),
            total_amount: Decimal::from(15000),
            status: ClaimStatus::Pending,
            claim_date: now,
            approved_by: None,
            approved_at: None,
            claimed_at: None,
            rejection_reason: None,
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_second_record_same_day_violates_constraint() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 1, 45, 0).unwrap();

        store.insert_unique_in_day(record(user, morning), day()).unwrap();
        let second = store.insert_unique_in_day(record(user, morning + Duration::hours(2)), day());

        assert!(matches!(
            second,
            Err(EngineError::UniqueViolation {
                constraint: ATTENDANCE_USER_DAY
            })
        ));
    }

    #[test]
    fn test_other_user_same_day_is_allowed() {
        let store = MemoryStore::new();
        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 1, 45, 0).unwrap();

        store
            .insert_unique_in_day(record(Uuid::new_v4(), morning), day())
            .unwrap();
        assert!(store
            .insert_unique_in_day(record(Uuid::new_v4(), morning), day())
            .is_ok());
    }

    #[test]
    fn test_complete_check_out_only_once() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 1, 45, 0).unwrap();
        store.insert_unique_in_day(record(user, morning), day()).unwrap();

        let evening = morning + Duration::hours(8);
        let first = store
            .complete_check_out(user, day(), evening, None)
            .unwrap();
        assert_eq!(first.unwrap().check_out_time, Some(evening));

        let second = store
            .complete_check_out(user, day(), evening + Duration::minutes(5), None)
            .unwrap();
        assert!(second.is_none());
    }

    #[test]
    fn test_save_rejects_check_out_before_check_in() {
        let store = MemoryStore::new();
        let morning = Utc.with_ymd_and_hms(2025, 6, 2, 1, 45, 0).unwrap();
        let mut r = record(Uuid::new_v4(), morning);
        store.insert_unique_in_day(r.clone(), day()).unwrap();

        r.check_out_time = Some(morning - Duration::hours(1));
        assert!(matches!(
            AttendanceStore::save(&store, &r),
            Err(EngineError::Storage { .. })
        ));
    }

    #[test]
    fn test_list_orders_newest_first() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let first = Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2025, 6, 3, 1, 0, 0).unwrap();
        let next_day = TimeWindow::for_day(NaiveDate::from_ymd_opt(2025, 6, 3).unwrap(), jakarta());
        store.insert_unique_in_day(record(user, first), day()).unwrap();
        store.insert_unique_in_day(record(user, second), next_day).unwrap();

        let listed = AttendanceStore::list(&store, &AttendanceFilter::default()).unwrap();
        assert_eq!(listed[0].check_in_time, second);
        assert_eq!(listed[1].check_in_time, first);
    }

    #[test]
    fn test_claim_period_uniqueness_ignores_status() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let mut rejected = claim(user, 6, 2025);
        rejected.status = ClaimStatus::Rejected;
        store.insert_unique(rejected).unwrap();

        assert!(matches!(
            store.insert_unique(claim(user, 6, 2025)),
            Err(EngineError::UniqueViolation {
                constraint: CLAIM_USER_PERIOD
            })
        ));
        assert!(store.insert_unique(claim(user, 7, 2025)).is_ok());
    }

    #[test]
    fn test_replace_if_status_is_compare_and_set() {
        let store = MemoryStore::new();
        let original = claim(Uuid::new_v4(), 6, 2025);
        store.insert_unique(original.clone()).unwrap();

        let mut approved = original.clone();
        approved.status = ClaimStatus::Approved;
        assert!(store.replace_if_status(&approved, ClaimStatus::Pending).unwrap());

        let mut rejected = original;
        rejected.status = ClaimStatus::Rejected;
        assert!(!store.replace_if_status(&rejected, ClaimStatus::Pending).unwrap());

        let stored = ClaimStore::get(&store, approved.id).unwrap().unwrap();
        assert_eq!(stored.status, ClaimStatus::Approved);
    }

    #[test]
    fn test_saving_active_policy_deactivates_previous() {
        let store = MemoryStore::new();
        let now = Utc::now();
        let first = MealAllowancePolicy {
            id: Uuid::new_v4(),
            amount_per_day: Decimal::from(15000),
            min_working_hours: Decimal::from(8),
            max_claims_per_month: 1,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let second = MealAllowancePolicy {
            id: Uuid::new_v4(),
            amount_per_day: Decimal::from(20000),
            ..first.clone()
        };
        store.save_policy(&first).unwrap();
        store.save_policy(&second).unwrap();

        let active = store.active_policy().unwrap().unwrap();
        assert_eq!(active.id, second.id);
    }

    #[test]
    fn test_list_staff_excludes_admins_and_inactive() {
        let store = MemoryStore::new();
        let user = |name: &str, role: Role, is_active: bool| User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            role,
            is_active,
        };
        store.add_user(user("Budi", Role::Employee, true)).unwrap();
        store.add_user(user("Admin", Role::Admin, true)).unwrap();
        store.add_user(user("Former", Role::Employee, false)).unwrap();

        let staff = store.list_staff().unwrap();
        assert_eq!(staff.len(), 1);
        assert_eq!(staff[0].name, "Budi");
    }

    #[test]
    fn test_photo_store_save_and_remove() {
        let photos = MemoryPhotoStore::new();
        let path = photos.save(PhotoKind::CheckOut, ".png", b"png").unwrap();

        assert!(path.starts_with("/uploads/attendance/checkout/"));
        assert!(path.ends_with(".png"));
        assert!(photos.contains(&path));

        photos.remove(&path).unwrap();
        assert!(photos.is_empty());
        // removing again is not an error
        assert!(photos.remove(&path).is_ok());
    }
}
