//! Core data models for the attendance engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod audit;
mod location;
mod meal_allowance;
mod page;
mod period;
mod user;

pub use attendance::{AttendanceRecord, AttendanceUpdate};
pub use audit::AuditEntry;
pub use location::{Coordinate, Location, LocationType, WorkingHoursPolicy};
pub use meal_allowance::{ClaimStatus, MealAllowanceClaim, MealAllowancePolicy};
pub use page::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, Page, PageRequest};
pub use period::{ClaimPeriod, TimeWindow, local_date};
pub use user::{Role, User};
