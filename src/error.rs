//! Error types for the attendance engine.
//!
//! Every operation in the crate returns [`EngineError`]. Variants are grouped
//! into the broad categories exposed by [`ErrorKind`], which the HTTP layer
//! uses to pick a status code and decide how much detail to reveal.

use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::ClaimStatus;

/// Broad classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input shape or range. Always caller-correctable.
    Validation,
    /// The request collides with existing state (duplicates, processed claims).
    Conflict,
    /// A referenced record does not exist.
    NotFound,
    /// The request is not valid in the current lifecycle state.
    State,
    /// The backing store failed. Detail is never shown to callers.
    Storage,
    /// Configuration could not be loaded.
    Configuration,
}

/// The main error type for the attendance engine.
///
/// # Example
///
/// ```
/// use attendance_engine::error::{EngineError, ErrorKind};
///
/// let error = EngineError::InvalidPeriod { month: 13, year: 2025 };
/// assert_eq!(error.to_string(), "Invalid period 13/2025");
/// assert_eq!(error.kind(), ErrorKind::Validation);
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    /// Configuration file was not found at the specified path.
    #[error("Configuration file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// A latitude or longitude was outside its valid domain.
    #[error("Invalid {field}: {value} is out of range")]
    InvalidCoordinate {
        /// Either "latitude" or "longitude".
        field: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// A claim period had an out-of-range month or year.
    #[error("Invalid period {month}/{year}")]
    InvalidPeriod {
        /// The requested month.
        month: u32,
        /// The requested year.
        year: i32,
    },

    /// A meal-allowance policy field was invalid.
    #[error("Invalid policy field '{field}': {message}")]
    InvalidPolicy {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// A location field was invalid.
    #[error("Invalid location field '{field}': {message}")]
    InvalidLocation {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        message: String,
    },

    /// A monetary amount was zero or negative.
    #[error("Amount must be greater than 0")]
    InvalidAmount,

    /// A request was malformed in a way not covered by a more specific variant.
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Description of the problem.
        message: String,
    },

    /// Check-in was attempted without a photo.
    #[error("Photo is required")]
    PhotoRequired,

    /// The uploaded photo does not have an accepted image extension.
    #[error("Invalid image file format: {file_name}")]
    InvalidPhotoFormat {
        /// The uploaded file name.
        file_name: String,
    },

    /// A claim was submitted for a period without any valid attendance.
    #[error("No valid attendance found for {month}/{year}")]
    NoEligibleDays {
        /// The claim month.
        month: u32,
        /// The claim year.
        year: i32,
    },

    /// The user already has an attendance record for the day.
    #[error("Already checked in on {date}")]
    AlreadyCheckedIn {
        /// The local calendar date.
        date: NaiveDate,
    },

    /// The user already has a claim occupying the period.
    #[error("Meal allowance already claimed for {month}/{year}")]
    AlreadyClaimed {
        /// The claim month.
        month: u32,
        /// The claim year.
        year: i32,
    },

    /// An administrator tried to create a claim for an occupied period.
    #[error("Claim already exists for {month}/{year}")]
    DuplicateClaim {
        /// The claim month.
        month: u32,
        /// The claim year.
        year: i32,
    },

    /// The claim is no longer pending.
    #[error("Claim '{claim_id}' has already been processed ({status})")]
    AlreadyProcessed {
        /// The claim id.
        claim_id: Uuid,
        /// The status the claim is in.
        status: ClaimStatus,
    },

    /// Check-out was attempted with no open check-in for today.
    #[error("No active check-in found for today")]
    NoActiveCheckIn,

    /// Only approved claims can be marked as claimed.
    #[error("Claim '{claim_id}' is {status}, only approved claims can be marked as claimed")]
    NotApproved {
        /// The claim id.
        claim_id: Uuid,
        /// The status the claim is in.
        status: ClaimStatus,
    },

    /// Attendance record was not found.
    #[error("Attendance record not found: {id}")]
    AttendanceNotFound {
        /// The missing id.
        id: Uuid,
    },

    /// Meal-allowance claim was not found.
    #[error("Meal allowance claim not found: {id}")]
    ClaimNotFound {
        /// The missing id.
        id: Uuid,
    },

    /// User was not found in the directory.
    #[error("User not found: {id}")]
    UserNotFound {
        /// The missing id.
        id: Uuid,
    },

    /// Location was not found.
    #[error("Location not found: {id}")]
    LocationNotFound {
        /// The missing id.
        id: Uuid,
    },

    /// A store rejected an insert because of a uniqueness constraint.
    #[error("Unique constraint violated: {constraint}")]
    UniqueViolation {
        /// The name of the violated constraint.
        constraint: &'static str,
    },

    /// The backing store failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Internal detail, logged but never returned to callers.
        message: String,
    },
}

impl EngineError {
    /// Returns the category this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::ConfigNotFound { .. } | EngineError::ConfigParseError { .. } => {
                ErrorKind::Configuration
            }
            EngineError::InvalidCoordinate { .. }
            | EngineError::InvalidPeriod { .. }
            | EngineError::InvalidPolicy { .. }
            | EngineError::InvalidLocation { .. }
            | EngineError::InvalidAmount
            | EngineError::InvalidRequest { .. }
            | EngineError::PhotoRequired
            | EngineError::InvalidPhotoFormat { .. }
            | EngineError::NoEligibleDays { .. } => ErrorKind::Validation,
            EngineError::AlreadyCheckedIn { .. }
            | EngineError::AlreadyClaimed { .. }
            | EngineError::DuplicateClaim { .. }
            | EngineError::AlreadyProcessed { .. } => ErrorKind::Conflict,
            EngineError::AttendanceNotFound { .. }
            | EngineError::ClaimNotFound { .. }
            | EngineError::UserNotFound { .. }
            | EngineError::LocationNotFound { .. } => ErrorKind::NotFound,
            EngineError::NoActiveCheckIn | EngineError::NotApproved { .. } => ErrorKind::State,
            EngineError::UniqueViolation { .. } | EngineError::Storage { .. } => {
                ErrorKind::Storage
            }
        }
    }

    /// Shorthand for a [`EngineError::Storage`] error.
    pub fn storage(message: impl Into<String>) -> Self {
        EngineError::Storage {
            message: message.into(),
        }
    }
}

/// A type alias for Results that return EngineError.
pub type EngineResult<T> = Result<T, EngineError>;
