//! Application state for the attendance API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};

use crate::attendance::{AttendanceService, WorkRules};
use crate::audit::AuditLogger;
use crate::config::ConfigLoader;
use crate::geo::LocationService;
use crate::meal_allowance::MealAllowanceEngine;
use crate::statistics::StatisticsAggregator;
use crate::storage::{
    AttendanceStore, ClaimStore, Clock, LocationStore, MemoryStore, PhotoStore, PolicyStore,
    UserDirectory,
};

/// The storage collaborators the engines are built over.
#[derive(Clone)]
pub struct Stores {
    /// Attendance records.
    pub attendance: Arc<dyn AttendanceStore>,
    /// Approved locations.
    pub locations: Arc<dyn LocationStore>,
    /// Meal-allowance claims.
    pub claims: Arc<dyn ClaimStore>,
    /// Meal-allowance policy.
    pub policies: Arc<dyn PolicyStore>,
    /// User directory.
    pub users: Arc<dyn UserDirectory>,
    /// Photo blobs.
    pub photos: Arc<dyn PhotoStore>,
}

impl Stores {
    /// Every table served by one in-memory store.
    pub fn memory(store: Arc<MemoryStore>, photos: Arc<dyn PhotoStore>) -> Self {
        Self {
            attendance: store.clone(),
            locations: store.clone(),
            claims: store.clone(),
            policies: store.clone(),
            users: store,
            photos,
        }
    }
}

/// Shared application state.
///
/// Holds the loaded configuration, the engines, and the audit handle.
/// Cloning is cheap: every engine shares its stores through `Arc`.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    locations: LocationService,
    attendance: AttendanceService,
    meal_allowance: MealAllowanceEngine,
    statistics: StatisticsAggregator,
    audit: AuditLogger,
    clock: Arc<dyn Clock>,
}

impl AppState {
    /// Builds every engine from the configuration and stores.
    pub fn new(config: ConfigLoader, stores: Stores, clock: Arc<dyn Clock>, audit: AuditLogger) -> Self {
        let engine = config.engine();
        let rules = WorkRules::from_config(engine);

        let locations = LocationService::new(
            stores.locations.clone(),
            clock.clone(),
            engine.locations.clone(),
            engine.timezone.name.clone(),
        );
        let attendance = AttendanceService::new(
            stores.attendance.clone(),
            stores.locations.clone(),
            stores.photos.clone(),
            clock.clone(),
            rules,
            engine.photos.allowed_extensions.clone(),
        );
        let meal_allowance = MealAllowanceEngine::new(
            stores.attendance.clone(),
            stores.claims.clone(),
            stores.policies.clone(),
            stores.users.clone(),
            clock.clone(),
            config.config(),
        );
        let statistics = StatisticsAggregator::new(
            stores.attendance.clone(),
            stores.users.clone(),
            clock.clone(),
            rules,
            meal_allowance.clone(),
        );

        Self {
            config: Arc::new(config),
            locations,
            attendance,
            meal_allowance,
            statistics,
            audit,
            clock,
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Location administration and geofence queries.
    pub fn locations(&self) -> &LocationService {
        &self.locations
    }

    /// The attendance lifecycle.
    pub fn attendance(&self) -> &AttendanceService {
        &self.attendance
    }

    /// Meal-allowance claims and policy.
    pub fn meal_allowance(&self) -> &MealAllowanceEngine {
        &self.meal_allowance
    }

    /// Dashboards, history and exports.
    pub fn statistics(&self) -> &StatisticsAggregator {
        &self.statistics
    }

    /// The audit queue.
    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    /// The current instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// The current local date.
    pub fn today(&self) -> NaiveDate {
        self.statistics.today()
    }
}
