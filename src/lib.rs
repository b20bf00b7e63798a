//! Geofenced attendance and meal-allowance engine.
//!
//! Employees check in and out with a photo and a GPS position, which is
//! validated against approved location geofences. Valid, completed
//! attendance days feed a monthly meal-allowance claim that moves through
//! an approval workflow. Dashboards and exports aggregate the same records
//! by local day and month.
//!
//! The engines reach their data through the traits in [`storage`], and
//! [`api`] exposes them over HTTP.

#![warn(missing_docs)]

pub mod api;
pub mod attendance;
pub mod audit;
pub mod config;
pub mod error;
pub mod geo;
pub mod meal_allowance;
pub mod models;
pub mod statistics;
pub mod storage;
