//! HTTP request handlers, one module per route group.

pub mod attendance;
pub mod dashboard;
pub mod locations;
pub mod meal_allowance;
