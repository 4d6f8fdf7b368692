//! Business logic services.

pub mod catalog;
pub mod dashboard;
pub mod stock;
