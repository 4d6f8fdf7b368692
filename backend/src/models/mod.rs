//! Data store models and request DTOs.

pub mod product;
pub mod warehouseman;
