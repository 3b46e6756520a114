//! Core domain types and pure computations.

pub mod analysis;
pub mod config_validation;
pub mod error;
pub mod frequency;
pub mod price;
pub mod returns;
pub mod simulation;
pub mod trend;
