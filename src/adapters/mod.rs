//! Concrete adapter implementations for ports.

pub mod csv_adapter;
pub mod csv_export;
pub mod file_config_adapter;
pub mod typst_report;
#[cfg(feature = "yahoo")]
pub mod yahoo_adapter;
