//! Output module for reporting on harvested data
//!
//! This module handles:
//! - Loading store-wide statistics
//! - Printing them alongside the latest run

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
