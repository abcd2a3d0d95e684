//! Output module for reporting on published crawls
//!
//! This module handles:
//! - Collecting queue and audit statistics
//! - Printing them for the command line

pub mod stats;

pub use stats::{load_statistics, print_statistics, QueueStatistics};
