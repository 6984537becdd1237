//! Statistical process control and process-capability engine for
//! critical-dimension measurements.

pub mod analytics;
pub mod config;
pub mod error;
pub mod models;
pub mod state;

pub use error::{AppError, Result};
