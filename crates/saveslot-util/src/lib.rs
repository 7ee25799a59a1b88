//! Shared utilities for saveslot.
//!
//! - Logging setup with tracing
//! - Default directory locations
//! - RAII-based timing for operation measurement

pub mod log;
pub mod path;
pub mod timing;

pub use log::{LogConfig, LogLevel};
pub use timing::TimingGuard;
