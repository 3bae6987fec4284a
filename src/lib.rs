//! repo-pulse crate
//!
//! Fetches the most-starred GitHub repositories together with the authors who
//! committed to each of them during the last day. All outbound traffic goes through
//! a single executor that enforces both a requests-per-second ceiling and a
//! concurrent-requests ceiling.

/// Result type alias using `ohno::AppError` as the default error type.
pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

pub mod config;
pub mod fetch;
pub mod model;
pub mod records;
pub mod reports;
