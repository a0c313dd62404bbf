use chrono::NaiveDate;
use thiserror::Error;

use crate::models::{BookingId, SiteId};

/// Failures reported by a booking store.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("booking not found: {0}")]
    BookingNotFound(BookingId),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Error type for operator-facing operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OpsError {
    #[error("operation failed: {0}")]
    Store(#[from] StoreError),

    #[error("consolidation already running for site {0}")]
    SiteBusy(SiteId),

    #[error("invalid reading: {field} must be a finite, non-negative number (got {value})")]
    InvalidReading { field: &'static str, value: f64 },

    #[error("invalid date range: {end} is before {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },

    #[error("invalid configuration: {0}")]
    Config(String),
}
