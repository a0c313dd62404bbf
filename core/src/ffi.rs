//! Plain records exchanged with the app shell through the generated bindings.

use thiserror::Error;

use crate::calendar::DayClock;
use crate::consolidation::plan_consolidation;
use crate::models::{Booking, BookingId, BookingStatus, PaymentStatus, SiteId};

#[derive(Debug, Error)]
pub enum FfiError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct BookingRecord {
    pub id: String,
    pub site_id: String,
    pub dive_date_unix: i64,
    pub end_date_unix: Option<i64>,
    pub group_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MergeRecord {
    pub group_name: String,
    pub keep_id: String,
    pub end_date_unix: i64,
    pub remove_ids: Vec<String>,
}

impl From<BookingRecord> for Booking {
    fn from(record: BookingRecord) -> Self {
        Booking {
            id: BookingId(record.id),
            site_id: SiteId(record.site_id),
            dive_date_unix: record.dive_date_unix,
            end_date_unix: record.end_date_unix,
            group_name: record.group_name,
            status: BookingStatus::default(),
            payment_status: PaymentStatus::default(),
            notes: None,
        }
    }
}

/// Plan merges for bookings the shell already fetched. The shell applies the
/// returned merges through its own backend client.
pub fn plan_booking_merges(
    bookings: Vec<BookingRecord>,
    utc_offset_minutes: i32,
) -> Result<Vec<MergeRecord>, FfiError> {
    let clock = DayClock::from_offset_minutes(utc_offset_minutes)
        .map_err(|e| FfiError::InvalidInput(e.to_string()))?;
    let bookings: Vec<Booking> = bookings.into_iter().map(Booking::from).collect();

    Ok(plan_consolidation(&bookings, &clock)
        .merges
        .into_iter()
        .map(|merge| MergeRecord {
            group_name: merge.group_name,
            keep_id: merge.keep.0,
            end_date_unix: merge.end_date_unix,
            remove_ids: merge.remove.into_iter().map(|id| id.0).collect(),
        })
        .collect())
}
