//! Calendar-day arithmetic for bookings.
//!
//! Booking timestamps are unix seconds; everything that reasons in days
//! (consolidation gaps, event expansion, calendar spans) goes through a
//! [`DayClock`] so the same operator-local day boundary is used everywhere.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::error::OpsError;
use crate::models::{Booking, BookingId, BookingStatus, NewBooking, SiteId};

/// Converts between unix seconds and calendar days at a fixed UTC offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayClock {
    offset: FixedOffset,
}

impl Default for DayClock {
    fn default() -> Self {
        Self::utc()
    }
}

impl DayClock {
    pub fn utc() -> Self {
        Self { offset: Utc.fix() }
    }

    pub fn from_offset_minutes(minutes: i32) -> Result<Self, OpsError> {
        minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .map(|offset| Self { offset })
            .ok_or_else(|| {
                OpsError::Config(format!("utc offset out of range: {minutes} minutes"))
            })
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    /// Calendar day of a timestamp. Timestamps outside chrono's range fall
    /// back to the epoch; when the offset would push local time past the
    /// representable range the UTC day is used.
    pub fn calendar_day(&self, unix: i64) -> NaiveDate {
        let utc = DateTime::<Utc>::from_timestamp(unix, 0)
            .unwrap_or_default()
            .naive_utc();
        utc.checked_add_signed(Duration::seconds(i64::from(
            self.offset.local_minus_utc(),
        )))
        .unwrap_or(utc)
        .date()
    }

    /// Whole calendar days from `earlier` to `later`; negative when reversed.
    pub fn day_gap(&self, earlier: i64, later: i64) -> i64 {
        (self.calendar_day(later) - self.calendar_day(earlier)).num_days()
    }

    pub fn at(&self, day: NaiveDate, time: NaiveTime) -> i64 {
        day.and_time(time).and_utc().timestamp() - i64::from(self.offset.local_minus_utc())
    }
}

/// A multi-day event as entered by an operator, before it is split into
/// per-day bookings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventDraft {
    pub site_id: SiteId,
    pub group_name: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub start_time: NaiveTime,
    pub status: BookingStatus,
    pub notes: Option<String>,
}

/// One booking per calendar day from `start` to `end` inclusive, all sharing
/// the event's group name.
pub fn expand_event(draft: &EventDraft, clock: &DayClock) -> Result<Vec<NewBooking>, OpsError> {
    if draft.end < draft.start {
        return Err(OpsError::InvalidDateRange {
            start: draft.start,
            end: draft.end,
        });
    }

    Ok(draft
        .start
        .iter_days()
        .take_while(|day| *day <= draft.end)
        .map(|day| NewBooking {
            site_id: draft.site_id.clone(),
            dive_date_unix: clock.at(day, draft.start_time),
            group_name: Some(draft.group_name.clone()),
            status: draft.status,
            notes: draft.notes.clone(),
        })
        .collect())
}

/// A booking projected onto the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSpan {
    pub booking_id: BookingId,
    pub title: Option<String>,
    pub first_day: NaiveDate,
    pub last_day: NaiveDate,
}

impl CalendarSpan {
    pub fn day_count(&self) -> i64 {
        (self.last_day - self.first_day).num_days() + 1
    }

    pub fn covers(&self, day: NaiveDate) -> bool {
        self.first_day <= day && day <= self.last_day
    }
}

pub fn calendar_spans(bookings: &[Booking], clock: &DayClock) -> Vec<CalendarSpan> {
    let mut spans: Vec<CalendarSpan> = bookings
        .iter()
        .map(|booking| {
            let first_day = clock.calendar_day(booking.dive_date_unix);
            let last_day = booking
                .end_date_unix
                .map(|end| clock.calendar_day(end))
                .filter(|end| *end >= first_day)
                .unwrap_or(first_day);
            CalendarSpan {
                booking_id: booking.id.clone(),
                title: booking.group_name.clone(),
                first_day,
                last_day,
            }
        })
        .collect();
    spans.sort_by(|a, b| {
        a.first_day
            .cmp(&b.first_day)
            .then_with(|| a.booking_id.cmp(&b.booking_id))
    });
    spans
}

pub fn spans_on(spans: &[CalendarSpan], day: NaiveDate) -> Vec<&CalendarSpan> {
    spans.iter().filter(|span| span.covers(day)).collect()
}
