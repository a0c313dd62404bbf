use crate::consolidation::GroupMerge;
use crate::error::StoreError;
use crate::models::{
    Booking, BookingId, BookingStatus, EnvironmentalReading, NewBooking, PaymentStatus, SiteId,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct BookingFilter {
    pub site_id: Option<SiteId>,
    /// Only bookings without an end date
    pub open_ended_only: bool,
    /// Only bookings with a group name
    pub grouped_only: bool,
}

impl BookingFilter {
    pub fn for_site(site_id: SiteId) -> Self {
        Self {
            site_id: Some(site_id),
            ..Self::default()
        }
    }

    /// Open-ended, grouped bookings of one site.
    pub fn consolidation_candidates(site_id: SiteId) -> Self {
        Self {
            site_id: Some(site_id),
            open_ended_only: true,
            grouped_only: true,
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if let Some(site_id) = &self.site_id {
            if &booking.site_id != site_id {
                return false;
            }
        }
        if self.open_ended_only && booking.end_date_unix.is_some() {
            return false;
        }
        if self.grouped_only && booking.group_name.is_none() {
            return false;
        }
        true
    }
}

/// Persistence seam for bookings and their condition readings.
///
/// `delete_bookings` and `apply_merge` are all-or-nothing: when any id is
/// missing or the backend fails, nothing is changed. A repeated id counts once.
pub trait BookingStore {
    fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, StoreError>;
    fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError>;
    fn load_booking(&self, id: &BookingId) -> Result<Option<Booking>, StoreError>;

    fn update_booking_end_date(
        &mut self,
        id: &BookingId,
        end_date_unix: Option<i64>,
    ) -> Result<(), StoreError>;
    fn update_booking_status(
        &mut self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), StoreError>;
    fn update_payment_status(
        &mut self,
        id: &BookingId,
        status: PaymentStatus,
    ) -> Result<(), StoreError>;
    fn delete_bookings(&mut self, ids: &[BookingId]) -> Result<(), StoreError>;

    /// Extend the kept booking to the merge's end date and delete the rest of
    /// the group in one unit of work.
    fn apply_merge(&mut self, merge: &GroupMerge) -> Result<(), StoreError>;

    fn upsert_reading(&mut self, reading: EnvironmentalReading) -> Result<(), StoreError>;
    fn load_reading(&self, booking_id: &BookingId)
        -> Result<Option<EnvironmentalReading>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::sqlite_store::SqliteStore;

    fn booking(site: &str, end: Option<i64>, group: Option<&str>) -> Booking {
        let mut booking = NewBooking {
            site_id: SiteId(site.to_string()),
            dive_date_unix: 1_772_438_400,
            group_name: group.map(str::to_string),
            status: BookingStatus::Pending,
            notes: None,
        }
        .into_booking(BookingId("bk".to_string()));
        booking.end_date_unix = end;
        booking
    }

    #[test]
    fn test_filter_matches() {
        let filter = BookingFilter::consolidation_candidates(SiteId("dahab".to_string()));

        assert!(filter.matches(&booking("dahab", None, Some("Safari"))));
        assert!(!filter.matches(&booking("marsa", None, Some("Safari"))));
        assert!(!filter.matches(&booking("dahab", Some(1_772_611_200), Some("Safari"))));
        assert!(!filter.matches(&booking("dahab", None, None)));

        let all = BookingFilter::default();
        assert!(all.matches(&booking("marsa", Some(1), None)));

        let site = BookingFilter::for_site(SiteId("dahab".to_string()));
        assert!(site.matches(&booking("dahab", Some(1), None)));
    }

    fn grouped(store: &mut impl BookingStore, dive: i64) -> Booking {
        store
            .create_booking(NewBooking {
                site_id: SiteId("dahab".to_string()),
                dive_date_unix: dive,
                group_name: Some("Safari".to_string()),
                status: BookingStatus::Confirmed,
                notes: None,
            })
            .unwrap()
    }

    fn check_repeated_ids(mut store: impl BookingStore) {
        let day1 = 1_772_438_400;
        let first = grouped(&mut store, day1);
        let second = grouped(&mut store, day1 + 86_400);
        let third = grouped(&mut store, day1 + 2 * 86_400);

        store
            .apply_merge(&GroupMerge {
                group_name: "Safari".to_string(),
                keep: first.id.clone(),
                end_date_unix: day1 + 86_400,
                remove: vec![second.id.clone(), second.id.clone()],
            })
            .unwrap();
        assert_eq!(
            store.load_booking(&first.id).unwrap().unwrap().end_date_unix,
            Some(day1 + 86_400)
        );

        store
            .delete_bookings(&[third.id.clone(), third.id.clone()])
            .unwrap();
        let remaining = store.list_bookings(&BookingFilter::default()).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, first.id);

        let ghost = BookingId("ghost".to_string());
        assert_eq!(
            store.delete_bookings(&[first.id.clone(), ghost.clone(), ghost.clone()]),
            Err(StoreError::BookingNotFound(ghost))
        );
        assert!(store.load_booking(&first.id).unwrap().is_some());
    }

    #[test]
    fn test_repeated_ids_memory() {
        check_repeated_ids(MemoryStore::new());
    }

    #[test]
    fn test_repeated_ids_sqlite() {
        check_repeated_ids(SqliteStore::open_in_memory().unwrap());
    }
}
