use std::collections::{BTreeMap, HashMap};

use crate::consolidation::GroupMerge;
use crate::error::StoreError;
use crate::models::{
    Booking, BookingId, BookingStatus, EnvironmentalReading, NewBooking, PaymentStatus, SiteId,
};
use crate::storage::{BookingFilter, BookingStore};

/// In-memory booking store for development and testing.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    bookings: BTreeMap<BookingId, Booking>,
    readings: HashMap<BookingId, EnvironmentalReading>,
    next_id: u64,
    #[cfg(test)]
    merges_before_failure: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A three-day "Safari" trip at `dahab` plus one ungrouped dive.
    pub fn with_sample_data() -> Self {
        let mut store = Self::new();
        let day = 86_400;
        let start = 1_772_438_400; // 2026-03-02T08:00:00Z
        for offset in 0..3 {
            store.insert(NewBooking {
                site_id: SiteId("dahab".to_string()),
                dive_date_unix: start + offset * day,
                group_name: Some("Safari".to_string()),
                status: BookingStatus::Confirmed,
                notes: None,
            });
        }
        store.insert(NewBooking {
            site_id: SiteId("dahab".to_string()),
            dive_date_unix: start + 5 * day,
            group_name: None,
            status: BookingStatus::Pending,
            notes: Some("Blue Hole fun dive".to_string()),
        });
        store
    }

    /// Let `count` merges succeed, then fail every later one.
    #[cfg(test)]
    pub fn fail_merges_after(mut self, count: usize) -> Self {
        self.merges_before_failure = Some(count);
        self
    }

    pub fn len(&self) -> usize {
        self.bookings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bookings.is_empty()
    }

    fn insert(&mut self, booking: NewBooking) -> Booking {
        self.next_id += 1;
        let booking = booking.into_booking(BookingId(format!("bk-{:04}", self.next_id)));
        self.bookings.insert(booking.id.clone(), booking.clone());
        booking
    }

    fn booking_mut(&mut self, id: &BookingId) -> Result<&mut Booking, StoreError> {
        self.bookings
            .get_mut(id)
            .ok_or_else(|| StoreError::BookingNotFound(id.clone()))
    }

    fn ensure_present(&self, ids: &[BookingId]) -> Result<(), StoreError> {
        match ids.iter().find(|id| !self.bookings.contains_key(*id)) {
            Some(missing) => Err(StoreError::BookingNotFound(missing.clone())),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    fn take_merge_budget(&mut self) -> Result<(), StoreError> {
        match self.merges_before_failure {
            Some(0) => Err(StoreError::Backend("injected merge failure".to_string())),
            Some(remaining) => {
                self.merges_before_failure = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    #[cfg(not(test))]
    fn take_merge_budget(&mut self) -> Result<(), StoreError> {
        Ok(())
    }

    fn remove(&mut self, ids: &[BookingId]) {
        for id in ids {
            self.bookings.remove(id);
            self.readings.remove(id);
        }
    }
}

impl BookingStore for MemoryStore {
    fn create_booking(&mut self, booking: NewBooking) -> Result<Booking, StoreError> {
        Ok(self.insert(booking))
    }

    fn list_bookings(&self, filter: &BookingFilter) -> Result<Vec<Booking>, StoreError> {
        let mut bookings: Vec<Booking> = self
            .bookings
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| {
            a.dive_date_unix
                .cmp(&b.dive_date_unix)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(bookings)
    }

    fn load_booking(&self, id: &BookingId) -> Result<Option<Booking>, StoreError> {
        Ok(self.bookings.get(id).cloned())
    }

    fn update_booking_end_date(
        &mut self,
        id: &BookingId,
        end_date_unix: Option<i64>,
    ) -> Result<(), StoreError> {
        self.booking_mut(id)?.end_date_unix = end_date_unix;
        Ok(())
    }

    fn update_booking_status(
        &mut self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<(), StoreError> {
        self.booking_mut(id)?.status = status;
        Ok(())
    }

    fn update_payment_status(
        &mut self,
        id: &BookingId,
        status: PaymentStatus,
    ) -> Result<(), StoreError> {
        self.booking_mut(id)?.payment_status = status;
        Ok(())
    }

    fn delete_bookings(&mut self, ids: &[BookingId]) -> Result<(), StoreError> {
        self.ensure_present(ids)?;
        self.remove(ids);
        Ok(())
    }

    fn apply_merge(&mut self, merge: &GroupMerge) -> Result<(), StoreError> {
        self.ensure_present(std::slice::from_ref(&merge.keep))?;
        self.ensure_present(&merge.remove)?;
        self.take_merge_budget()?;
        self.booking_mut(&merge.keep)?.end_date_unix = Some(merge.end_date_unix);
        self.remove(&merge.remove);
        Ok(())
    }

    fn upsert_reading(&mut self, reading: EnvironmentalReading) -> Result<(), StoreError> {
        if !self.bookings.contains_key(&reading.booking_id) {
            return Err(StoreError::BookingNotFound(reading.booking_id));
        }
        self.readings.insert(reading.booking_id.clone(), reading);
        Ok(())
    }

    fn load_reading(
        &self,
        booking_id: &BookingId,
    ) -> Result<Option<EnvironmentalReading>, StoreError> {
        Ok(self.readings.get(booking_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FlagStatus;

    fn reading(booking_id: &BookingId) -> EnvironmentalReading {
        EnvironmentalReading {
            booking_id: booking_id.clone(),
            temperature_c: 24.0,
            wind_speed_kmh: 12.0,
            wave_height_m: 0.8,
            tide_status: "rising".to_string(),
            flag_status: FlagStatus::Green,
            flag_reason: "Safe conditions".to_string(),
            recorded_at_unix: 1_772_430_000,
        }
    }

    #[test]
    fn test_sample_data() {
        let store = MemoryStore::with_sample_data();
        assert_eq!(store.len(), 4);

        let candidates = store
            .list_bookings(&BookingFilter::consolidation_candidates(SiteId(
                "dahab".to_string(),
            )))
            .unwrap();
        assert_eq!(candidates.len(), 3);
        assert!(candidates
            .windows(2)
            .all(|w| w[0].dive_date_unix < w[1].dive_date_unix));
    }

    #[test]
    fn test_updates() {
        let mut store = MemoryStore::with_sample_data();
        let id = BookingId("bk-0001".to_string());

        store
            .update_booking_status(&id, BookingStatus::Completed)
            .unwrap();
        store.update_payment_status(&id, PaymentStatus::Paid).unwrap();
        store.update_booking_end_date(&id, Some(42)).unwrap();

        let booking = store.load_booking(&id).unwrap().unwrap();
        assert_eq!(booking.status, BookingStatus::Completed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.end_date_unix, Some(42));

        let missing = BookingId("bk-9999".to_string());
        assert_eq!(
            store.update_booking_status(&missing, BookingStatus::Confirmed),
            Err(StoreError::BookingNotFound(missing))
        );
    }

    #[test]
    fn test_delete_is_all_or_nothing() {
        let mut store = MemoryStore::with_sample_data();
        let ids = vec![
            BookingId("bk-0001".to_string()),
            BookingId("bk-0404".to_string()),
        ];

        assert!(store.delete_bookings(&ids).is_err());
        assert_eq!(store.len(), 4);

        store.delete_bookings(&ids[..1]).unwrap();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_reading_upsert_and_cascade() {
        let mut store = MemoryStore::with_sample_data();
        let id = BookingId("bk-0002".to_string());

        store.upsert_reading(reading(&id)).unwrap();
        let mut updated = reading(&id);
        updated.wind_speed_kmh = 18.0;
        store.upsert_reading(updated).unwrap();
        assert_eq!(
            store.load_reading(&id).unwrap().unwrap().wind_speed_kmh,
            18.0
        );

        store.delete_bookings(std::slice::from_ref(&id)).unwrap();
        assert!(store.load_reading(&id).unwrap().is_none());

        let orphan = reading(&BookingId("bk-0404".to_string()));
        assert!(store.upsert_reading(orphan).is_err());
    }

    #[test]
    fn test_injected_merge_failure() {
        let mut store = MemoryStore::with_sample_data().fail_merges_after(0);
        let merge = GroupMerge {
            group_name: "Safari".to_string(),
            keep: BookingId("bk-0001".to_string()),
            end_date_unix: 1_772_611_200,
            remove: vec![BookingId("bk-0002".to_string())],
        };
        assert!(matches!(
            store.apply_merge(&merge),
            Err(StoreError::Backend(_))
        ));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_missing_member_does_not_use_up_merge_budget() {
        let mut store = MemoryStore::with_sample_data().fail_merges_after(1);
        let ghost = GroupMerge {
            group_name: "Safari".to_string(),
            keep: BookingId("bk-0001".to_string()),
            end_date_unix: 1_772_611_200,
            remove: vec![BookingId("bk-0404".to_string())],
        };
        assert!(matches!(
            store.apply_merge(&ghost),
            Err(StoreError::BookingNotFound(_))
        ));

        let merge = GroupMerge {
            remove: vec![BookingId("bk-0002".to_string())],
            ..ghost
        };
        store.apply_merge(&merge).unwrap();
        assert_eq!(store.len(), 3);
    }
}
