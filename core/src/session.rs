use std::sync::Arc;

use chrono::Utc;
use log::info;

use crate::calendar::{calendar_spans, expand_event, CalendarSpan, DayClock, EventDraft};
use crate::config::OpsConfig;
use crate::consolidation::consolidate_site;
use crate::error::OpsError;
use crate::locks::SiteLeases;
use crate::models::{Booking, BookingId, ReadingInput, SiteId};
use crate::readings::submit_reading;
use crate::state::{Action, Effect, OpsState};
use crate::storage::{BookingFilter, BookingStore};

/// One operator's view of the back office: owns the state and runs the
/// effects the reducer asks for. Leases are shared between sessions.
pub struct OpsSession<S: BookingStore> {
    store: S,
    leases: Arc<SiteLeases>,
    config: OpsConfig,
    clock: DayClock,
    state: OpsState,
}

impl<S: BookingStore> OpsSession<S> {
    pub fn new(store: S, leases: Arc<SiteLeases>, config: OpsConfig) -> Result<Self, OpsError> {
        config.validate()?;
        let clock = config.day_clock()?;
        Ok(Self {
            store,
            leases,
            config,
            clock,
            state: OpsState::new(),
        })
    }

    pub fn dispatch(&mut self, action: Action) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            next = self.state.reduce(action).map(|effect| self.run(effect));
        }
    }

    fn run(&mut self, effect: Effect) -> Action {
        match effect {
            Effect::RunConsolidation(site_id) => Action::ConsolidationFinished(consolidate_site(
                &mut self.store,
                &self.leases,
                &site_id,
                &self.clock,
            )),
        }
    }

    pub fn submit_reading(&mut self, booking_id: &BookingId, input: ReadingInput) {
        let result = submit_reading(
            &mut self.store,
            booking_id,
            input,
            &self.config.thresholds,
            Utc::now().timestamp(),
        );
        self.dispatch(Action::ReadingSaved(result));
    }

    /// Store an event as one booking per day.
    pub fn create_event(&mut self, draft: &EventDraft) -> Result<Vec<Booking>, OpsError> {
        let bookings = expand_event(draft, &self.clock)?
            .into_iter()
            .map(|booking| self.store.create_booking(booking))
            .collect::<Result<Vec<_>, _>>()?;
        info!(
            "site {}: created {} booking(s) for {:?}",
            draft.site_id,
            bookings.len(),
            draft.group_name
        );
        Ok(bookings)
    }

    pub fn site_calendar(&self, site_id: &SiteId) -> Result<Vec<CalendarSpan>, OpsError> {
        let bookings = self
            .store
            .list_bookings(&BookingFilter::for_site(site_id.clone()))?;
        Ok(calendar_spans(&bookings, &self.clock))
    }

    pub fn state(&self) -> &OpsState {
        &self.state
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory_store::MemoryStore;
    use crate::models::{BookingStatus, FlagStatus};
    use crate::state::{ConsolidationPhase, NoticeLevel};
    use chrono::{NaiveDate, NaiveTime};

    fn safari(start: NaiveDate, end: NaiveDate) -> EventDraft {
        EventDraft {
            site_id: SiteId("dahab".to_string()),
            group_name: "Safari".to_string(),
            start,
            end,
            start_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            status: BookingStatus::Confirmed,
            notes: None,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn session() -> OpsSession<MemoryStore> {
        OpsSession::new(
            MemoryStore::new(),
            Arc::new(SiteLeases::new()),
            OpsConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_create_then_consolidate_event() {
        let mut session = session();
        let site = SiteId("dahab".to_string());
        let created = session.create_event(&safari(day(2), day(4))).unwrap();
        assert_eq!(created.len(), 3);
        assert_eq!(session.site_calendar(&site).unwrap().len(), 3);

        session.dispatch(Action::OpenConsolidation(site.clone()));
        session.dispatch(Action::ConfirmConsolidation);

        assert_eq!(session.state().phase, ConsolidationPhase::Idle);
        assert_eq!(
            session.state().latest_notice().unwrap().level,
            NoticeLevel::Success
        );
        let spans = session.site_calendar(&site).unwrap();
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].first_day, day(2));
        assert_eq!(spans[0].last_day, day(4));
        assert_eq!(spans[0].day_count(), 3);
    }

    #[test]
    fn test_gap_reports_info_notice() {
        let mut session = session();
        let site = SiteId("dahab".to_string());
        session.create_event(&safari(day(2), day(2))).unwrap();
        session.create_event(&safari(day(4), day(4))).unwrap();

        session.dispatch(Action::OpenConsolidation(site.clone()));
        session.dispatch(Action::ConfirmConsolidation);

        let notice = session.state().latest_notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Info);
        assert_eq!(notice.text, "No consecutive events found");
        assert_eq!(session.store().len(), 2);
    }

    #[test]
    fn test_concurrent_operator_is_blocked() {
        let leases = Arc::new(SiteLeases::new());
        let site = SiteId("dahab".to_string());
        let mut session = OpsSession::new(
            MemoryStore::with_sample_data(),
            Arc::clone(&leases),
            OpsConfig::default(),
        )
        .unwrap();

        let _other_operator = leases.acquire(&site).unwrap();
        session.dispatch(Action::OpenConsolidation(site.clone()));
        session.dispatch(Action::ConfirmConsolidation);

        let notice = session.state().latest_notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Error);
        assert!(notice.text.contains("already running"));
        assert_eq!(session.store().len(), 4);
    }

    #[test]
    fn test_submit_reading_updates_state() {
        let mut session = OpsSession::new(
            MemoryStore::with_sample_data(),
            Arc::new(SiteLeases::new()),
            OpsConfig::default(),
        )
        .unwrap();
        let booking_id = BookingId("bk-0001".to_string());

        session.submit_reading(
            &booking_id,
            ReadingInput {
                temperature_c: 24.0,
                wind_speed_kmh: 8.0,
                wave_height_m: 2.8,
                tide_status: "spring high".to_string(),
            },
        );
        assert_eq!(session.state().flags[&booking_id].status, FlagStatus::Red);
        assert!(session.store().load_reading(&booking_id).unwrap().is_some());

        session.submit_reading(
            &BookingId("bk-0404".to_string()),
            ReadingInput {
                temperature_c: 24.0,
                wind_speed_kmh: 8.0,
                wave_height_m: 0.2,
                tide_status: "low".to_string(),
            },
        );
        assert_eq!(
            session.state().latest_notice().unwrap().level,
            NoticeLevel::Error
        );
    }

    #[test]
    fn test_rejects_invalid_config() {
        let config = OpsConfig {
            utc_offset_minutes: 5_000,
            ..OpsConfig::default()
        };
        assert!(OpsSession::new(MemoryStore::new(), Arc::new(SiteLeases::new()), config).is_err());
    }
}
