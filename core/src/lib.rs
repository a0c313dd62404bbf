pub mod calendar;
pub mod conditions;
pub mod config;
pub mod consolidation;
pub mod error;
pub mod ffi;
pub mod locks;
pub mod memory_store;
pub mod migrations;
pub mod models;
pub mod readings;
pub mod session;
pub mod sqlite_store;
pub mod state;
pub mod storage;

uniffi::include_scaffolding!("dive_ops");

pub use calendar::{calendar_spans, expand_event, spans_on, CalendarSpan, DayClock, EventDraft};
pub use conditions::{classify_conditions, ConditionThresholds};
pub use config::OpsConfig;
pub use consolidation::{
    consolidate_site, plan_consolidation, ConsolidationOutcome, ConsolidationPlan, GroupMerge,
    SkipReason, SkippedGroup,
};
pub use error::{OpsError, StoreError};
pub use ffi::{plan_booking_merges, BookingRecord, FfiError, MergeRecord};
pub use locks::{SiteLease, SiteLeases};
pub use memory_store::MemoryStore;
pub use models::{
    Booking, BookingId, BookingStatus, ConditionFlag, EnvironmentalReading, FlagStatus,
    NewBooking, PaymentStatus, ReadingInput, SiteId,
};
pub use readings::{submit_reading, validate_reading};
pub use session::OpsSession;
pub use sqlite_store::SqliteStore;
pub use state::{Action, ConsolidationPhase, Effect, Notice, NoticeLevel, OpsState};
pub use storage::{BookingFilter, BookingStore};
