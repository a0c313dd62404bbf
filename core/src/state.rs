//! Operator-facing application state.
//!
//! State changes only through [`OpsState::reduce`]. Work that touches the
//! store is requested as an [`Effect`] and its result is fed back in as an
//! [`Action`], so every transition is an explicit, testable function call.

use std::collections::BTreeMap;

use log::debug;

use crate::consolidation::ConsolidationOutcome;
use crate::error::OpsError;
use crate::models::{BookingId, ConditionFlag, EnvironmentalReading, SiteId};

/// Older notices are dropped once this many are queued.
pub const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// A transient message for the operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConsolidationPhase {
    #[default]
    Idle,
    /// Confirmation dialog is open.
    Confirming(SiteId),
    Running(SiteId),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    OpenConsolidation(SiteId),
    CancelConsolidation,
    ConfirmConsolidation,
    ConsolidationFinished(Result<ConsolidationOutcome, OpsError>),
    ReadingSaved(Result<EnvironmentalReading, OpsError>),
    DismissNotice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    RunConsolidation(SiteId),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OpsState {
    pub phase: ConsolidationPhase,
    pub notices: Vec<Notice>,
    /// Latest stored flag per booking
    pub flags: BTreeMap<BookingId, ConditionFlag>,
}

impl OpsState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&mut self, action: Action) -> Option<Effect> {
        match (std::mem::take(&mut self.phase), action) {
            (ConsolidationPhase::Idle, Action::OpenConsolidation(site_id)) => {
                self.phase = ConsolidationPhase::Confirming(site_id);
                None
            }
            (ConsolidationPhase::Confirming(_), Action::CancelConsolidation) => None,
            (ConsolidationPhase::Confirming(site_id), Action::ConfirmConsolidation) => {
                self.phase = ConsolidationPhase::Running(site_id.clone());
                Some(Effect::RunConsolidation(site_id))
            }
            (ConsolidationPhase::Running(_), Action::ConsolidationFinished(result)) => {
                self.push_notice(match result {
                    Ok(outcome @ ConsolidationOutcome::NoConsecutiveEvents) => Notice {
                        level: NoticeLevel::Info,
                        text: outcome.message(),
                    },
                    Ok(outcome) => Notice {
                        level: NoticeLevel::Success,
                        text: outcome.message(),
                    },
                    Err(err) => Notice {
                        level: NoticeLevel::Error,
                        text: format!("Failed to consolidate events: {err}"),
                    },
                });
                None
            }
            (phase, Action::ReadingSaved(result)) => {
                self.phase = phase;
                let notice = match result {
                    Ok(reading) => {
                        let flag = ConditionFlag {
                            status: reading.flag_status,
                            reason: reading.flag_reason,
                        };
                        let text = format!("Conditions recorded: {}", flag.reason);
                        self.flags.insert(reading.booking_id, flag);
                        Notice {
                            level: NoticeLevel::Success,
                            text,
                        }
                    }
                    Err(err) => Notice {
                        level: NoticeLevel::Error,
                        text: format!("Failed to save conditions: {err}"),
                    },
                };
                self.push_notice(notice);
                None
            }
            (phase, Action::DismissNotice) => {
                self.phase = phase;
                if !self.notices.is_empty() {
                    self.notices.remove(0);
                }
                None
            }
            (phase, action) => {
                debug!("ignoring {action:?} in phase {phase:?}");
                self.phase = phase;
                None
            }
        }
    }

    fn push_notice(&mut self, notice: Notice) {
        if self.notices.len() >= MAX_NOTICES {
            self.notices.drain(..=self.notices.len() - MAX_NOTICES);
        }
        self.notices.push(notice);
    }

    pub fn latest_notice(&self) -> Option<&Notice> {
        self.notices.last()
    }
}
