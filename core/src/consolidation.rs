//! Multi-day event consolidation.
//!
//! Events are created as one booking per calendar day sharing a group name.
//! Consolidation collapses each such run back into a single booking whose
//! `end_date_unix` marks the last day, deleting the rest of the run.
//!
//! Planning is pure ([`plan_consolidation`]); [`consolidate_site`] applies a
//! plan against a [`BookingStore`] while holding the site's lease.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};

use crate::calendar::DayClock;
use crate::error::OpsError;
use crate::locks::SiteLeases;
use crate::models::{Booking, BookingId, SiteId};
use crate::storage::{BookingFilter, BookingStore};

/// One group collapsed into its earliest booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMerge {
    pub group_name: String,
    pub keep: BookingId,
    pub end_date_unix: i64,
    pub remove: Vec<BookingId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Two bookings fall on the same calendar day.
    SameDay { day: NaiveDate },
    /// Consecutive bookings are more than one day apart.
    Gap {
        from: NaiveDate,
        to: NaiveDate,
        days: i64,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedGroup {
    pub group_name: String,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsolidationPlan {
    pub merges: Vec<GroupMerge>,
    pub skipped: Vec<SkippedGroup>,
}

impl ConsolidationPlan {
    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    pub fn deleted_count(&self) -> usize {
        self.merges.iter().map(|m| m.remove.len()).sum()
    }
}

/// Result of a consolidation run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsolidationOutcome {
    NoConsecutiveEvents,
    Consolidated {
        groups_merged: usize,
        bookings_deleted: usize,
    },
}

impl ConsolidationOutcome {
    pub fn message(&self) -> String {
        match self {
            ConsolidationOutcome::NoConsecutiveEvents => "No consecutive events found".to_string(),
            ConsolidationOutcome::Consolidated {
                groups_merged,
                bookings_deleted,
            } => format!(
                "Consolidated {groups_merged} event(s), removed {bookings_deleted} duplicate booking(s)"
            ),
        }
    }
}

/// Plan merges for a set of bookings.
///
/// Bookings that are not consolidation candidates are ignored. A group
/// qualifies only when every sorted neighbour is exactly one calendar day
/// apart; anything else leaves the whole group untouched.
pub fn plan_consolidation(bookings: &[Booking], clock: &DayClock) -> ConsolidationPlan {
    let mut groups: BTreeMap<&str, Vec<&Booking>> = BTreeMap::new();
    for booking in bookings.iter().filter(|b| b.is_consolidation_candidate()) {
        if let Some(name) = booking.group_name.as_deref() {
            groups.entry(name).or_default().push(booking);
        }
    }

    let mut plan = ConsolidationPlan::default();
    for (name, mut members) in groups {
        if members.len() < 2 {
            continue;
        }
        members.sort_by(|a, b| {
            a.dive_date_unix
                .cmp(&b.dive_date_unix)
                .then_with(|| a.id.cmp(&b.id))
        });

        match first_break(&members, clock) {
            Some(reason) => {
                debug!("group {name:?} skipped: {reason:?}");
                plan.skipped.push(SkippedGroup {
                    group_name: name.to_string(),
                    reason,
                });
            }
            None => {
                if let Some((first, rest)) = members.split_first() {
                    let last = rest.last().unwrap_or(first);
                    plan.merges.push(GroupMerge {
                        group_name: name.to_string(),
                        keep: first.id.clone(),
                        end_date_unix: last.dive_date_unix,
                        remove: rest.iter().map(|b| b.id.clone()).collect(),
                    });
                }
            }
        }
    }
    plan
}

fn first_break(sorted: &[&Booking], clock: &DayClock) -> Option<SkipReason> {
    sorted.windows(2).find_map(|pair| {
        let from = clock.calendar_day(pair[0].dive_date_unix);
        let to = clock.calendar_day(pair[1].dive_date_unix);
        match (to - from).num_days() {
            1 => None,
            0 => Some(SkipReason::SameDay { day: from }),
            days => Some(SkipReason::Gap { from, to, days }),
        }
    })
}

/// Consolidate one site's grouped bookings.
///
/// Each group merge is applied atomically by the store. If a merge fails the
/// run stops with the error; groups merged before it stay merged.
pub fn consolidate_site<S: BookingStore + ?Sized>(
    store: &mut S,
    leases: &SiteLeases,
    site_id: &SiteId,
    clock: &DayClock,
) -> Result<ConsolidationOutcome, OpsError> {
    let _lease = leases.acquire(site_id)?;

    let candidates =
        store.list_bookings(&BookingFilter::consolidation_candidates(site_id.clone()))?;
    let plan = plan_consolidation(&candidates, clock);
    for skipped in &plan.skipped {
        warn!(
            "site {site_id}: group {:?} not consolidated ({:?})",
            skipped.group_name, skipped.reason
        );
    }

    if plan.is_empty() {
        info!(
            "site {site_id}: no consecutive events among {} candidate(s)",
            candidates.len()
        );
        return Ok(ConsolidationOutcome::NoConsecutiveEvents);
    }

    let mut groups_merged = 0;
    let mut bookings_deleted = 0;
    for merge in &plan.merges {
        if let Err(err) = store.apply_merge(merge) {
            error!(
                "site {site_id}: merging group {:?} failed after {groups_merged} group(s): {err}",
                merge.group_name
            );
            return Err(err.into());
        }
        groups_merged += 1;
        bookings_deleted += merge.remove.len();
    }

    info!("site {site_id}: merged {groups_merged} group(s), deleted {bookings_deleted} booking(s)");
    Ok(ConsolidationOutcome::Consolidated {
        groups_merged,
        bookings_deleted,
    })
}
