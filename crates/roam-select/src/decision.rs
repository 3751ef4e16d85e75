//! # Stay/Switch Decision — Hysteresis State Machine
//!
//! The per-cycle transition function: given the current selection and a
//! fresh directory snapshot, keep the stream or name its replacement.
//!
//! ## Policy
//!
//! A vanished or forbidden current stream is abandoned immediately; no
//! hysteresis applies when the stream went bad. An eligible current stream
//! inside the critical radius is kept unconditionally, even when a strictly
//! nearer base exists. Beyond the critical radius, the hysteresis margin is
//! added to the *current* base's distance before comparing, so any strictly
//! nearer candidate wins the comparison. Both of the latter behaviors are
//! deliberate and pinned by tests.

use crate::config::SelectionConfig;
use crate::filter;
use crate::record::MountpointRecord;

/// Why the engine kept the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayReason {
    /// No eligible candidate within range.
    NoCandidate,
    /// The nearest eligible base is already selected.
    AlreadyNearest,
    /// Current base is within the critical radius; switching is suppressed
    /// regardless of nearer candidates.
    WithinCriticalRadius,
    /// The candidate did not beat the current distance plus the margin.
    InsideHysteresisMargin,
}

/// Why the engine switched away from the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchReason {
    /// Nothing selected yet.
    NoCurrent,
    /// Current mountpoint no longer broadcasts an eligible L1/L2 signal.
    CurrentVanished,
    /// Current mountpoint is on the exclusion list.
    CurrentExcluded,
    /// A nearer base beat the hysteresis comparison.
    NearerCandidate,
}

/// Outcome of one decision cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    Stay(StayReason),
    Switch { target: String, reason: SwitchReason },
}

/// Decides whether to keep the current mountpoint or switch to the nearest
/// eligible one. `records` must be sorted ascending by distance.
pub fn decide(
    records: &[MountpointRecord],
    current: Option<&str>,
    config: &SelectionConfig,
) -> Decision {
    let Some(nearest) = filter::nearest_eligible(records, &config.excluded_mountpoints) else {
        return Decision::Stay(StayReason::NoCandidate);
    };

    let Some(current) = current else {
        return Decision::Switch {
            target: nearest.name.clone(),
            reason: SwitchReason::NoCurrent,
        };
    };

    if nearest.name == current {
        return Decision::Stay(StayReason::AlreadyNearest);
    }

    if config.excluded_mountpoints.contains(current) {
        return Decision::Switch {
            target: nearest.name.clone(),
            reason: SwitchReason::CurrentExcluded,
        };
    }

    let Some(current_record) = filter::eligible_by_name(records, current) else {
        return Decision::Switch {
            target: nearest.name.clone(),
            reason: SwitchReason::CurrentVanished,
        };
    };

    if current_record.distance_km <= config.critical_distance_km {
        return Decision::Stay(StayReason::WithinCriticalRadius);
    }

    if current_record.distance_km + config.hysteresis_km > nearest.distance_km {
        Decision::Switch {
            target: nearest.name.clone(),
            reason: SwitchReason::NearerCandidate,
        }
    } else {
        Decision::Stay(StayReason::InsideHysteresisMargin)
    }
}
