//! Per-cycle evaluation: directory result in, stay/switch effect out.
//!
//! [`SelectionEngine`] owns the one piece of mutable state in the system
//! and is driven strictly sequentially by the scheduler: one `apply` per
//! evaluation cycle, never concurrent.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SelectionConfig;
use crate::decision::{self, Decision, StayReason};
use crate::directory::DirectoryError;
use crate::filter;
use crate::record::MountpointRecord;
use crate::slot::SelectionSlot;

/// The currently selected mountpoint, if any. Read and written exactly
/// once per evaluation cycle; once set, the name always comes from a
/// record the directory returned as a candidate.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionState {
    current: Option<String>,
}

impl SelectionState {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    fn select(&mut self, name: String) {
        self.current = Some(name);
    }
}

/// What one evaluation cycle did.
#[derive(Debug, Clone, PartialEq)]
pub enum EvaluationOutcome {
    /// Directory query failed; prior selection retained untouched.
    Skipped(DirectoryError),
    /// Current selection kept, including the no-candidate case.
    Kept,
    /// Switched to a new mountpoint and published it to the slot.
    SwitchedTo(String),
}

/// Stateful mountpoint selection engine.
pub struct SelectionEngine {
    config: SelectionConfig,
    state: SelectionState,
    slot: Arc<SelectionSlot>,
}

impl SelectionEngine {
    pub fn new(config: SelectionConfig, slot: Arc<SelectionSlot>) -> Self {
        SelectionEngine {
            config,
            state: SelectionState::default(),
            slot,
        }
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Name of the currently selected mountpoint, if any.
    pub fn current(&self) -> Option<&str> {
        self.state.current()
    }

    /// Runs one evaluation cycle against a directory snapshot.
    ///
    /// A failed query never touches state or slot; the next cycle is the
    /// retry. A switch publishes to the slot exactly once.
    pub fn apply(
        &mut self,
        result: Result<Vec<MountpointRecord>, DirectoryError>,
    ) -> EvaluationOutcome {
        let mut records = match result {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "directory query failed, keeping previous selection");
                return EvaluationOutcome::Skipped(err);
            }
        };

        // The upstream ordering contract is not trusted; sort before filtering.
        records.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));

        match decision::decide(&records, self.state.current(), &self.config) {
            Decision::Switch { target, reason } => {
                info!(mountpoint = %target, ?reason, "switching for the nearest mountpoint");
                self.slot.publish(&target);
                self.state.select(target.clone());
                self.log_connected(&records);
                EvaluationOutcome::SwitchedTo(target)
            }
            Decision::Stay(StayReason::NoCandidate) => {
                warn!("no base in the area");
                EvaluationOutcome::Kept
            }
            Decision::Stay(reason) => {
                debug!(?reason, "keeping current mountpoint");
                self.log_connected(&records);
                EvaluationOutcome::Kept
            }
        }
    }

    /// Live-distance observability line for the active selection.
    fn log_connected(&self, records: &[MountpointRecord]) {
        let Some(current) = self.state.current() else {
            return;
        };
        if let Some(record) = filter::by_name(records, current) {
            let distance_km = (record.distance_km * 1000.0).round() / 1000.0;
            info!(mountpoint = %current, distance_km, "connected to mountpoint");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config(excluded: &[&str]) -> SelectionConfig {
        SelectionConfig {
            gps_topic: "127.0.0.1:7700".into(),
            caster_address: "caster.test".into(),
            caster_port: 2101,
            excluded_mountpoints: excluded.iter().map(|s| s.to_string()).collect(),
            max_distance_km: 50.0,
            hysteresis_km: 1.0,
            critical_distance_km: 15.0,
            evaluation_hz: 0.2,
            query_timeout: Duration::from_secs(10),
        }
    }

    fn engine(excluded: &[&str]) -> (SelectionEngine, Arc<SelectionSlot>) {
        let slot = Arc::new(SelectionSlot::new());
        (SelectionEngine::new(config(excluded), slot.clone()), slot)
    }

    fn records(entries: &[(&str, u8, f64)]) -> Vec<MountpointRecord> {
        entries
            .iter()
            .map(|&(name, carrier, dist)| MountpointRecord::new(name, carrier, dist).unwrap())
            .collect()
    }

    // ─── Switching ──────────────────────────────────────────────────────

    #[test]
    fn first_evaluation_selects_and_publishes() {
        let (mut engine, slot) = engine(&[]);
        let outcome = engine.apply(Ok(records(&[("TLSE", 3, 5.0), ("AUCH", 2, 8.0)])));
        assert_eq!(outcome, EvaluationOutcome::SwitchedTo("TLSE".into()));
        assert_eq!(engine.current(), Some("TLSE"));

        let active = slot.load();
        assert_eq!(active.stream_name, "TLSE");
        assert!(active.is_new_stream);
    }

    #[test]
    fn unsorted_snapshot_is_sorted_before_filtering() {
        let (mut engine, _slot) = engine(&[]);
        let outcome = engine.apply(Ok(records(&[("FAR", 3, 40.0), ("NEAR", 2, 3.0)])));
        assert_eq!(outcome, EvaluationOutcome::SwitchedTo("NEAR".into()));
    }

    #[test]
    fn excluded_name_never_becomes_current() {
        let (mut engine, _slot) = engine(&["BANNED"]);
        let outcome = engine.apply(Ok(records(&[("BANNED", 3, 1.0), ("TLSE", 2, 9.0)])));
        assert_eq!(outcome, EvaluationOutcome::SwitchedTo("TLSE".into()));
        assert_eq!(engine.current(), Some("TLSE"));
    }

    // ─── Keeping ────────────────────────────────────────────────────────

    #[test]
    fn repeated_evaluations_keep_without_republishing() {
        let (mut engine, slot) = engine(&[]);
        let snapshot = records(&[("TLSE", 3, 5.0), ("AUCH", 2, 8.0)]);
        engine.apply(Ok(snapshot.clone()));
        slot.acknowledge();

        for _ in 0..3 {
            assert_eq!(engine.apply(Ok(snapshot.clone())), EvaluationOutcome::Kept);
        }
        // No republish: the acknowledged snapshot is still in place.
        let active = slot.load();
        assert_eq!(active.stream_name, "TLSE");
        assert!(!active.is_new_stream);
    }

    #[test]
    fn empty_snapshot_keeps_current_selection() {
        let (mut engine, _slot) = engine(&[]);
        engine.apply(Ok(records(&[("TLSE", 3, 5.0)])));
        assert_eq!(engine.apply(Ok(vec![])), EvaluationOutcome::Kept);
        assert_eq!(engine.current(), Some("TLSE"));
    }

    // ─── Failure Isolation ──────────────────────────────────────────────

    #[test]
    fn failed_query_changes_nothing() {
        let (mut engine, slot) = engine(&[]);
        engine.apply(Ok(records(&[("TLSE", 3, 5.0)])));
        let before = slot.load();

        let outcome = engine.apply(Err(DirectoryError::TimedOut));
        assert_eq!(outcome, EvaluationOutcome::Skipped(DirectoryError::TimedOut));
        assert_eq!(engine.current(), Some("TLSE"));
        assert!(Arc::ptr_eq(&before, &slot.load()));

        let outcome = engine.apply(Err(DirectoryError::ConnectionFailed("refused".into())));
        assert!(matches!(outcome, EvaluationOutcome::Skipped(_)));
        assert_eq!(engine.current(), Some("TLSE"));
        assert!(Arc::ptr_eq(&before, &slot.load()));
    }

    #[test]
    fn failed_first_query_leaves_engine_unselected() {
        let (mut engine, slot) = engine(&[]);
        engine.apply(Err(DirectoryError::TimedOut));
        assert_eq!(engine.current(), None);
        assert!(slot.load().stream_name.is_empty());
    }
}
