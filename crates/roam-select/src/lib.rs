//! # roam-select
//!
//! Nearest-mountpoint selection engine for NTRIP correction streams.
//!
//! Given a stream of position fixes and a caster directory, decides which
//! mountpoint a moving rover should pull corrections from, switching as the
//! rover moves while guarding against oscillation between near-equidistant
//! bases.
//!
//! ## Crate structure
//!
//! - [`record`] — directory entries with boundary validation
//! - [`filter`] — candidate eligibility and lookup
//! - [`decision`] — the stay/switch hysteresis state machine
//! - [`engine`] — per-cycle evaluation and selection state
//! - [`slot`] — the externally visible selection slot
//! - [`directory`] — caster-directory collaborator interface
//! - [`config`] — TOML configuration

pub mod config;
pub mod decision;
pub mod directory;
pub mod engine;
pub mod filter;
pub mod record;
pub mod slot;
