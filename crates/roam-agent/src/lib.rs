//! # roam-agent
//!
//! Field daemon keeping a GNSS rover connected to the nearest usable NTRIP
//! mountpoint. Wires the position feed, the caster directory client, and
//! the selection engine together and publishes the chosen stream for the
//! correction consumer.

pub mod caster;
pub mod feed;
pub mod metrics;
pub mod sink;
pub mod worker;
