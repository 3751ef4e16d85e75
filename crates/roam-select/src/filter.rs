//! Candidate eligibility and lookup over a directory snapshot.
//!
//! A mountpoint is eligible when it broadcasts a dual-frequency (L1/L2)
//! carrier and is not on the operator's exclusion list.

use std::collections::HashSet;

use crate::record::MountpointRecord;

/// Minimum carrier level for a usable correction stream (L1+L2).
pub const MIN_CARRIER_LEVEL: u8 = 2;

fn is_eligible(record: &MountpointRecord, excluded: &HashSet<String>) -> bool {
    record.carrier_level >= MIN_CARRIER_LEVEL && !excluded.contains(&record.name)
}

/// First eligible record in ascending-distance order, i.e. the nearest
/// usable base. `records` must already be sorted by distance.
pub fn nearest_eligible<'a>(
    records: &'a [MountpointRecord],
    excluded: &HashSet<String>,
) -> Option<&'a MountpointRecord> {
    records.iter().find(|r| is_eligible(r, excluded))
}

/// Carrier-gated lookup by name, used to re-validate that the currently
/// selected mountpoint still broadcasts an eligible signal.
pub fn eligible_by_name<'a>(
    records: &'a [MountpointRecord],
    name: &str,
) -> Option<&'a MountpointRecord> {
    records
        .iter()
        .find(|r| r.name == name && r.carrier_level >= MIN_CARRIER_LEVEL)
}

/// Ungated lookup by name, for observability only.
pub fn by_name<'a>(records: &'a [MountpointRecord], name: &str) -> Option<&'a MountpointRecord> {
    records.iter().find(|r| r.name == name)
}
