//! Directory entries returned by a caster directory query.

use thiserror::Error;

/// Error raised when a directory entry fails boundary validation.
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("mountpoint name is empty")]
    EmptyName,
    #[error("distance for `{name}` is not a finite number")]
    NonFiniteDistance { name: String },
    #[error("distance for `{name}` is negative: {distance_km}")]
    NegativeDistance { name: String, distance_km: f64 },
}

/// One caster directory entry: a named correction stream and how far its
/// reference station is from the rover.
///
/// Immutable snapshot item; recreated on every directory query, never
/// mutated in place.
#[derive(Debug, Clone, PartialEq)]
pub struct MountpointRecord {
    /// Mountpoint name as advertised by the caster.
    pub name: String,
    /// Signal-carrier quality level (0 = none, 1 = L1, 2 = L1+L2).
    pub carrier_level: u8,
    /// Great-circle distance from the rover in kilometres.
    pub distance_km: f64,
}

impl MountpointRecord {
    /// Validates and builds a record.
    ///
    /// Directory clients must construct records through this, so a
    /// malformed sourcetable entry is rejected at the client boundary
    /// instead of surfacing at some later lookup.
    pub fn new(
        name: impl Into<String>,
        carrier_level: u8,
        distance_km: f64,
    ) -> Result<Self, RecordError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(RecordError::EmptyName);
        }
        if !distance_km.is_finite() {
            return Err(RecordError::NonFiniteDistance { name });
        }
        if distance_km < 0.0 {
            return Err(RecordError::NegativeDistance { name, distance_km });
        }
        Ok(MountpointRecord {
            name,
            carrier_level,
            distance_km,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_record() {
        let record = MountpointRecord::new("TLSE", 2, 12.5).unwrap();
        assert_eq!(record.name, "TLSE");
        assert_eq!(record.carrier_level, 2);
        assert_eq!(record.distance_km, 12.5);
    }

    #[test]
    fn empty_name_rejected() {
        assert_eq!(
            MountpointRecord::new("  ", 2, 1.0),
            Err(RecordError::EmptyName)
        );
    }

    #[test]
    fn non_finite_distance_rejected() {
        assert!(matches!(
            MountpointRecord::new("TLSE", 2, f64::NAN),
            Err(RecordError::NonFiniteDistance { .. })
        ));
    }

    #[test]
    fn negative_distance_rejected() {
        assert!(matches!(
            MountpointRecord::new("TLSE", 2, -0.1),
            Err(RecordError::NegativeDistance { .. })
        ));
    }

    #[test]
    fn zero_distance_is_valid() {
        assert!(MountpointRecord::new("TLSE", 3, 0.0).is_ok());
    }
}
