//! Vehicles known to the site
//!
//! A [`Vehicle`] is an opaque identity with a title. Vehicles whose
//! integration can report the plug state carry a [`ChargeState`]
//! capability, attached when the vehicle is registered.

use crate::error::{LoadshareError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VEHICLE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique vehicle handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VehicleId(u64);

impl VehicleId {
    fn next() -> Self {
        Self(NEXT_VEHICLE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "vehicle#{}", self.0)
    }
}

/// IEC 61851 control pilot states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeStatus {
    /// Disconnected
    A,
    /// Connected, not charging
    B,
    /// Charging
    C,
    /// Charging with ventilation
    D,
    /// Error, no power
    E,
    /// Error, EVSE not available
    F,
}

impl ChargeStatus {
    /// Whether a vehicle is plugged in
    pub fn is_connected(self) -> bool {
        matches!(self, ChargeStatus::B | ChargeStatus::C)
    }
}

impl fmt::Display for ChargeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChargeStatus::A => "A",
            ChargeStatus::B => "B",
            ChargeStatus::C => "C",
            ChargeStatus::D => "D",
            ChargeStatus::E => "E",
            ChargeStatus::F => "F",
        };
        f.write_str(s)
    }
}

impl FromStr for ChargeStatus {
    type Err = LoadshareError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "A" => Ok(ChargeStatus::A),
            "B" => Ok(ChargeStatus::B),
            "C" => Ok(ChargeStatus::C),
            "D" => Ok(ChargeStatus::D),
            "E" => Ok(ChargeStatus::E),
            "F" => Ok(ChargeStatus::F),
            _ => Err(LoadshareError::status(format!(
                "invalid charge status: {}",
                s
            ))),
        }
    }
}

/// Optional capability: the vehicle can report its plug state
pub trait ChargeState: Send + Sync {
    fn status(&self) -> Result<ChargeStatus>;
}

/// A vehicle registered with the site
pub struct Vehicle {
    id: VehicleId,
    title: String,
    charge_state: Option<Arc<dyn ChargeState>>,
}

impl Vehicle {
    /// Vehicle without status introspection
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            id: VehicleId::next(),
            title: title.into(),
            charge_state: None,
        }
    }

    /// Vehicle that can report its charge status
    pub fn with_charge_state<S: Into<String>>(
        title: S,
        charge_state: Arc<dyn ChargeState>,
    ) -> Self {
        Self {
            id: VehicleId::next(),
            title: title.into(),
            charge_state: Some(charge_state),
        }
    }

    pub fn id(&self) -> VehicleId {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn charge_state(&self) -> Option<&Arc<dyn ChargeState>> {
        self.charge_state.as_ref()
    }
}

impl PartialEq for Vehicle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vehicle {}

impl fmt::Debug for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Vehicle")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("charge_state", &self.charge_state.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_letters_roundtrip() {
        for s in ["A", "B", "C", "D", "E", "F"] {
            let status: ChargeStatus = s.parse().unwrap();
            assert_eq!(status.to_string(), s);
        }
        assert_eq!("c".parse::<ChargeStatus>().unwrap(), ChargeStatus::C);
        assert!("X".parse::<ChargeStatus>().is_err());
    }

    #[test]
    fn only_b_and_c_are_connected() {
        assert!(!ChargeStatus::A.is_connected());
        assert!(ChargeStatus::B.is_connected());
        assert!(ChargeStatus::C.is_connected());
        assert!(!ChargeStatus::E.is_connected());
    }

    #[test]
    fn identity_is_per_instance() {
        let a = Vehicle::new("same");
        let b = Vehicle::new("same");
        assert_ne!(a, b);
        assert_eq!(a, a);
        assert!(a.charge_state().is_none());
    }
}
