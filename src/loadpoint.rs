//! Loadpoint capability contract
//!
//! Loadpoints run their own control loops; the coordination core only
//! needs the handful of methods in [`Loadpoint`].

use crate::error::Result;
use crate::vehicle::Vehicle;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_LOADPOINT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique loadpoint handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LoadpointId(u64);

impl LoadpointId {
    /// Allocate a fresh handle
    pub fn next() -> Self {
        Self(NEXT_LOADPOINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for LoadpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lp#{}", self.0)
    }
}

/// What the coordinator and prioritizer require from a loadpoint
pub trait Loadpoint: Send + Sync {
    fn id(&self) -> LoadpointId;

    fn title(&self) -> String {
        self.id().to_string()
    }

    fn priority(&self) -> i32;

    /// Charge power in watts that could be given up without stopping
    fn charge_power_flexibility(&self) -> Result<f64>;

    /// Assign or revoke the active vehicle.
    ///
    /// May be called from another loadpoint's call stack, and may call
    /// back into the coordinator.
    fn set_vehicle(&self, vehicle: Option<Arc<Vehicle>>);
}
