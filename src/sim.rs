//! Simulated loadpoints and vehicle status
//!
//! Stand-ins for real charger and vehicle integrations, driven by
//! configuration in the binary and by hand in tests.

use crate::coordinator::{Coordinator, CoordinatorAdapter};
use crate::error::{LoadshareError, Result};
use crate::loadpoint::{Loadpoint, LoadpointId};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::vehicle::{ChargeState, ChargeStatus, Vehicle};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

/// Settable vehicle plug state
#[derive(Debug)]
pub struct SimChargeState {
    status: Mutex<std::result::Result<ChargeStatus, String>>,
}

impl SimChargeState {
    pub fn new(status: ChargeStatus) -> Self {
        Self {
            status: Mutex::new(Ok(status)),
        }
    }

    pub fn set(&self, status: ChargeStatus) {
        *self.status.lock() = Ok(status);
    }

    /// Make subsequent reads fail with `message`
    pub fn fail(&self, message: &str) {
        *self.status.lock() = Err(message.to_string());
    }
}

impl ChargeState for SimChargeState {
    fn status(&self) -> Result<ChargeStatus> {
        self.status
            .lock()
            .clone()
            .map_err(LoadshareError::status)
    }
}

struct SimState {
    priority: i32,
    flexibility: std::result::Result<f64, String>,
    vehicle: Option<Arc<Vehicle>>,
    revocations: usize,
}

/// Loadpoint with fixed priority and flexibility
pub struct SimLoadpoint {
    id: LoadpointId,
    title: String,
    state: Mutex<SimState>,
    coordinator: CoordinatorAdapter,
    logger: StructuredLogger,
}

impl SimLoadpoint {
    pub fn new(title: &str, priority: i32, coordinator: Arc<Coordinator>) -> Arc<Self> {
        Arc::new_cyclic(|me: &Weak<SimLoadpoint>| {
            let id = LoadpointId::next();
            let owner: Weak<dyn Loadpoint> = me.clone();
            Self {
                id,
                title: title.to_string(),
                state: Mutex::new(SimState {
                    priority,
                    flexibility: Ok(0.0),
                    vehicle: None,
                    revocations: 0,
                }),
                coordinator: CoordinatorAdapter::from_weak(id, owner, coordinator),
                logger: get_logger_with_context(
                    LogContext::new("loadpoint").with_loadpoint(title.to_string()),
                ),
            }
        })
    }

    pub fn coordinator(&self) -> &CoordinatorAdapter {
        &self.coordinator
    }

    pub fn set_priority(&self, priority: i32) {
        self.state.lock().priority = priority;
    }

    /// Flexibility reported from now on; negative values are passed through
    pub fn set_flexibility(&self, power: f64) {
        self.state.lock().flexibility = Ok(power);
    }

    /// Make flexibility reads fail
    pub fn fail_flexibility(&self, message: &str) {
        self.state.lock().flexibility = Err(message.to_string());
    }

    pub fn vehicle(&self) -> Option<Arc<Vehicle>> {
        self.state.lock().vehicle.clone()
    }

    /// Number of times another loadpoint took this loadpoint's vehicle
    pub fn revocations(&self) -> usize {
        self.state.lock().revocations
    }

    /// Switch the active vehicle, releasing the previous one and
    /// acquiring the new one
    pub fn select_vehicle(&self, vehicle: Option<Arc<Vehicle>>) {
        let previous = {
            let mut state = self.state.lock();
            if state.vehicle.as_ref().map(|v| v.id()) == vehicle.as_ref().map(|v| v.id()) {
                return;
            }
            std::mem::replace(&mut state.vehicle, vehicle.clone())
        };

        if let Some(previous) = previous {
            self.coordinator.release(&previous);
        }

        match &vehicle {
            Some(v) => {
                self.coordinator.acquire(v);
                self.logger.info(&format!("vehicle updated: {}", v.title()));
            }
            None => self.logger.info("vehicle updated: none"),
        }
    }

    /// Pick the vehicle that reports being plugged in. A status-capable
    /// vehicle that no longer confirms is dropped.
    pub fn identify_vehicle(&self) -> Option<Arc<Vehicle>> {
        if let Some(vehicle) = self.coordinator.identify_vehicle_by_status() {
            self.select_vehicle(Some(vehicle.clone()));
            return Some(vehicle);
        }

        if self.vehicle().is_some_and(|v| v.charge_state().is_some()) {
            self.select_vehicle(None);
        }

        None
    }
}

impl Loadpoint for SimLoadpoint {
    fn id(&self) -> LoadpointId {
        self.id
    }

    fn title(&self) -> String {
        self.title.clone()
    }

    fn priority(&self) -> i32 {
        self.state.lock().priority
    }

    fn charge_power_flexibility(&self) -> Result<f64> {
        self.state
            .lock()
            .flexibility
            .clone()
            .map_err(LoadshareError::status)
    }

    fn set_vehicle(&self, vehicle: Option<Arc<Vehicle>>) {
        if vehicle.is_none() && self.vehicle().is_some() {
            self.state.lock().revocations += 1;
        }
        self.select_vehicle(vehicle);
    }
}
