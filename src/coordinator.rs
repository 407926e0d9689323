//! Vehicle ownership arbitration between loadpoints
//!
//! The [`Coordinator`] owns the roster of known vehicles and the mapping of
//! vehicle to owning loadpoint. At most one loadpoint owns a vehicle at a
//! time. Revoking a previous owner calls its [`Loadpoint::set_vehicle`],
//! which is expected to call back into the coordinator; callbacks and
//! vehicle status reads therefore always run after the lock is released.

use crate::loadpoint::{Loadpoint, LoadpointId};
use crate::logging::{StructuredLogger, get_logger};
use crate::vehicle::{Vehicle, VehicleId};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

mod adapter;

pub use adapter::CoordinatorAdapter;

#[derive(Clone)]
struct Owner {
    id: LoadpointId,
    loadpoint: Weak<dyn Loadpoint>,
}

impl Owner {
    /// Tell the loadpoint it lost its vehicle. Must be called unlocked.
    fn revoke(self, logger: &StructuredLogger, vehicle: &Vehicle) {
        if let Some(lp) = self.loadpoint.upgrade() {
            logger.debug(&format!(
                "revoking {} from {}",
                vehicle.title(),
                lp.title()
            ));
            lp.set_vehicle(None);
        }
    }
}

#[derive(Default)]
struct Inner {
    vehicles: Vec<Arc<Vehicle>>,
    tracked: HashMap<VehicleId, Owner>,
}

/// Shared vehicle registry and ownership map
pub struct Coordinator {
    inner: Mutex<Inner>,
    logger: StructuredLogger,
}

impl Coordinator {
    pub fn new(vehicles: Vec<Arc<Vehicle>>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                vehicles,
                tracked: HashMap::new(),
            }),
            logger: get_logger("coordinator"),
        }
    }

    /// Snapshot of the roster
    pub fn get_vehicles(&self) -> Vec<Arc<Vehicle>> {
        self.inner.lock().vehicles.clone()
    }

    /// Roster position of `vehicle`, stable while the roster is unchanged
    pub fn vehicle_index(&self, vehicle: &Vehicle) -> Option<usize> {
        self.inner
            .lock()
            .vehicles
            .iter()
            .position(|v| v.id() == vehicle.id())
    }

    /// Current owner of `vehicle`
    pub fn owner(&self, vehicle: &Vehicle) -> Option<LoadpointId> {
        self.inner.lock().tracked.get(&vehicle.id()).map(|o| o.id)
    }

    /// Register a vehicle; adding a known vehicle again is a no-op
    pub fn add(&self, vehicle: Arc<Vehicle>) {
        let mut inner = self.inner.lock();
        if inner.vehicles.iter().any(|v| v.id() == vehicle.id()) {
            return;
        }
        self.logger.debug(&format!("adding {}", vehicle.title()));
        inner.vehicles.push(vehicle);
    }

    /// Deregister a vehicle, revoking it from its owner
    pub fn delete(&self, vehicle: &Arc<Vehicle>) {
        let revoked = {
            let mut inner = self.inner.lock();
            inner.vehicles.retain(|v| v.id() != vehicle.id());
            inner.tracked.remove(&vehicle.id())
        };

        self.logger.debug(&format!("deleting {}", vehicle.title()));

        if let Some(owner) = revoked {
            owner.revoke(&self.logger, vehicle);
        }
    }

    /// Assign `vehicle` to `owner`, revoking it from any other loadpoint
    pub fn acquire(&self, owner: &Arc<dyn Loadpoint>, vehicle: &Arc<Vehicle>) {
        self.acquire_for(owner.id(), Arc::downgrade(owner), vehicle);
    }

    pub(crate) fn acquire_for(
        &self,
        owner_id: LoadpointId,
        owner: Weak<dyn Loadpoint>,
        vehicle: &Arc<Vehicle>,
    ) {
        let revoked = {
            let mut inner = self.inner.lock();
            let previous = inner.tracked.insert(
                vehicle.id(),
                Owner {
                    id: owner_id,
                    loadpoint: owner,
                },
            );
            previous.filter(|p| p.id != owner_id)
        };

        if let Some(previous) = revoked {
            previous.revoke(&self.logger, vehicle);
        }
    }

    /// Clear ownership of `vehicle` without notifying anyone
    pub fn release(&self, vehicle: &Vehicle) {
        self.inner.lock().tracked.remove(&vehicle.id());
    }

    /// Clear ownership only if `owner` still holds `vehicle`.
    ///
    /// A revoked loadpoint releasing its old vehicle from inside
    /// `set_vehicle` must not undo the new owner's claim.
    pub fn release_from(&self, owner: LoadpointId, vehicle: &Vehicle) {
        let mut inner = self.inner.lock();
        if inner.tracked.get(&vehicle.id()).is_some_and(|o| o.id == owner) {
            inner.tracked.remove(&vehicle.id());
        }
    }

    /// Find the single vehicle that reports being plugged in among those
    /// available to `owner`. Returns `None` if no vehicle, or more than one,
    /// is connected.
    pub fn identify_vehicle_by_status(&self, owner: LoadpointId) -> Option<Arc<Vehicle>> {
        let candidates: Vec<Arc<Vehicle>> = {
            let inner = self.inner.lock();
            inner
                .vehicles
                .iter()
                .filter(|v| v.charge_state().is_some())
                .filter(|v| {
                    inner
                        .tracked
                        .get(&v.id())
                        .is_none_or(|o| o.id == owner)
                })
                .cloned()
                .collect()
        };

        let mut found: Option<Arc<Vehicle>> = None;
        for vehicle in candidates {
            let Some(charge_state) = vehicle.charge_state() else {
                continue;
            };

            let status = match charge_state.status() {
                Ok(status) => status,
                Err(e) => {
                    self.logger
                        .warn(&format!("vehicle status: {}: {}", vehicle.title(), e));
                    continue;
                }
            };

            self.logger
                .debug(&format!("vehicle status: {} ({})", status, vehicle.title()));

            if !status.is_connected() {
                continue;
            }

            if found.is_some() {
                self.logger.warn("vehicle status: >1 matches, giving up");
                return None;
            }

            found = Some(vehicle);
        }

        found
    }
}
