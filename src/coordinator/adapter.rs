use super::Coordinator;
use crate::loadpoint::{Loadpoint, LoadpointId};
use crate::vehicle::Vehicle;
use std::sync::{Arc, Weak};

/// Coordinator view bound to a single loadpoint
#[derive(Clone)]
pub struct CoordinatorAdapter {
    owner_id: LoadpointId,
    owner: Weak<dyn Loadpoint>,
    coordinator: Arc<Coordinator>,
}

impl CoordinatorAdapter {
    pub fn new(owner: &Arc<dyn Loadpoint>, coordinator: Arc<Coordinator>) -> Self {
        Self::from_weak(owner.id(), Arc::downgrade(owner), coordinator)
    }

    /// Build from a weak handle, e.g. inside `Arc::new_cyclic`
    pub fn from_weak(
        owner_id: LoadpointId,
        owner: Weak<dyn Loadpoint>,
        coordinator: Arc<Coordinator>,
    ) -> Self {
        Self {
            owner_id,
            owner,
            coordinator,
        }
    }

    pub fn owner_id(&self) -> LoadpointId {
        self.owner_id
    }

    pub fn get_vehicles(&self) -> Vec<Arc<Vehicle>> {
        self.coordinator.get_vehicles()
    }

    pub fn vehicle_index(&self, vehicle: &Vehicle) -> Option<usize> {
        self.coordinator.vehicle_index(vehicle)
    }

    pub fn acquire(&self, vehicle: &Arc<Vehicle>) {
        self.coordinator
            .acquire_for(self.owner_id, self.owner.clone(), vehicle);
    }

    /// Give up `vehicle` if this loadpoint still owns it
    pub fn release(&self, vehicle: &Vehicle) {
        self.coordinator.release_from(self.owner_id, vehicle);
    }

    pub fn identify_vehicle_by_status(&self) -> Option<Arc<Vehicle>> {
        self.coordinator.identify_vehicle_by_status(self.owner_id)
    }
}
