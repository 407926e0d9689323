#![allow(dead_code)]

use loadshare::error::{LoadshareError, Result};
use loadshare::{Loadpoint, LoadpointId, Vehicle, VehicleId};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::mpsc;
use std::time::Duration;

type Callback = Box<dyn Fn() + Send + Sync>;

/// Loadpoint recording every `set_vehicle` call
pub struct RecordingLoadpoint {
    id: LoadpointId,
    priority: i32,
    flexibility: Mutex<Result<f64>>,
    calls: Mutex<Vec<Option<VehicleId>>>,
    on_set_vehicle: Mutex<Option<Callback>>,
}

impl RecordingLoadpoint {
    pub fn new(priority: i32) -> Arc<Self> {
        Arc::new(Self {
            id: LoadpointId::next(),
            priority,
            flexibility: Mutex::new(Ok(0.0)),
            calls: Mutex::new(Vec::new()),
            on_set_vehicle: Mutex::new(None),
        })
    }

    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn Loadpoint> {
        self.clone()
    }

    pub fn calls(&self) -> Vec<Option<VehicleId>> {
        self.calls.lock().clone()
    }

    pub fn set_flexibility(&self, power: f64) {
        *self.flexibility.lock() = Ok(power);
    }

    pub fn fail_flexibility(&self) {
        *self.flexibility.lock() = Err(LoadshareError::status("meter offline"));
    }

    /// Run `f` from inside every `set_vehicle` call
    pub fn on_set_vehicle(&self, f: impl Fn() + Send + Sync + 'static) {
        *self.on_set_vehicle.lock() = Some(Box::new(f));
    }
}

impl Loadpoint for RecordingLoadpoint {
    fn id(&self) -> LoadpointId {
        self.id
    }

    fn priority(&self) -> i32 {
        self.priority
    }

    fn charge_power_flexibility(&self) -> Result<f64> {
        match &*self.flexibility.lock() {
            Ok(v) => Ok(*v),
            Err(e) => Err(LoadshareError::status(e.to_string())),
        }
    }

    fn set_vehicle(&self, vehicle: Option<Arc<Vehicle>>) {
        self.calls.lock().push(vehicle.map(|v| v.id()));
        if let Some(f) = &*self.on_set_vehicle.lock() {
            f();
        }
    }
}

/// Run `f` on another thread and fail if it does not finish in time
pub fn completes_within(secs: u64, f: impl FnOnce() + Send + 'static) {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        f();
        let _ = tx.send(());
    });
    rx.recv_timeout(Duration::from_secs(secs))
        .expect("operation did not complete, likely deadlocked");
}
