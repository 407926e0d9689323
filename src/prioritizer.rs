//! Surplus power prioritization between loadpoints
//!
//! Every control cycle a loadpoint publishes how much of its charge power
//! it could give up, then asks how much it may reclaim from loadpoints of
//! strictly lower priority. There is no global scheduling pass; the last
//! published value per loadpoint wins.

use crate::loadpoint::{Loadpoint, LoadpointId};
use crate::logging::{StructuredLogger, get_logger};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, Weak};

struct Demand {
    loadpoint: Weak<dyn Loadpoint>,
    power: f64,
}

/// Flexible power published by each loadpoint
pub struct Prioritizer {
    demand: Mutex<HashMap<LoadpointId, Demand>>,
    logger: StructuredLogger,
}

impl Prioritizer {
    pub fn new() -> Self {
        Self {
            demand: Mutex::new(HashMap::new()),
            logger: get_logger("prioritizer"),
        }
    }

    /// Record `lp`'s current flexibility. Negative values and read errors
    /// keep the previous entry.
    pub fn update_charge_power_flexibility(&self, lp: &Arc<dyn Loadpoint>) {
        let power = match lp.charge_power_flexibility() {
            Ok(power) if power >= 0.0 => power,
            Ok(_) => return,
            Err(e) => {
                self.logger
                    .debug(&format!("{}: flexibility unavailable: {}", lp.title(), e));
                return;
            }
        };

        self.logger
            .trace(&format!("{}: publishing {:.0}W", lp.title(), power));
        self.demand.lock().insert(
            lp.id(),
            Demand {
                loadpoint: Arc::downgrade(lp),
                power,
            },
        );
    }

    /// Sum of the flexibility published by other loadpoints with strictly
    /// lower priority than `lp`
    pub fn get_charge_power_flexibility(&self, lp: &dyn Loadpoint) -> f64 {
        let id = lp.id();
        let prio = lp.priority();

        // priorities are read unlocked, loadpoints may guard them with their own locks
        let others: Vec<(Arc<dyn Loadpoint>, f64)> = {
            let mut demand = self.demand.lock();
            demand.retain(|_, d| d.loadpoint.strong_count() > 0);
            demand
                .iter()
                .filter(|(other, _)| **other != id)
                .filter_map(|(_, d)| d.loadpoint.upgrade().map(|lp| (lp, d.power)))
                .collect()
        };

        let mut reduce_by = 0.0;
        let mut msg = String::new();

        for (other, power) in others {
            if other.priority() < prio && power > 0.0 {
                reduce_by += power;
                msg.push_str(&format!("{}: {:.0}W ", other.title(), power));
            }
        }

        if reduce_by > 0.0 {
            self.logger.debug(&format!(
                "{} prioritized over {}(total {:.0}W)",
                lp.title(),
                msg,
                reduce_by
            ));
        }

        reduce_by
    }

    /// Forget `lp`'s published flexibility
    pub fn remove(&self, lp: LoadpointId) {
        self.demand.lock().remove(&lp);
    }
}

impl Default for Prioritizer {
    fn default() -> Self {
        Self::new()
    }
}
