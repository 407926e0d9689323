//! Site wiring
//!
//! A [`Site`] owns the shared coordinator and prioritizer, the site
//! loadpoints and the `home` and `grid` energy collectors, and runs the
//! per-cycle steps that involve all loadpoints at once.

use crate::clock::Clock;
use crate::coordinator::Coordinator;
use crate::error::{LoadshareError, Result};
use crate::loadpoint::{Loadpoint, LoadpointId};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use crate::metrics::{AccumulatorState, Collector, MetricsStore, SLOT_SECONDS, SLOTS_PER_DAY};
use crate::persistence::{PersistentState, StoredVehicle};
use crate::prioritizer::Prioritizer;
use chrono::{Duration, TimeZone, Timelike};
use chrono_tz::Tz;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Collector entity for household consumption
pub const HOME: &str = "home";

/// Collector entity for the grid connection point
pub const GRID: &str = "grid";

/// Grid meter sample
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GridReading {
    /// Instantaneous power (W), positive when importing
    pub power_w: f64,

    /// Absolute import counter (kWh), if the meter has one
    pub import_total_kwh: Option<f64>,

    /// Absolute export counter (kWh), if the meter has one
    pub export_total_kwh: Option<f64>,
}

impl GridReading {
    /// Reading from a meter without energy counters
    pub fn power(power_w: f64) -> Self {
        Self {
            power_w,
            ..Default::default()
        }
    }
}

pub struct Site {
    title: String,
    coordinator: Arc<Coordinator>,
    prioritizer: Prioritizer,
    loadpoints: Vec<Arc<dyn Loadpoint>>,
    home: Collector,
    grid: Collector,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    profile_days: u32,
    logger: StructuredLogger,
}

impl Site {
    pub fn new(
        title: &str,
        coordinator: Arc<Coordinator>,
        loadpoints: Vec<Arc<dyn Loadpoint>>,
        store: Arc<dyn MetricsStore>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
        profile_days: u32,
    ) -> Self {
        Self {
            title: title.to_string(),
            coordinator,
            prioritizer: Prioritizer::new(),
            loadpoints,
            home: Collector::new(HOME, store.clone(), clock.clone(), timezone),
            grid: Collector::new(GRID, store, clock.clone(), timezone),
            clock,
            timezone,
            profile_days,
            logger: get_logger_with_context(
                LogContext::new("site").with_field("site", title.to_string()),
            ),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn coordinator(&self) -> &Arc<Coordinator> {
        &self.coordinator
    }

    pub fn prioritizer(&self) -> &Prioritizer {
        &self.prioritizer
    }

    pub fn loadpoints(&self) -> &[Arc<dyn Loadpoint>] {
        &self.loadpoints
    }

    pub fn home(&self) -> &Collector {
        &self.home
    }

    pub fn grid(&self) -> &Collector {
        &self.grid
    }

    /// Publish every loadpoint's flexibility, then return the power each
    /// loadpoint may reclaim from lower priority loadpoints
    pub fn update_loadpoints(&self) -> Vec<(LoadpointId, f64)> {
        for lp in &self.loadpoints {
            self.prioritizer.update_charge_power_flexibility(lp);
        }

        self.loadpoints
            .iter()
            .map(|lp| {
                (
                    lp.id(),
                    self.prioritizer.get_charge_power_flexibility(lp.as_ref()),
                )
            })
            .collect()
    }

    /// Feed meter readings into the collectors. Both collectors are
    /// updated even if one of them fails; the first error is returned.
    pub fn record_meters(&self, home_power_w: f64, grid: &GridReading) -> Result<()> {
        let home = self.home.add_power(home_power_w);

        let grid = if grid.import_total_kwh.is_some() || grid.export_total_kwh.is_some() {
            let import = grid
                .import_total_kwh
                .map_or(Ok(()), |v| self.grid.set_import_meter_total(v));
            let export = grid
                .export_total_kwh
                .map_or(Ok(()), |v| self.grid.set_export_meter_total(v));
            import.and(export)
        } else {
            self.grid.add_power(grid.power_w)
        };

        home.and(grid)
    }

    /// Expected household energy (Wh) for the next `min_len` slots,
    /// starting with the current one, averaged over the configured history
    pub fn home_profile(&self, min_len: usize) -> Result<Vec<f64>> {
        let now = self.clock.now().with_timezone(&self.timezone);
        let midnight = now
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| self.timezone.from_local_datetime(&t).earliest())
            .ok_or_else(|| LoadshareError::generic("cannot determine local midnight"))?;
        let from =
            midnight.with_timezone(&chrono::Utc) - Duration::days(i64::from(self.profile_days));

        let profile = self.home.profile(from)?;

        let current = (now.num_seconds_from_midnight() as usize) / SLOT_SECONDS as usize;
        let needed = current + min_len;
        let mut slots = Vec::with_capacity(needed + SLOTS_PER_DAY);
        while slots.len() < needed {
            slots.extend_from_slice(&profile);
        }

        let res: Vec<f64> = slots[current..needed].iter().map(|kwh| kwh * 1e3).collect();

        self.logger.debug(&format!(
            "home profile: {} slots from {}",
            res.len(),
            now.format("%H:%M")
        ));

        Ok(res)
    }

    /// Open-slot accumulators of the `home` and `grid` collectors
    pub fn meter_states(&self) -> BTreeMap<String, AccumulatorState> {
        [&self.home, &self.grid]
            .into_iter()
            .map(|c| (c.entity().to_string(), c.accumulator_state()))
            .collect()
    }

    /// Continue the collectors from saved accumulators. Unknown entities
    /// are ignored.
    pub fn restore_meter_states(&self, states: &BTreeMap<String, AccumulatorState>) {
        for collector in [&self.home, &self.grid] {
            if let Some(state) = states.get(collector.entity()) {
                collector.restore(state.clone());
                self.logger
                    .debug(&format!("restored {} meter window", collector.entity()));
            }
        }
    }

    /// Current vehicle assignments keyed by loadpoint title
    pub fn assignments(&self) -> PersistentState {
        let mut state = PersistentState::default();
        for (index, vehicle) in self.coordinator.get_vehicles().iter().enumerate() {
            let Some(owner) = self.coordinator.owner(vehicle) else {
                continue;
            };
            if let Some(lp) = self.loadpoints.iter().find(|lp| lp.id() == owner) {
                state.assignments.insert(
                    lp.title(),
                    StoredVehicle {
                        index,
                        title: vehicle.title().to_string(),
                    },
                );
            }
        }
        state
    }

    /// Re-acquire remembered vehicles. Entries whose roster position no
    /// longer holds the same vehicle are skipped.
    pub fn restore_assignments(&self, state: &PersistentState) {
        let vehicles = self.coordinator.get_vehicles();
        for (title, stored) in &state.assignments {
            let Some(lp) = self.loadpoints.iter().find(|lp| &lp.title() == title) else {
                self.logger
                    .warn(&format!("restore: unknown loadpoint {}", title));
                continue;
            };

            match vehicles.get(stored.index) {
                Some(v) if v.title() == stored.title => {
                    self.coordinator.acquire(lp, v);
                    lp.set_vehicle(Some(v.clone()));
                }
                _ => self.logger.warn(&format!(
                    "restore: vehicle {} no longer at index {}",
                    stored.title, stored.index
                )),
            }
        }
    }
}
