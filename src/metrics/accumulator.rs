use crate::clock::Clock;
use crate::logging::{StructuredLogger, get_logger};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Persistable accumulator values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccumulatorState {
    /// Last absolute import meter reading (kWh)
    pub import_total: Option<f64>,

    /// Last absolute export meter reading (kWh)
    pub export_total: Option<f64>,

    /// Accumulated import (kWh)
    pub import: f64,

    /// Accumulated export (kWh)
    pub export: f64,

    /// Time of the last update
    pub updated: Option<DateTime<Utc>>,
}

/// Running import/export energy counter.
///
/// Energy only grows from deltas between consecutive meter totals,
/// explicit energy deltas, or power integrated over the time since the
/// previous update. The first observation only sets the baseline.
pub struct Accumulator {
    clock: Arc<dyn Clock>,
    state: AccumulatorState,
    logger: StructuredLogger,
}

impl Accumulator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: AccumulatorState::default(),
            logger: get_logger("metrics"),
        }
    }

    pub(crate) fn with_logger(mut self, logger: StructuredLogger) -> Self {
        self.logger = logger;
        self
    }

    /// Accumulated import energy in kWh
    pub fn import(&self) -> f64 {
        self.state.import
    }

    /// Accumulated export energy in kWh
    pub fn export(&self) -> f64 {
        self.state.export
    }

    pub fn updated(&self) -> Option<DateTime<Utc>> {
        self.state.updated
    }

    pub fn add_import_energy(&mut self, v: f64) {
        if self.state.updated.is_some() {
            self.state.import += v;
        }
        self.state.updated = Some(self.clock.now());
    }

    pub fn add_export_energy(&mut self, v: f64) {
        if self.state.updated.is_some() {
            self.state.export += v;
        }
        self.state.updated = Some(self.clock.now());
    }

    pub fn set_import_meter_total(&mut self, v: f64) {
        match self.state.import_total {
            Some(prev) if v >= prev => self.add_import_energy(v - prev),
            Some(prev) => {
                self.logger.warn(&format!(
                    "import meter went backwards ({:.3} -> {:.3}kWh), assuming reset",
                    prev, v
                ));
                self.state.updated = Some(self.clock.now());
            }
            None => self.state.updated = Some(self.clock.now()),
        }
        self.state.import_total = Some(v);
    }

    pub fn set_export_meter_total(&mut self, v: f64) {
        match self.state.export_total {
            Some(prev) if v >= prev => self.add_export_energy(v - prev),
            Some(prev) => {
                self.logger.warn(&format!(
                    "export meter went backwards ({:.3} -> {:.3}kWh), assuming reset",
                    prev, v
                ));
                self.state.updated = Some(self.clock.now());
            }
            None => self.state.updated = Some(self.clock.now()),
        }
        self.state.export_total = Some(v);
    }

    /// Integrate power `v` (W) over the time since the last update.
    /// Positive power is imported, negative power exported.
    pub fn add_power(&mut self, v: f64) {
        let Some(updated) = self.state.updated else {
            self.state.updated = Some(self.clock.now());
            return;
        };

        let elapsed = self.clock.since(updated);
        if elapsed < Duration::zero() {
            self.logger.warn(&format!(
                "clock went backwards by {}s, skipping power sample",
                -elapsed.num_seconds()
            ));
            self.state.updated = Some(self.clock.now());
            return;
        }

        let energy = v * hours(elapsed) / 1e3;
        if energy >= 0.0 {
            self.add_import_energy(energy);
        } else {
            self.add_export_energy(-energy);
        }
    }

    /// Zero the accumulated import/export, keeping baselines
    pub fn reset(&mut self) {
        self.state.import = 0.0;
        self.state.export = 0.0;
    }

    pub fn state(&self) -> AccumulatorState {
        self.state.clone()
    }

    pub fn restore(&mut self, state: AccumulatorState) {
        self.state = state;
    }
}

fn hours(d: Duration) -> f64 {
    d.num_milliseconds() as f64 / 3_600_000.0
}
