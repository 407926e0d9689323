use super::accumulator::{Accumulator, AccumulatorState};
use super::store::{MetricsStore, SlotRecord};
use super::{SLOTS_PER_DAY, slot_duration, slot_start};
use crate::clock::Clock;
use crate::error::{LoadshareError, Result};
use crate::logging::{LogContext, StructuredLogger, get_logger_with_context};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use parking_lot::Mutex;
use std::sync::Arc;

struct Window {
    accumulator: Accumulator,
    started: Option<DateTime<Utc>>,
}

/// Slot-aligned energy ledger for one metered entity.
///
/// When a mutation lands in a new slot and the current window spans at
/// least one full slot, the window's import/export is persisted under its
/// slot start and the accumulator is zeroed. A partial first window is
/// dropped instead. If persisting fails the window is kept as is and the
/// same slot is written again on the next call.
pub struct Collector {
    entity: String,
    store: Arc<dyn MetricsStore>,
    clock: Arc<dyn Clock>,
    timezone: Tz,
    window: Mutex<Window>,
    logger: StructuredLogger,
}

impl Collector {
    pub fn new(
        entity: &str,
        store: Arc<dyn MetricsStore>,
        clock: Arc<dyn Clock>,
        timezone: Tz,
    ) -> Self {
        let logger =
            get_logger_with_context(LogContext::new("metrics").with_entity(entity.to_string()));
        let accumulator = Accumulator::new(clock.clone()).with_logger(logger.clone());

        Self {
            entity: entity.to_string(),
            store,
            clock,
            timezone,
            window: Mutex::new(Window {
                accumulator,
                started: None,
            }),
            logger,
        }
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn add_import_energy(&self, v: f64) -> Result<()> {
        self.process(|acc| acc.add_import_energy(v))
    }

    pub fn add_export_energy(&self, v: f64) -> Result<()> {
        self.process(|acc| acc.add_export_energy(v))
    }

    pub fn set_import_meter_total(&self, v: f64) -> Result<()> {
        self.process(|acc| acc.set_import_meter_total(v))
    }

    pub fn set_export_meter_total(&self, v: f64) -> Result<()> {
        self.process(|acc| acc.set_export_meter_total(v))
    }

    pub fn add_power(&self, v: f64) -> Result<()> {
        self.process(|acc| acc.add_power(v))
    }

    /// Energy accumulated in the open window (import, export) in kWh
    pub fn pending(&self) -> (f64, f64) {
        let window = self.window.lock();
        (window.accumulator.import(), window.accumulator.export())
    }

    /// Start of the open window
    pub fn window_start(&self) -> Option<DateTime<Utc>> {
        self.window.lock().started
    }

    pub fn accumulator_state(&self) -> AccumulatorState {
        self.window.lock().accumulator.state()
    }

    /// Continue from a saved accumulator. The window reopens at the slot
    /// of the last update, so the restored energy lands in that slot.
    pub fn restore(&self, state: AccumulatorState) {
        let mut window = self.window.lock();
        window.started = state.updated.map(slot_start);
        window.accumulator.restore(state);
    }

    fn process(&self, mutate: impl FnOnce(&mut Accumulator)) -> Result<()> {
        let mut window = self.window.lock();
        let now = self.clock.now();
        let started = *window.started.get_or_insert(now);

        mutate(&mut window.accumulator);

        if now < started {
            self.logger.warn(&format!(
                "clock went backwards before window start {}, keeping window",
                started.to_rfc3339()
            ));
            return Ok(());
        }

        let boundary = slot_start(now);
        if boundary <= started {
            return Ok(());
        }

        if boundary - started >= slot_duration() {
            let slot = slot_start(started);
            let record = SlotRecord {
                timestamp: slot,
                time_of_day: slot.with_timezone(&self.timezone).format("%H:%M").to_string(),
                import: window.accumulator.import(),
                export: window.accumulator.export(),
            };

            if let Err(e) = self.store.persist(&self.entity, &record) {
                self.logger.error(&format!(
                    "persisting slot {} failed: {}",
                    record.time_of_day, e
                ));
                return Err(e);
            }

            self.logger.debug(&format!(
                "slot {}: {:.3}kWh import, {:.3}kWh export",
                record.time_of_day, record.import, record.export
            ));
        } else {
            self.logger.debug(&format!(
                "dropping partial window started at {}",
                started.to_rfc3339()
            ));
        }

        window.accumulator.reset();
        window.started = Some(boundary);

        Ok(())
    }

    /// Average energy per slot of day (kWh), 00:00 first, over all slots
    /// stored at or after `from`
    pub fn profile(&self, from: DateTime<Utc>) -> Result<[f64; SLOTS_PER_DAY]> {
        let buckets = self.store.profile(&self.entity, from)?;
        if buckets.len() != SLOTS_PER_DAY {
            return Err(LoadshareError::incomplete_profile(
                buckets.len(),
                SLOTS_PER_DAY,
            ));
        }

        let mut res = [0.0; SLOTS_PER_DAY];
        for (slot, bucket) in res.iter_mut().zip(&buckets) {
            *slot = bucket.value;
        }

        Ok(res)
    }
}
