use crate::error::Result;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// One completed slot of a metered entity
#[derive(Debug, Clone, PartialEq)]
pub struct SlotRecord {
    /// Slot start, truncated to the slot duration
    pub timestamp: DateTime<Utc>,

    /// Local time of day of the slot start ("HH:MM")
    pub time_of_day: String,

    /// Energy imported during the slot (kWh)
    pub import: f64,

    /// Energy exported during the slot (kWh)
    pub export: f64,
}

/// Average import of one time-of-day slot across days
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileBucket {
    /// Earliest slot start contributing to this bucket
    pub first: DateTime<Utc>,

    /// Local time of day ("HH:MM")
    pub time_of_day: String,

    /// Average energy per slot (kWh)
    pub value: f64,
}

/// Durable slot storage
pub trait MetricsStore: Send + Sync {
    /// Insert or replace the row keyed by (entity, record.timestamp)
    fn persist(&self, entity: &str, record: &SlotRecord) -> Result<()>;

    /// Per time-of-day averages of all slots at or after `from`, ordered
    /// by time of day
    fn profile(&self, entity: &str, from: DateTime<Utc>) -> Result<Vec<ProfileBucket>>;
}

/// In-process store
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<BTreeMap<(String, i64), SlotRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All slots of `entity` in timestamp order
    pub fn records(&self, entity: &str) -> Vec<SlotRecord> {
        self.rows
            .lock()
            .iter()
            .filter(|((e, _), _)| e == entity)
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl MetricsStore for MemoryStore {
    fn persist(&self, entity: &str, record: &SlotRecord) -> Result<()> {
        self.rows.lock().insert(
            (entity.to_string(), record.timestamp.timestamp()),
            record.clone(),
        );
        Ok(())
    }

    fn profile(&self, entity: &str, from: DateTime<Utc>) -> Result<Vec<ProfileBucket>> {
        let rows = self.rows.lock();

        // time of day -> (first, sum, count)
        let mut groups: BTreeMap<&str, (DateTime<Utc>, f64, u32)> = BTreeMap::new();
        for ((e, _), r) in rows.iter() {
            if e != entity || r.timestamp < from {
                continue;
            }
            let g = groups
                .entry(r.time_of_day.as_str())
                .or_insert((r.timestamp, 0.0, 0));
            g.0 = g.0.min(r.timestamp);
            g.1 += r.import;
            g.2 += 1;
        }

        Ok(groups
            .into_iter()
            .map(|(tod, (first, sum, count))| ProfileBucket {
                first,
                time_of_day: tod.to_string(),
                value: sum / f64::from(count),
            })
            .collect())
    }
}
