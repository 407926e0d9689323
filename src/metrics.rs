//! Energy metrics
//!
//! Power and energy readings are integrated by an [`Accumulator`] and cut
//! into fixed 15 minute slots by a [`Collector`], which persists each
//! completed slot through a [`MetricsStore`] and can rebuild a typical
//! daily profile from the stored history.

use chrono::{DateTime, Duration, Utc};

mod accumulator;
mod collector;
mod sqlite;
mod store;

pub use accumulator::{Accumulator, AccumulatorState};
pub use collector::Collector;
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, MetricsStore, ProfileBucket, SlotRecord};

/// Slot length in seconds
pub const SLOT_SECONDS: i64 = 15 * 60;

/// Number of slots in a day
pub const SLOTS_PER_DAY: usize = 96;

/// Slot length
pub fn slot_duration() -> Duration {
    Duration::seconds(SLOT_SECONDS)
}

/// Start of the slot containing `t`
pub fn slot_start(t: DateTime<Utc>) -> DateTime<Utc> {
    let secs = t.timestamp();
    DateTime::from_timestamp(secs - secs.rem_euclid(SLOT_SECONDS), 0).unwrap_or(t)
}
