use chrono::{DateTime, Duration, TimeZone, Utc};
use loadshare::Collector;
use loadshare::clock::MockClock;
use loadshare::metrics::{MetricsStore, SLOTS_PER_DAY, SlotRecord, SqliteStore};
use std::sync::Arc;

fn midnight() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
}

fn record(ts: DateTime<Utc>, import: f64, export: f64) -> SlotRecord {
    SlotRecord {
        timestamp: ts,
        time_of_day: ts.format("%H:%M").to_string(),
        import,
        export,
    }
}

#[test]
fn persist_replaces_existing_slot() {
    let store = SqliteStore::open_in_memory().unwrap();
    store.persist("grid", &record(midnight(), 1.0, 0.0)).unwrap();
    store.persist("grid", &record(midnight(), 1.5, 0.2)).unwrap();
    store.persist("home", &record(midnight(), 9.0, 0.0)).unwrap();

    let slots = store.slots("grid").unwrap();
    assert_eq!(slots, vec![record(midnight(), 1.5, 0.2)]);
    assert_eq!(store.slots("home").unwrap().len(), 1);
    assert!(store.slots("pv").unwrap().is_empty());
}

#[test]
fn profile_groups_by_time_of_day() {
    let store = SqliteStore::open_in_memory().unwrap();
    let t = midnight() + Duration::hours(12);
    store.persist("home", &record(t, 1.0, 0.0)).unwrap();
    store
        .persist("home", &record(t + Duration::days(1), 3.0, 0.0))
        .unwrap();
    store
        .persist("home", &record(t + Duration::minutes(15), 0.5, 0.0))
        .unwrap();
    store
        .persist("home", &record(midnight() - Duration::days(1), 100.0, 0.0))
        .unwrap();

    let buckets = store.profile("home", midnight()).unwrap();
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].time_of_day, "12:00");
    assert_eq!(buckets[0].first, t);
    assert!((buckets[0].value - 2.0).abs() < 1e-9);
    assert_eq!(buckets[1].time_of_day, "12:15");
    assert!((buckets[1].value - 0.5).abs() < 1e-9);
}

#[test]
fn file_backed_history_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("metrics.db");

    {
        let store = SqliteStore::open(&path).unwrap();
        for slot in 0..SLOTS_PER_DAY {
            let ts = midnight() + Duration::minutes(15 * slot as i64);
            store.persist("home", &record(ts, 0.2, 0.0)).unwrap();
        }
    }

    let store: Arc<dyn MetricsStore> = Arc::new(SqliteStore::open(&path).unwrap());
    let collector = Collector::new(
        "home",
        store,
        Arc::new(MockClock::new(midnight() + Duration::days(1))),
        chrono_tz::UTC,
    );

    let profile = collector.profile(midnight()).unwrap();
    assert!(profile.iter().all(|v| (v - 0.2).abs() < 1e-9));
}
