use super::store::{MetricsStore, ProfileBucket, SlotRecord};
use crate::error::{LoadshareError, Result};
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{Connection, params};
use std::path::Path;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS meters (
    meter TEXT NOT NULL,
    ts INTEGER NOT NULL,
    time_of_day TEXT NOT NULL,
    import REAL NOT NULL DEFAULT 0,
    export REAL NOT NULL DEFAULT 0,
    PRIMARY KEY (meter, ts)
);
CREATE INDEX IF NOT EXISTS meters_time_of_day ON meters (meter, time_of_day);";

/// SQLite backed slot storage
#[derive(Debug)]
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (and create if needed) the database at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                LoadshareError::io(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// All slots of `entity` in timestamp order
    pub fn slots(&self, entity: &str) -> Result<Vec<SlotRecord>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT ts, time_of_day, import, export FROM meters
             WHERE meter = ?1 ORDER BY ts ASC",
        )?;

        let rows = stmt
            .query_map(params![entity], |row| {
                let ts: i64 = row.get(0)?;
                Ok(SlotRecord {
                    timestamp: DateTime::from_timestamp(ts, 0).unwrap_or_default(),
                    time_of_day: row.get(1)?,
                    import: row.get(2)?,
                    export: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}

impl MetricsStore for SqliteStore {
    fn persist(&self, entity: &str, record: &SlotRecord) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO meters (meter, ts, time_of_day, import, export)
             VALUES (?1, ?2, ?3, ?4, ?5)
             ON CONFLICT(meter, ts) DO UPDATE SET
                time_of_day = excluded.time_of_day,
                import = excluded.import,
                export = excluded.export",
            params![
                entity,
                record.timestamp.timestamp(),
                record.time_of_day,
                record.import,
                record.export
            ],
        )?;
        Ok(())
    }

    fn profile(&self, entity: &str, from: DateTime<Utc>) -> Result<Vec<ProfileBucket>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT MIN(ts), time_of_day, AVG(import) FROM meters
             WHERE meter = ?1 AND ts >= ?2
             GROUP BY time_of_day
             ORDER BY time_of_day ASC",
        )?;

        let rows = stmt
            .query_map(params![entity, from.timestamp()], |row| {
                let ts: i64 = row.get(0)?;
                Ok(ProfileBucket {
                    first: DateTime::from_timestamp(ts, 0).unwrap_or_default(),
                    time_of_day: row.get(1)?,
                    value: row.get(2)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }
}
