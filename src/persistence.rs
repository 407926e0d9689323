//! Persistence of site state across restarts
//!
//! Remembers which vehicle each loadpoint had acquired and the open
//! energy window of each metered entity. Vehicles are stored by roster
//! index and title; a stale entry (roster changed since) is skipped on
//! restore.

use crate::error::Result;
use crate::logging::get_logger;
use crate::metrics::AccumulatorState;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Vehicle reference as stored on disk
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredVehicle {
    /// Roster position at the time of saving
    pub index: usize,

    /// Vehicle title, checked against the roster on restore
    pub title: String,
}

/// Persistent state structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistentState {
    /// Loadpoint title -> acquired vehicle
    #[serde(default)]
    pub assignments: BTreeMap<String, StoredVehicle>,

    /// Metered entity -> accumulator of its open slot
    #[serde(default)]
    pub meters: BTreeMap<String, AccumulatorState>,
}

/// Persistence manager
pub struct PersistenceManager {
    file_path: String,
    state: PersistentState,
    logger: crate::logging::StructuredLogger,
}

impl PersistenceManager {
    pub fn new(file_path: &str) -> Self {
        Self {
            file_path: file_path.to_string(),
            state: PersistentState::default(),
            logger: get_logger("persistence"),
        }
    }

    /// Load state from disk; a missing file leaves the defaults
    pub fn load(&mut self) -> Result<()> {
        let path = Path::new(&self.file_path);

        if !path.exists() {
            self.logger
                .info("No persistent state file found, using defaults");
            return Ok(());
        }

        let contents = std::fs::read_to_string(path)?;
        self.state = serde_json::from_str(&contents)?;
        self.logger.info(&format!(
            "Loaded {} vehicle assignment(s) from disk",
            self.state.assignments.len()
        ));

        Ok(())
    }

    /// Save state to disk
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = Path::new(&self.file_path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(&self.state)?;
        std::fs::write(&self.file_path, contents)?;
        self.logger.debug("Saved persistent state to disk");

        Ok(())
    }

    pub fn state(&self) -> &PersistentState {
        &self.state
    }

    /// Replace the saved meter accumulators
    pub fn set_meters(&mut self, meters: BTreeMap<String, AccumulatorState>) {
        self.state.meters = meters;
    }

    /// Record or clear the vehicle of `loadpoint`
    pub fn set_assignment(&mut self, loadpoint: &str, vehicle: Option<StoredVehicle>) {
        match vehicle {
            Some(v) => {
                self.state.assignments.insert(loadpoint.to_string(), v);
            }
            None => {
                self.state.assignments.remove(loadpoint);
            }
        }
    }
}
