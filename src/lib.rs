//! # Loadshare - resource coordination for multi-loadpoint EV charging
//!
//! Several charging points ("loadpoints") run independent control loops
//! against shared, scarce resources. This crate provides the arbitration
//! and accounting primitives those loops depend on.
//!
//! ## Architecture
//!
//! - `coordinator`: exclusive vehicle ownership and detection by plug state
//! - `prioritizer`: surplus power borrowed from lower priority loadpoints
//! - `metrics`: energy accumulation into persisted 15 minute slots and
//!   daily consumption profiles
//! - `site`: wiring of the above for one site
//! - `loadpoint` / `vehicle`: capability contracts of the external entities
//! - `sim`: simulated loadpoints and vehicles
//! - `clock`: injectable time source
//! - `config`, `logging`, `persistence`, `error`: ambient plumbing

pub mod clock;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod loadpoint;
pub mod logging;
pub mod metrics;
pub mod persistence;
pub mod prioritizer;
pub mod sim;
pub mod site;
pub mod vehicle;

// Re-export commonly used types
pub use config::Config;
pub use coordinator::{Coordinator, CoordinatorAdapter};
pub use error::{LoadshareError, Result};
pub use loadpoint::{Loadpoint, LoadpointId};
pub use metrics::{Accumulator, Collector};
pub use prioritizer::Prioritizer;
pub use site::Site;
pub use vehicle::{ChargeState, ChargeStatus, Vehicle, VehicleId};
