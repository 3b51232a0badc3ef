//! ipam - rack and device inventory with an address-space model
//!
//! This library provides:
//! - Inference of the managed /24 from recorded interface addresses
//! - A 254-slot occupancy map reconciled against device records
//! - Bounded-concurrency liveness sweeps with per-probe deadlines
//! - Device ordering and rack grouping for display

pub mod config;
pub mod constants;
pub mod db;
pub mod engine;
pub mod errors;
pub mod model;
pub mod net;
pub mod occupancy;
pub mod sort;
pub mod subnet;
pub mod table;

// Re-export commonly used types for convenience
pub use config::{IpamConfig, ScanConfig};
pub use db::memory::MemoryStore;
pub use db::RecordStore;
pub use engine::{Dashboard, Ipam};
pub use errors::{IpamError, Result};
pub use model::{AddressSlot, Device, DeviceInterface, DeviceStatus, Rack, ScanReport, SlotStatus};
pub use net::probe::{PingLauncher, ProbeLauncher, RunningProbe};
pub use net::scan::LivenessScanner;
pub use occupancy::{build_map, group_by_rack, OccupancyMap};
pub use sort::{DeviceSort, SortKey, SortOrder};
pub use subnet::infer_subnet;
