use crate::config::IpamConfig;
use crate::constants::DEVICE_PING_COUNT;
use crate::db::RecordStore;
use crate::errors::{IpamError, Result};
use crate::model::{PingReport, ScanReport};
use crate::net::probe::{ping_with_output, ProbeLauncher};
use crate::net::scan::LivenessScanner;
use crate::occupancy::{build_map, group_by_rack, DeviceGrouping, OccupancyMap};
use crate::sort::DeviceSort;
use crate::subnet::infer_from_devices;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// Everything the dashboard shows for one request
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    pub subnet: String,
    pub map: OccupancyMap,
    pub groups: DeviceGrouping,
    pub sort: DeviceSort,
}

/// Main engine tying the record store to subnet inference, occupancy
/// mapping and liveness sweeps
pub struct Ipam {
    store: Arc<dyn RecordStore>,
    config: IpamConfig,
    scanner: LivenessScanner,
}

impl Ipam {
    /// Create an engine that probes with the configured ping program
    pub fn new(store: Arc<dyn RecordStore>, config: IpamConfig) -> Self {
        let scanner = LivenessScanner::new(&config.scan);
        Self {
            store,
            config,
            scanner,
        }
    }

    /// Create an engine with a custom probe facility
    pub fn with_launcher(
        store: Arc<dyn RecordStore>,
        config: IpamConfig,
        launcher: Arc<dyn ProbeLauncher>,
    ) -> Self {
        let scanner = LivenessScanner::with_launcher(&config.scan, launcher);
        Self {
            store,
            config,
            scanner,
        }
    }

    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    pub fn config(&self) -> &IpamConfig {
        &self.config
    }

    /// Subnet currently considered managed
    pub fn managed_subnet(&self) -> Result<String> {
        let devices = self.store.all_devices()?;
        Ok(infer_from_devices(&devices, self.config.default_subnet.as_deref()))
    }

    /// Build the dashboard: occupancy map plus devices grouped by rack.
    ///
    /// A failed device read aborts the whole build. A failed rack read only
    /// loses the rack grouping.
    pub fn dashboard(&self, sort: &DeviceSort) -> Result<Dashboard> {
        let devices = self.store.all_devices()?;
        let racks = match self.store.all_racks() {
            Ok(racks) => racks,
            Err(e) => {
                tracing::warn!(error = %e, "Could not fetch racks");
                Vec::new()
            }
        };

        let mut groups = group_by_rack(&racks, &devices);
        for group in groups.rack_groups.iter_mut() {
            sort.apply(&mut group.devices);
        }
        sort.apply(&mut groups.unassigned);

        let subnet = infer_from_devices(&devices, self.config.default_subnet.as_deref());
        let map = build_map(&subnet, &devices);

        tracing::info!(
            subnet = %subnet,
            used = map.used,
            free = map.free,
            usage_percent = map.usage_percent,
            "Built occupancy map"
        );

        Ok(Dashboard {
            subnet,
            map,
            groups,
            sort: *sort,
        })
    }

    /// Sweep the managed subnet and report the addresses that answered.
    ///
    /// Only the device read can fail; once the sweep starts it always
    /// produces a report.
    pub async fn scan(&self) -> Result<ScanReport> {
        let subnet = self.managed_subnet()?;
        let started = Instant::now();
        let active_ips = self.scanner.scan_subnet(&subnet).await;
        tracing::info!(
            subnet = %subnet,
            responding = active_ips.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Scan complete"
        );
        Ok(ScanReport {
            success: true,
            active_ips,
        })
    }

    /// Ping one device with several echo requests and return the raw output.
    ///
    /// `address` must be one of the device's interface addresses; without it
    /// the first interface is used. Problems picking a target are reported in
    /// the returned [`PingReport`] rather than as errors.
    pub async fn ping_device(&self, id: i64, address: Option<&str>) -> Result<PingReport> {
        let device = match self.store.device(id) {
            Ok(device) => device,
            Err(IpamError::NotFound(_)) => return Ok(PingReport::failed("Device not found")),
            Err(e) => return Err(e),
        };

        if device.interfaces.is_empty() {
            return Ok(PingReport::failed("Device has no interfaces configured"));
        }

        let target = match address.filter(|a| !a.is_empty()) {
            Some(requested) => {
                if !device.interfaces.iter().any(|i| i.ip_address == requested) {
                    return Ok(PingReport::failed(
                        "Requested IP does not belong to this device",
                    ));
                }
                requested.to_string()
            }
            None => device.primary_address().to_string(),
        };

        if target.is_empty() {
            return Ok(PingReport::failed("No valid IP address found"));
        }

        match ping_with_output(&self.config.scan.probe_program, DEVICE_PING_COUNT, &target).await {
            Ok((success, output)) => {
                tracing::info!(device_id = id, address = %target, success, "Pinged device");
                Ok(PingReport { success, output })
            }
            Err(e) => {
                tracing::warn!(device_id = id, address = %target, error = %e, "Ping could not run");
                Ok(PingReport::failed(e.to_string()))
            }
        }
    }
}
