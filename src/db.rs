use crate::constants::DEFAULT_RACK_STATUS;
use crate::errors::{IpamError, Result};
use crate::model::{Device, DeviceInterface, Rack};
use crate::subnet::normalize_address;

/// Synchronous CRUD access to racks and devices.
///
/// Reads are assumed consistent for the duration of one call; nothing more
/// is required of an implementation.
pub trait RecordStore: Send + Sync {
    /// All devices with their interfaces, most recently updated first
    fn all_devices(&self) -> Result<Vec<Device>>;
    fn device(&self, id: i64) -> Result<Device>;
    fn insert_device(&self, device: Device) -> Result<i64>;
    /// Replace a device and its whole interface list
    fn update_device(&self, device: Device) -> Result<()>;
    /// Remove a device together with its interfaces
    fn delete_device(&self, id: i64) -> Result<()>;

    /// All racks ordered by name
    fn all_racks(&self) -> Result<Vec<Rack>>;
    fn rack(&self, id: i64) -> Result<Rack>;
    fn insert_rack(&self, rack: Rack) -> Result<i64>;
    fn update_rack(&self, rack: Rack) -> Result<()>;
    /// Remove a rack; its devices become unassigned
    fn delete_rack(&self, id: i64) -> Result<()>;
}

/// Clean up interfaces the way they are accepted from an edit form:
/// whitespace is removed from addresses, rows without an address are
/// dropped, hardware address and label are trimmed.
pub fn normalize_interfaces(interfaces: Vec<DeviceInterface>) -> Vec<DeviceInterface> {
    interfaces
        .into_iter()
        .filter_map(|iface| {
            let ip_address = normalize_address(&iface.ip_address);
            if ip_address.is_empty() {
                return None;
            }
            Some(DeviceInterface {
                ip_address,
                mac_address: trimmed(iface.mac_address),
                label: trimmed(iface.label),
                ..iface
            })
        })
        .collect()
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// In-memory record store with JSON snapshots
pub mod memory {
    use super::*;
    use chrono::Utc;
    use serde::{Deserialize, Serialize};
    use std::path::Path;
    use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Snapshot {
        racks: Vec<Rack>,
        devices: Vec<Device>,
        #[serde(default)]
        next_rack_id: i64,
        #[serde(default)]
        next_device_id: i64,
        #[serde(default)]
        next_interface_id: i64,
    }

    impl Snapshot {
        /// Make sure id counters are ahead of anything loaded from disk
        fn reseed(&mut self) {
            let max_rack = self.racks.iter().map(|r| r.id).max().unwrap_or(0);
            let max_device = self.devices.iter().map(|d| d.id).max().unwrap_or(0);
            let max_iface = self
                .devices
                .iter()
                .flat_map(|d| d.interfaces.iter())
                .map(|i| i.id)
                .max()
                .unwrap_or(0);
            self.next_rack_id = self.next_rack_id.max(max_rack);
            self.next_device_id = self.next_device_id.max(max_device);
            self.next_interface_id = self.next_interface_id.max(max_iface);
        }

        fn attach_interfaces(&mut self, device_id: i64, interfaces: Vec<DeviceInterface>) -> Vec<DeviceInterface> {
            normalize_interfaces(interfaces)
                .into_iter()
                .map(|iface| {
                    self.next_interface_id += 1;
                    DeviceInterface {
                        id: self.next_interface_id,
                        device_id,
                        ..iface
                    }
                })
                .collect()
        }

        fn rack_name(&self, rack_id: Option<i64>) -> String {
            rack_id
                .and_then(|id| self.racks.iter().find(|r| r.id == id))
                .map(|r| r.name.clone())
                .unwrap_or_default()
        }
    }

    /// Record store kept in memory behind a lock
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        inner: RwLock<Snapshot>,
    }

    impl MemoryStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Load a store from a JSON snapshot; a missing file yields an empty store
        pub fn open(path: impl AsRef<Path>) -> Result<Self> {
            let path = path.as_ref();
            if !path.exists() {
                tracing::info!(path = %path.display(), "No snapshot found, starting empty");
                return Ok(Self::new());
            }
            let raw = std::fs::read_to_string(path)?;
            let mut snapshot: Snapshot = serde_json::from_str(&raw)?;
            snapshot.reseed();
            tracing::info!(
                path = %path.display(),
                racks = snapshot.racks.len(),
                devices = snapshot.devices.len(),
                "Loaded inventory snapshot"
            );
            Ok(Self {
                inner: RwLock::new(snapshot),
            })
        }

        /// Write the current contents as a JSON snapshot
        pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
            let json = {
                let snapshot = self.read()?;
                serde_json::to_string_pretty(&*snapshot)?
            };
            std::fs::write(path, json)?;
            Ok(())
        }

        fn read(&self) -> Result<RwLockReadGuard<'_, Snapshot>> {
            self.inner
                .read()
                .map_err(|e| IpamError::Store(format!("lock poisoned: {}", e)))
        }

        fn write(&self) -> Result<RwLockWriteGuard<'_, Snapshot>> {
            self.inner
                .write()
                .map_err(|e| IpamError::Store(format!("lock poisoned: {}", e)))
        }
    }

    impl RecordStore for MemoryStore {
        fn all_devices(&self) -> Result<Vec<Device>> {
            let snapshot = self.read()?;
            let mut devices: Vec<Device> = snapshot
                .devices
                .iter()
                .map(|d| Device {
                    rack_name: snapshot.rack_name(d.rack_id),
                    ..d.clone()
                })
                .collect();
            devices.sort_by(|a, b| {
                b.updated_at
                    .cmp(&a.updated_at)
                    .then_with(|| b.id.cmp(&a.id))
            });
            Ok(devices)
        }

        fn device(&self, id: i64) -> Result<Device> {
            let snapshot = self.read()?;
            snapshot
                .devices
                .iter()
                .find(|d| d.id == id)
                .map(|d| Device {
                    rack_name: snapshot.rack_name(d.rack_id),
                    ..d.clone()
                })
                .ok_or_else(|| IpamError::NotFound(format!("device {}", id)))
        }

        fn insert_device(&self, device: Device) -> Result<i64> {
            let mut snapshot = self.write()?;
            snapshot.next_device_id += 1;
            let id = snapshot.next_device_id;
            let interfaces = snapshot.attach_interfaces(id, device.interfaces);
            snapshot.devices.push(Device {
                id,
                rack_name: String::new(),
                updated_at: Utc::now(),
                interfaces,
                ..device
            });
            tracing::debug!(device_id = id, "Inserted device");
            Ok(id)
        }

        fn update_device(&self, device: Device) -> Result<()> {
            let mut snapshot = self.write()?;
            let position = snapshot
                .devices
                .iter()
                .position(|d| d.id == device.id)
                .ok_or_else(|| IpamError::NotFound(format!("device {}", device.id)))?;
            let interfaces = snapshot.attach_interfaces(device.id, device.interfaces);
            snapshot.devices[position] = Device {
                rack_name: String::new(),
                updated_at: Utc::now(),
                interfaces,
                ..device
            };
            Ok(())
        }

        fn delete_device(&self, id: i64) -> Result<()> {
            let mut snapshot = self.write()?;
            let before = snapshot.devices.len();
            snapshot.devices.retain(|d| d.id != id);
            if snapshot.devices.len() == before {
                return Err(IpamError::NotFound(format!("device {}", id)));
            }
            Ok(())
        }

        fn all_racks(&self) -> Result<Vec<Rack>> {
            let mut racks = self.read()?.racks.clone();
            racks.sort_by(|a, b| a.name.cmp(&b.name));
            Ok(racks)
        }

        fn rack(&self, id: i64) -> Result<Rack> {
            self.read()?
                .racks
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| IpamError::NotFound(format!("rack {}", id)))
        }

        fn insert_rack(&self, rack: Rack) -> Result<i64> {
            let mut snapshot = self.write()?;
            snapshot.next_rack_id += 1;
            let id = snapshot.next_rack_id;
            let status = if rack.status.trim().is_empty() {
                DEFAULT_RACK_STATUS.to_string()
            } else {
                rack.status
            };
            snapshot.racks.push(Rack {
                id,
                status,
                created_at: Utc::now(),
                ..rack
            });
            Ok(id)
        }

        fn update_rack(&self, rack: Rack) -> Result<()> {
            let mut snapshot = self.write()?;
            let existing = snapshot
                .racks
                .iter_mut()
                .find(|r| r.id == rack.id)
                .ok_or_else(|| IpamError::NotFound(format!("rack {}", rack.id)))?;
            *existing = Rack {
                created_at: existing.created_at,
                ..rack
            };
            Ok(())
        }

        fn delete_rack(&self, id: i64) -> Result<()> {
            let mut snapshot = self.write()?;
            let before = snapshot.racks.len();
            snapshot.racks.retain(|r| r.id != id);
            if snapshot.racks.len() == before {
                return Err(IpamError::NotFound(format!("rack {}", id)));
            }
            for device in snapshot.devices.iter_mut().filter(|d| d.rack_id == Some(id)) {
                device.rack_id = None;
            }
            Ok(())
        }
    }
}
