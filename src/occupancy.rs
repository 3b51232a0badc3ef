//! Occupancy map of the managed subnet and the rack partition used for display

use crate::constants::{HOSTS_PER_SUBNET, LAST_HOST_OCTET};
use crate::model::{AddressSlot, Device, DeviceInterface, Rack, SlotStatus};
use crate::subnet::normalize_address;
use serde::Serialize;
use std::collections::HashMap;

/// The 254-slot view of a subnet plus its aggregate counts
#[derive(Debug, Clone, Serialize)]
pub struct OccupancyMap {
    pub subnet: String,
    pub slots: Vec<AddressSlot>,
    pub total: usize,
    pub used: usize,
    pub free: usize,
    /// `used * 100 / total`, truncated
    pub usage_percent: usize,
}

impl OccupancyMap {
    pub fn slot(&self, octet: u8) -> Option<&AddressSlot> {
        self.slots.get(usize::from(octet).checked_sub(1)?)
    }

    pub fn reserved(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.status == SlotStatus::Reserved)
            .count()
    }
}

/// Index every recorded interface by its normalized address.
/// Later devices overwrite earlier ones on a duplicate address.
pub fn address_index(devices: &[Device]) -> HashMap<String, (&Device, &DeviceInterface)> {
    let mut index = HashMap::new();
    for device in devices {
        for iface in &device.interfaces {
            let address = normalize_address(&iface.ip_address);
            if address.is_empty() {
                continue;
            }
            if let Some((previous, _)) = index.insert(address.clone(), (device, iface)) {
                if previous.id != device.id {
                    tracing::debug!(
                        address = %address,
                        kept = device.id,
                        dropped = previous.id,
                        "Duplicate address across devices"
                    );
                }
            }
        }
    }
    index
}

/// Build the occupancy map of `subnet` from the recorded devices.
///
/// Always returns hosts 1 through 254 in ascending order, whatever the input.
pub fn build_map(subnet: &str, devices: &[Device]) -> OccupancyMap {
    let index = address_index(devices);
    let mut slots = Vec::with_capacity(HOSTS_PER_SUBNET);
    let mut used = 0;

    for octet in 1..=LAST_HOST_OCTET {
        let ip = format!("{}.{}", subnet, octet);
        let slot = match index.get(&ip) {
            None => AddressSlot {
                ip,
                octet,
                status: SlotStatus::Free,
                device_id: None,
                hostname: None,
            },
            Some((device, _iface)) => {
                used += 1;
                let status = if device.status.is_reserved() {
                    SlotStatus::Reserved
                } else {
                    SlotStatus::Used
                };
                AddressSlot {
                    ip,
                    octet,
                    status,
                    device_id: Some(device.id),
                    hostname: Some(device.hostname.clone()),
                }
            }
        };
        slots.push(slot);
    }

    let total = HOSTS_PER_SUBNET;
    OccupancyMap {
        subnet: subnet.to_string(),
        slots,
        total,
        used,
        free: total - used,
        usage_percent: used * 100 / total,
    }
}

/// Devices placed in one rack
#[derive(Debug, Clone, Serialize)]
pub struct RackGroup {
    pub rack: Rack,
    pub devices: Vec<Device>,
}

/// Devices partitioned by rack, preserving record order within each group
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeviceGrouping {
    pub rack_groups: Vec<RackGroup>,
    pub unassigned: Vec<Device>,
}

/// Partition devices by rack reference.
///
/// Every rack yields a group (possibly empty), in the order the racks are
/// given. Devices without a rack reference land in `unassigned`. A device
/// pointing at a rack that is not in `racks` is not shown in any rack group.
pub fn group_by_rack(racks: &[Rack], devices: &[Device]) -> DeviceGrouping {
    let mut by_rack: HashMap<i64, Vec<Device>> = HashMap::new();
    let mut unassigned = Vec::new();

    for device in devices {
        match device.rack_id {
            Some(rack_id) => by_rack.entry(rack_id).or_default().push(device.clone()),
            None => unassigned.push(device.clone()),
        }
    }

    let rack_groups = racks
        .iter()
        .map(|rack| RackGroup {
            rack: rack.clone(),
            devices: by_rack.remove(&rack.id).unwrap_or_default(),
        })
        .collect();

    if !by_rack.is_empty() {
        tracing::warn!(
            orphaned_racks = by_rack.len(),
            "Devices reference racks that do not exist"
        );
    }

    DeviceGrouping {
        rack_groups,
        unassigned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DeviceStatus;
    use chrono::Utc;

    fn device(id: i64, status: &str, addrs: &[&str]) -> Device {
        Device {
            id,
            hostname: format!("host{id}"),
            device_type: "Server".into(),
            rack_id: None,
            rack_name: String::new(),
            status: DeviceStatus::from(status),
            description: String::new(),
            updated_at: Utc::now(),
            interfaces: addrs.iter().map(|a| DeviceInterface::new(*a)).collect(),
        }
    }

    #[test]
    fn empty_inventory_is_all_free() {
        let map = build_map("10.0.0", &[]);
        assert_eq!(map.slots.len(), 254);
        assert!(map.slots.iter().all(|s| s.status == SlotStatus::Free));
        assert_eq!((map.used, map.free, map.usage_percent), (0, 254, 0));
        assert_eq!(map.slots[0].ip, "10.0.0.1");
        assert_eq!(map.slots[253].ip, "10.0.0.254");
    }

    #[test]
    fn reserved_device_marks_slot_reserved() {
        let devices = vec![
            device(1, "Reserved", &["10.0.0.7"]),
            device(2, "Online", &["10.0.0.8"]),
        ];
        let map = build_map("10.0.0", &devices);
        assert_eq!(map.slot(7).unwrap().status, SlotStatus::Reserved);
        assert_eq!(map.slot(8).unwrap().status, SlotStatus::Used);
        assert_eq!(map.slot(8).unwrap().hostname.as_deref(), Some("host2"));
        assert_eq!(map.used, 2);
        assert_eq!(map.reserved(), 1);
    }

    #[test]
    fn duplicate_address_keeps_last_device() {
        let devices = vec![
            device(1, "Online", &["10.0.0.9"]),
            device(2, "Reserved", &["10.0.0.9"]),
        ];
        let map = build_map("10.0.0", &devices);
        let slot = map.slot(9).unwrap();
        assert_eq!(slot.device_id, Some(2));
        assert_eq!(slot.status, SlotStatus::Reserved);
        assert_eq!(map.used, 1);
    }

    #[test]
    fn recorded_whitespace_still_matches() {
        let devices = vec![device(1, "Online", &[" 10.0.0.3 "])];
        let map = build_map("10.0.0", &devices);
        assert_eq!(map.slot(3).unwrap().status, SlotStatus::Used);
    }

    #[test]
    fn addresses_outside_subnet_are_ignored() {
        let devices = vec![device(1, "Online", &["10.0.1.3", "10.0.0.0", "10.0.0.255"])];
        let map = build_map("10.0.0", &devices);
        assert_eq!(map.used, 0);
    }

    #[test]
    fn usage_percent_truncates() {
        let half: Vec<Device> = (1..=127)
            .map(|i| device(i, "Online", &[format!("10.0.0.{i}").as_str()]))
            .collect();
        let map = build_map("10.0.0", &half);
        assert_eq!(map.used, 127);
        assert_eq!(map.usage_percent, 50);

        let one = vec![device(1, "Online", &["10.0.0.1"])];
        assert_eq!(build_map("10.0.0", &one).usage_percent, 0);

        let full: Vec<Device> = (1..=254)
            .map(|i| device(i, "Online", &[format!("10.0.0.{i}").as_str()]))
            .collect();
        let map = build_map("10.0.0", &full);
        assert_eq!((map.used, map.free, map.usage_percent), (254, 0, 100));
    }

    #[test]
    fn grouping_keeps_empty_racks_and_unassigned() {
        let racks = vec![
            Rack {
                id: 1,
                name: "A".into(),
                location: String::new(),
                height: 42,
                status: "Online".into(),
                created_at: Utc::now(),
            },
            Rack {
                id: 2,
                name: "B".into(),
                location: String::new(),
                height: 42,
                status: "Online".into(),
                created_at: Utc::now(),
            },
        ];
        let mut in_rack = device(1, "Online", &[]);
        in_rack.rack_id = Some(2);
        let loose = device(2, "Online", &[]);

        let grouping = group_by_rack(&racks, &[in_rack, loose]);
        assert_eq!(grouping.rack_groups.len(), 2);
        assert!(grouping.rack_groups[0].devices.is_empty());
        assert_eq!(grouping.rack_groups[1].devices[0].id, 1);
        assert_eq!(grouping.unassigned.len(), 1);
        assert_eq!(grouping.unassigned[0].id, 2);
    }
}
