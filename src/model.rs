use crate::constants::RESERVED_STATUS;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A physical equipment rack
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rack {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: String,
    /// Height in rack units
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// One recorded network interface of a device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceInterface {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub device_id: i64,
    /// Free-form address as entered; may be empty or malformed
    #[serde(default)]
    pub ip_address: String,
    #[serde(default)]
    pub mac_address: Option<String>,
    /// e.g. "LAN", "WAN", "Management"
    #[serde(default)]
    pub label: Option<String>,
}

impl DeviceInterface {
    pub fn new(ip_address: impl Into<String>) -> Self {
        Self {
            id: 0,
            device_id: 0,
            ip_address: ip_address.into(),
            mac_address: None,
            label: None,
        }
    }
}

/// Lifecycle status of a device. The set is open-ended; anything that is
/// not one of the known values is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceStatus {
    #[default]
    Online,
    Offline,
    Reserved,
    Other(String),
}

impl DeviceStatus {
    pub fn as_str(&self) -> &str {
        match self {
            DeviceStatus::Online => "Online",
            DeviceStatus::Offline => "Offline",
            DeviceStatus::Reserved => RESERVED_STATUS,
            DeviceStatus::Other(s) => s.as_str(),
        }
    }

    pub fn is_reserved(&self) -> bool {
        matches!(self, DeviceStatus::Reserved)
    }
}

impl From<String> for DeviceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Online" => DeviceStatus::Online,
            "Offline" => DeviceStatus::Offline,
            RESERVED_STATUS => DeviceStatus::Reserved,
            _ => DeviceStatus::Other(value),
        }
    }
}

impl From<&str> for DeviceStatus {
    fn from(value: &str) -> Self {
        DeviceStatus::from(value.to_string())
    }
}

impl From<DeviceStatus> for String {
    fn from(status: DeviceStatus) -> Self {
        match status {
            DeviceStatus::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for DeviceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A managed network device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Device {
    pub id: i64,
    pub hostname: String,
    #[serde(default)]
    pub device_type: String,
    /// `None` means the device is unassigned
    #[serde(default)]
    pub rack_id: Option<i64>,
    /// Display name of the referenced rack, filled in by the store
    #[serde(default)]
    pub rack_name: String,
    #[serde(default)]
    pub status: DeviceStatus,
    #[serde(default)]
    pub description: String,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub interfaces: Vec<DeviceInterface>,
}

impl Device {
    /// Address of the first recorded interface, or an empty string
    pub fn primary_address(&self) -> &str {
        self.interfaces
            .first()
            .map(|i| i.ip_address.as_str())
            .unwrap_or("")
    }

    pub fn is_unassigned(&self) -> bool {
        self.rack_id.is_none()
    }
}

/// Occupancy state of one host address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotStatus {
    Free,
    Used,
    Reserved,
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SlotStatus::Free => "Free",
            SlotStatus::Used => "Used",
            SlotStatus::Reserved => "Reserved",
        };
        f.write_str(s)
    }
}

/// One of the 254 usable host addresses of the managed subnet.
/// Derived on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AddressSlot {
    pub ip: String,
    pub octet: u8,
    pub status: SlotStatus,
    pub device_id: Option<i64>,
    pub hostname: Option<String>,
}

/// JSON body returned by a subnet sweep
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanReport {
    pub success: bool,
    pub active_ips: Vec<String>,
}

/// JSON body returned by a single-device ping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PingReport {
    pub success: bool,
    pub output: String,
}

impl PingReport {
    pub fn failed(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        let status: DeviceStatus = serde_json::from_str("\"Reserved\"").unwrap();
        assert!(status.is_reserved());

        let custom: DeviceStatus = serde_json::from_str("\"Maintenance\"").unwrap();
        assert_eq!(custom, DeviceStatus::Other("Maintenance".to_string()));
        assert_eq!(serde_json::to_string(&custom).unwrap(), "\"Maintenance\"");
    }

    #[test]
    fn missing_status_defaults_to_online() {
        assert_eq!(DeviceStatus::default(), DeviceStatus::Online);
        let device: Device = serde_json::from_str(r#"{"id": 4, "hostname": "sw4"}"#).unwrap();
        assert_eq!(device.status, DeviceStatus::Online);
    }

    #[test]
    fn status_match_is_case_sensitive() {
        assert!(!DeviceStatus::from("reserved").is_reserved());
    }

    #[test]
    fn device_without_interfaces_has_empty_primary_address() {
        let device = Device {
            id: 1,
            hostname: "sw1".into(),
            device_type: String::new(),
            rack_id: None,
            rack_name: String::new(),
            status: DeviceStatus::Online,
            description: String::new(),
            updated_at: Utc::now(),
            interfaces: Vec::new(),
        };
        assert_eq!(device.primary_address(), "");
        assert!(device.is_unassigned());
    }
}
