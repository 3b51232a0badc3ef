/// Prefix used when nothing in the inventory points at a managed subnet
pub const DEFAULT_SUBNET: &str = "192.168.1";

/// Usable host addresses in a /24 (hosts 1 through 254)
pub const HOSTS_PER_SUBNET: usize = 254;

/// Highest usable host octet
pub const LAST_HOST_OCTET: u8 = 254;

/// A prefix must be seen more often than this to replace the default subnet
pub const SUBNET_OVERRIDE_FLOOR: usize = 1;

/// Device status that marks an address as held but not in use
pub const RESERVED_STATUS: &str = "Reserved";

/// Status given to racks that are stored without one
pub const DEFAULT_RACK_STATUS: &str = "Online";

pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 500;
pub const DEFAULT_MAX_CONCURRENT_PROBES: usize = 20;
pub const DEFAULT_PROBE_PROGRAM: &str = "ping";

/// Echo requests sent when checking a single device by hand
pub const DEVICE_PING_COUNT: &str = "3";

pub const DEFAULT_STORE_PATH: &str = "ipam.json";
