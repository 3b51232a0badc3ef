//! Inference of the managed /24 from recorded interface addresses.
//!
//! Every address that normalizes to four dot-separated parts votes for its
//! first three parts, provided those three are numeric octets. The host part
//! is not checked. The most frequent prefix wins, but only once it has been
//! seen at least twice; otherwise the configured default is used. Ties go to
//! the lexicographically smallest prefix so the result is reproducible.

use crate::constants::{DEFAULT_SUBNET, SUBNET_OVERRIDE_FLOOR};
use crate::model::Device;
use std::collections::BTreeMap;

/// Strip every whitespace character from a recorded address
pub fn normalize_address(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// The /24 prefix ("a.b.c") of an address with four dot-separated parts whose
/// first three are numeric octets
pub fn subnet_prefix(raw: &str) -> Option<String> {
    let normalized = normalize_address(raw);
    let parts: Vec<&str> = normalized.split('.').collect();
    if parts.len() != 4 || !parts[..3].iter().all(|p| is_octet(p)) {
        return None;
    }
    Some(parts[..3].join("."))
}

fn is_octet(part: &str) -> bool {
    !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()) && part.parse::<u8>().is_ok()
}

/// Pick the managed subnet prefix for a set of addresses.
///
/// Never fails: empty or fully malformed input yields the default, which is
/// `default_subnet` when given and `192.168.1` otherwise.
pub fn infer_subnet<I, S>(addresses: I, default_subnet: Option<&str>) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for address in addresses {
        if let Some(prefix) = subnet_prefix(address.as_ref()) {
            *counts.entry(prefix).or_insert(0) += 1;
        }
    }

    let mut target = default_subnet.unwrap_or(DEFAULT_SUBNET).to_string();
    let mut best = SUBNET_OVERRIDE_FLOOR;
    // BTreeMap iterates in ascending key order and only a strictly higher
    // count replaces the current pick, so the smallest prefix wins a tie.
    for (prefix, count) in counts {
        if count > best {
            best = count;
            target = prefix;
        }
    }

    tracing::debug!(subnet = %target, votes = best, "Inferred managed subnet");
    target
}

/// Every recorded interface address across a device list
pub fn interface_addresses(devices: &[Device]) -> impl Iterator<Item = &str> {
    devices
        .iter()
        .flat_map(|d| d.interfaces.iter())
        .map(|i| i.ip_address.as_str())
}

/// Convenience wrapper over [`infer_subnet`] for a device list
pub fn infer_from_devices(devices: &[Device], default_subnet: Option<&str>) -> String {
    infer_subnet(interface_addresses(devices), default_subnet)
}
