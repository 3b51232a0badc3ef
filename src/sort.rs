//! Ordering of device lists for display

use crate::model::Device;
use serde::Serialize;
use std::cmp::Ordering;
use std::net::Ipv4Addr;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Numeric order of the first interface address
    #[serde(rename = "ip")]
    Address,
    /// Case-insensitive hostname order
    Hostname,
}

impl SortKey {
    /// Parse a query-style key (`ip` or `hostname`); anything else means no sort
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "ip" | "address" => Some(SortKey::Address),
            "hostname" => Some(SortKey::Hostname),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    #[default]
    Ascending,
    #[serde(rename = "desc")]
    Descending,
}

impl SortOrder {
    /// `desc` selects descending; anything else is ascending
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("desc") {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Requested ordering for device lists. Without a key the record order is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DeviceSort {
    pub key: Option<SortKey>,
    pub order: SortOrder,
}

impl DeviceSort {
    pub fn new(key: Option<SortKey>, order: SortOrder) -> Self {
        Self { key, order }
    }

    /// Build from the raw `sort` and `order` parameters
    pub fn from_params(sort: Option<&str>, order: Option<&str>) -> Self {
        Self {
            key: sort.and_then(SortKey::parse),
            order: order.map(SortOrder::parse).unwrap_or_default(),
        }
    }

    /// Sort `devices` in place. Stable; a no-op without a key.
    pub fn apply(&self, devices: &mut [Device]) {
        let Some(key) = self.key else {
            return;
        };
        merge_sort_by(devices, &|a: &Device, b: &Device| {
            let ordering = match key {
                SortKey::Address => compare_addresses(a.primary_address(), b.primary_address()),
                SortKey::Hostname => compare_hostnames(&a.hostname, &b.hostname),
            };
            match self.order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        });
    }
}

/// Stable top-down merge sort.
///
/// Unlike `slice::sort_by` it accepts a comparator that is not a total
/// order: every merge step asks a single question ("is the right element
/// strictly smaller?"), so the result is always a permutation of the input.
/// [`compare_addresses`] needs this once parseable and unparseable
/// addresses are mixed.
pub fn merge_sort_by<T, F>(items: &mut [T], compare: &F)
where
    T: Clone,
    F: Fn(&T, &T) -> Ordering,
{
    let len = items.len();
    if len < 2 {
        return;
    }
    let mid = len / 2;
    merge_sort_by(&mut items[..mid], compare);
    merge_sort_by(&mut items[mid..], compare);

    let mut merged = Vec::with_capacity(len);
    let (mut left, mut right) = (0, mid);
    while left < mid && right < len {
        if compare(&items[right], &items[left]) == Ordering::Less {
            merged.push(items[right].clone());
            right += 1;
        } else {
            merged.push(items[left].clone());
            left += 1;
        }
    }
    merged.extend_from_slice(&items[left..mid]);
    merged.extend_from_slice(&items[right..]);
    items.clone_from_slice(&merged);
}

/// Compare two addresses octet by octet when both parse as IPv4, and as
/// plain strings otherwise. Mixed pairs also compare as strings, so this is
/// not a total order; sort with [`merge_sort_by`].
pub fn compare_addresses(a: &str, b: &str) -> Ordering {
    match (Ipv4Addr::from_str(a), Ipv4Addr::from_str(b)) {
        (Ok(x), Ok(y)) => x.octets().cmp(&y.octets()),
        _ => a.cmp(b),
    }
}

pub fn compare_hostnames(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}
