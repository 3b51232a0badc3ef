use crate::constants::{
    DEFAULT_MAX_CONCURRENT_PROBES, DEFAULT_PROBE_PROGRAM, DEFAULT_PROBE_TIMEOUT_MS,
    DEFAULT_STORE_PATH,
};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration settings for liveness sweeps
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Deadline in milliseconds for a single probe, enforced by the scanner
    /// regardless of any timeout flags given to the probe program
    pub probe_timeout_ms: u64,

    /// Maximum number of probes allowed to run at the same time
    pub max_concurrent_probes: usize,

    /// External program used as the liveness probe
    pub probe_program: String,

    /// Arguments passed before the target address
    pub probe_args: Vec<String>,
}

impl ScanConfig {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Set the admission gate width; zero is clamped to one
    pub fn set_concurrency(&mut self, jobs: usize) {
        self.max_concurrent_probes = jobs.max(1);
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            max_concurrent_probes: DEFAULT_MAX_CONCURRENT_PROBES,
            probe_program: DEFAULT_PROBE_PROGRAM.to_string(),
            probe_args: vec!["-c".to_string(), "1".to_string()],
        }
    }
}

/// Top-level settings handed to the engine
#[derive(Debug, Clone)]
pub struct IpamConfig {
    /// Subnet prefix (three dotted octets) shown when the inventory does not
    /// point at one. Treated as opaque.
    pub default_subnet: Option<String>,

    /// JSON snapshot backing the bundled record store
    pub store_path: PathBuf,

    pub scan: ScanConfig,
}

impl Default for IpamConfig {
    fn default() -> Self {
        Self {
            default_subnet: None,
            store_path: PathBuf::from(DEFAULT_STORE_PATH),
            scan: ScanConfig::default(),
        }
    }
}

impl IpamConfig {
    /// Build the configuration from the process environment, loading `.env`
    /// first when one exists
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            tracing::debug!("No .env file found");
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        config.default_subnet = lookup("IP_RANGE_START")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());

        if let Some(path) = lookup("DB_PATH").filter(|v| !v.trim().is_empty()) {
            config.store_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("IPAM_SCAN_CONCURRENCY") {
            match raw.trim().parse::<usize>() {
                Ok(jobs) => config.scan.set_concurrency(jobs),
                Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring IPAM_SCAN_CONCURRENCY"),
            }
        }

        if let Some(raw) = lookup("IPAM_PROBE_TIMEOUT_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.scan.probe_timeout_ms = ms,
                Ok(_) => tracing::warn!("IPAM_PROBE_TIMEOUT_MS must be positive, keeping default"),
                Err(e) => tracing::warn!(value = %raw, error = %e, "Ignoring IPAM_PROBE_TIMEOUT_MS"),
            }
        }

        if let Some(program) = lookup("IPAM_PING_PROGRAM").filter(|v| !v.trim().is_empty()) {
            config.scan.probe_program = program;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_sweep_contract() {
        let config = IpamConfig::from_lookup(|_| None);
        assert_eq!(config.default_subnet, None);
        assert_eq!(config.scan.probe_timeout_ms, 500);
        assert_eq!(config.scan.max_concurrent_probes, 20);
        assert_eq!(config.scan.probe_program, "ping");
        assert_eq!(config.store_path, PathBuf::from("ipam.json"));
    }

    #[test]
    fn reads_overrides() {
        let config = IpamConfig::from_lookup(lookup_from(&[
            ("IP_RANGE_START", " 10.1.2 "),
            ("DB_PATH", "/tmp/inventory.json"),
            ("IPAM_SCAN_CONCURRENCY", "8"),
            ("IPAM_PROBE_TIMEOUT_MS", "250"),
        ]));
        assert_eq!(config.default_subnet.as_deref(), Some("10.1.2"));
        assert_eq!(config.store_path, PathBuf::from("/tmp/inventory.json"));
        assert_eq!(config.scan.max_concurrent_probes, 8);
        assert_eq!(config.scan.probe_timeout(), Duration::from_millis(250));
    }

    #[test]
    fn empty_subnet_counts_as_unset() {
        let config = IpamConfig::from_lookup(lookup_from(&[("IP_RANGE_START", "")]));
        assert_eq!(config.default_subnet, None);
    }

    #[test]
    fn bad_numbers_keep_defaults() {
        let config = IpamConfig::from_lookup(lookup_from(&[
            ("IPAM_SCAN_CONCURRENCY", "lots"),
            ("IPAM_PROBE_TIMEOUT_MS", "0"),
        ]));
        assert_eq!(config.scan.max_concurrent_probes, 20);
        assert_eq!(config.scan.probe_timeout_ms, 500);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config = IpamConfig::from_lookup(lookup_from(&[("IPAM_SCAN_CONCURRENCY", "0")]));
        assert_eq!(config.scan.max_concurrent_probes, 1);
    }
}
