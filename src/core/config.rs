// src/core/config.rs

use crate::core::models::PortRange;
use crate::core::scanner::{page_fetcher, port_scanner, subdomain_scanner};
use lazy_static::lazy_static;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

lazy_static! {
    pub static ref ENV_PREFIX: String = env!("CARGO_CRATE_NAME").to_uppercase();
}

/// Tunables for the three tasks.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub connect_timeout: Duration,
    pub port_delay: Duration,
    pub port_range: PortRange,
    pub dns_delay: Duration,
    pub http_timeout: Duration,
    pub download_dir: PathBuf,
    pub retrieve_assets: bool,
    pub wordlist: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            connect_timeout: port_scanner::DEFAULT_CONNECT_TIMEOUT,
            port_delay: port_scanner::DEFAULT_PROBE_DELAY,
            port_range: PortRange::default(),
            dns_delay: subdomain_scanner::DEFAULT_PROBE_DELAY,
            http_timeout: page_fetcher::DEFAULT_HTTP_TIMEOUT,
            download_dir: PathBuf::from(page_fetcher::DEFAULT_DOWNLOAD_DIR),
            retrieve_assets: true,
            wordlist: None,
        }
    }
}

impl Settings {
    /// Defaults overridden by `BLACKBIRD_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`], reading variables through `lookup`.
    /// Values that don't parse are logged and ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let var = |name: &str| {
            let key = format!("{}_{}", ENV_PREFIX.as_str(), name);
            lookup(&key).map(|value| (key, value))
        };

        if let Some(ms) = parse_var::<u64>(var("CONNECT_TIMEOUT_MS")) {
            settings.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(var("PORT_DELAY_MS")) {
            settings.port_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_var::<u64>(var("DNS_DELAY_MS")) {
            settings.dns_delay = Duration::from_millis(ms);
        }
        if let Some(secs) = parse_var::<u64>(var("HTTP_TIMEOUT_SECS")) {
            settings.http_timeout = Duration::from_secs(secs);
        }
        if let Some(range) = parse_var::<PortRange>(var("PORT_RANGE")) {
            settings.port_range = range;
        }
        if let Some((_, dir)) = var("DOWNLOAD_DIR").filter(|(_, v)| !v.trim().is_empty()) {
            settings.download_dir = PathBuf::from(dir.trim());
        }
        if let Some((_, path)) = var("WORDLIST").filter(|(_, v)| !v.trim().is_empty()) {
            settings.wordlist = Some(PathBuf::from(path.trim()));
        }

        debug!(?settings, "Loaded settings.");
        settings
    }
}

fn parse_var<T>(entry: Option<(String, String)>) -> Option<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let (key, value) = entry?;
    match value.trim().parse::<T>() {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!(key = %key, value = %value, error = %e, "Ignoring invalid setting.");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let settings = Settings::default();
        assert_eq!(settings.connect_timeout, Duration::from_millis(400));
        assert_eq!(settings.port_delay, Duration::from_millis(50));
        assert_eq!(settings.port_range, PortRange::new(1, 1024).unwrap());
        assert_eq!(settings.download_dir, PathBuf::from("blackbird_download"));
    }

    #[test]
    fn environment_overrides_apply() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("BLACKBIRD_CONNECT_TIMEOUT_MS", "250"),
            ("BLACKBIRD_PORT_RANGE", "20-25"),
            ("BLACKBIRD_DOWNLOAD_DIR", "out"),
            ("BLACKBIRD_WORDLIST", "/tmp/words.txt"),
        ]));
        assert_eq!(settings.connect_timeout, Duration::from_millis(250));
        assert_eq!(settings.port_range, PortRange::new(20, 25).unwrap());
        assert_eq!(settings.download_dir, PathBuf::from("out"));
        assert_eq!(settings.wordlist, Some(PathBuf::from("/tmp/words.txt")));
    }

    #[test]
    fn invalid_values_keep_defaults() {
        let settings = Settings::from_lookup(lookup_from(&[
            ("BLACKBIRD_PORT_DELAY_MS", "fast"),
            ("BLACKBIRD_PORT_RANGE", "0-10"),
        ]));
        assert_eq!(settings, Settings::default());
    }
}
