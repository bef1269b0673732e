// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;
use std::path::PathBuf;
use strum::{Display, EnumIter};
use url::{Host, Url};

// --- Targets ---

/// A host or URL as typed by the user. Only checked for being non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTarget(String);

impl ScanTarget {
    /// Trims the input and rejects it if nothing is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The target as a URL string, assuming `https://` when no scheme was given.
    pub fn as_url(&self) -> String {
        if has_http_scheme(&self.0) {
            self.0.clone()
        } else {
            format!("https://{}", self.0)
        }
    }

    /// The host part of the target. Falls back to the raw input when it
    /// doesn't parse as a URL.
    pub fn host(&self) -> String {
        Url::parse(&self.as_url())
            .ok()
            .and_then(|url| match url.host()? {
                // host_str() keeps the brackets around IPv6 literals.
                Host::Ipv6(ip) => Some(ip.to_string()),
                host => Some(host.to_string()),
            })
            .unwrap_or_else(|| self.0.clone())
    }
}

/// Schemes are case-insensitive, so `HTTP://host` already counts as a URL.
fn has_http_scheme(raw: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        raw.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An inclusive range of TCP ports. `start` is at least 1 and never above `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawPortRange")]
pub struct PortRange {
    start: u16,
    end: u16,
}

impl PortRange {
    pub fn new(start: u16, end: u16) -> Option<Self> {
        if start == 0 || end < start {
            None
        } else {
            Some(Self { start, end })
        }
    }

    pub fn start(&self) -> u16 {
        self.start
    }

    pub fn end(&self) -> u16 {
        self.end
    }

    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    // A valid range always holds at least one port.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn ports(&self) -> RangeInclusive<u16> {
        self.start..=self.end
    }
}

// Deserialized ranges go through `PortRange::new` like every other one.
#[derive(Deserialize)]
struct RawPortRange {
    start: u16,
    end: u16,
}

impl TryFrom<RawPortRange> for PortRange {
    type Error = String;

    fn try_from(raw: RawPortRange) -> Result<Self, Self::Error> {
        PortRange::new(raw.start, raw.end).ok_or_else(|| format!("Invalid port range {}-{}", raw.start, raw.end))
    }
}

impl Default for PortRange {
    fn default() -> Self {
        Self { start: 1, end: 1024 }
    }
}

impl std::str::FromStr for PortRange {
    type Err = String;

    /// Parses `start-end`, or a single port.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (start, end) = match s.split_once('-') {
            Some((a, b)) => (a.trim(), b.trim()),
            None => (s.trim(), s.trim()),
        };
        let start: u16 = start.parse().map_err(|e| format!("Invalid start port '{}': {}", start, e))?;
        let end: u16 = end.parse().map_err(|e| format!("Invalid end port '{}': {}", end, e))?;
        PortRange::new(start, end).ok_or_else(|| format!("Invalid port range {}-{}", start, end))
    }
}

// --- Task Bookkeeping ---

/// The three kinds of task the engine knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter)]
pub enum TaskKind {
    #[strum(to_string = "Port Scan")]
    PortScan,
    #[strum(to_string = "Page Fetch")]
    PageFetch,
    #[strum(to_string = "Subdomains")]
    SubdomainProbe,
}

impl TaskKind {
    /// Short machine-friendly name, used for export file names.
    pub fn slug(&self) -> &'static str {
        match self {
            TaskKind::PortScan => "portscan",
            TaskKind::PageFetch => "pagefetch",
            TaskKind::SubdomainProbe => "subdomains",
        }
    }
}

/// Lifecycle of a task as seen by its observer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum TaskState {
    #[default]
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl TaskState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Cancelled | TaskState::Failed)
    }
}

/// An asset that was downloaded and written to disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedAsset {
    pub url: String,
    pub path: PathBuf,
}

/// A single hit reported through `found`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Finding {
    OpenPort(u16),
    Subdomain(String),
    Asset(SavedAsset),
}

impl From<u16> for Finding {
    fn from(port: u16) -> Self {
        Finding::OpenPort(port)
    }
}

impl From<String> for Finding {
    fn from(hostname: String) -> Self {
        Finding::Subdomain(hostname)
    }
}

impl From<SavedAsset> for Finding {
    fn from(asset: SavedAsset) -> Self {
        Finding::Asset(asset)
    }
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Finding::OpenPort(port) => write!(f, "port {} open", port),
            Finding::Subdomain(host) => write!(f, "{}", host),
            Finding::Asset(asset) => write!(f, "{} -> {}", asset.url, asset.path.display()),
        }
    }
}

/// The payload of a `finished` event. Frozen once emitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskResult {
    OpenPorts(Vec<u16>),
    Download { folder: PathBuf, saved: Vec<SavedAsset> },
    Subdomains(Vec<String>),
}

// --- Export ---

/// Everything known about one run of a task, in a form that can be written
/// out as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub kind: TaskKind,
    pub target: String,
    pub state: TaskState,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub findings: Vec<Finding>,
    pub assets: Vec<String>,
    pub result: Option<TaskResult>,
    pub failure: Option<String>,
}

impl TaskReport {
    pub fn new(kind: TaskKind, target: &ScanTarget) -> Self {
        Self {
            kind,
            target: target.to_string(),
            state: TaskState::Running,
            started_at: Utc::now(),
            finished_at: None,
            findings: Vec::new(),
            assets: Vec::new(),
            result: None,
            failure: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_target_rejects_blank_input() {
        assert!(ScanTarget::parse("   ").is_none());
        assert_eq!(ScanTarget::parse(" example.com ").unwrap().as_str(), "example.com");
    }

    #[test]
    fn scan_target_host_strips_scheme_and_path() {
        let target = ScanTarget::parse("https://www.example.com/a/b?c=d").unwrap();
        assert_eq!(target.host(), "www.example.com");
        let bare = ScanTarget::parse("example.org").unwrap();
        assert_eq!(bare.as_url(), "https://example.org");
        assert_eq!(bare.host(), "example.org");
    }

    #[test]
    fn scan_target_scheme_is_case_insensitive() {
        let target = ScanTarget::parse("HTTP://www.example.com/index.html").unwrap();
        assert_eq!(target.as_url(), "HTTP://www.example.com/index.html");
        assert_eq!(target.host(), "www.example.com");
        let mixed = ScanTarget::parse("HttpS://example.org").unwrap();
        assert_eq!(mixed.host(), "example.org");
    }

    #[test]
    fn ipv6_host_loses_brackets() {
        let target = ScanTarget::parse("http://[::1]:8080/").unwrap();
        assert_eq!(target.host(), "::1");
    }

    #[test]
    fn port_range_validation() {
        assert!(PortRange::new(0, 10).is_none());
        assert!(PortRange::new(20, 10).is_none());
        let range = PortRange::new(5, 5).unwrap();
        assert_eq!(range.len(), 1);
        assert_eq!(PortRange::default().len(), 1024);
    }

    #[test]
    fn port_range_from_str() {
        assert_eq!("22-80".parse::<PortRange>(), Ok(PortRange::new(22, 80).unwrap()));
        assert_eq!("443".parse::<PortRange>(), Ok(PortRange::new(443, 443).unwrap()));
        assert!("80-22".parse::<PortRange>().is_err());
        assert!("a-b".parse::<PortRange>().is_err());
    }

    #[test]
    fn port_range_deserialize_is_validated() {
        let range: PortRange = serde_json::from_str(r#"{"start":20,"end":25}"#).unwrap();
        assert_eq!(range, PortRange::new(20, 25).unwrap());
        assert!(serde_json::from_str::<PortRange>(r#"{"start":10,"end":5}"#).is_err());
        assert!(serde_json::from_str::<PortRange>(r#"{"start":0,"end":5}"#).is_err());
    }
}
