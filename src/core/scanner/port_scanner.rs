// src/core/scanner/port_scanner.rs

use crate::core::models::{PortRange, ScanTarget, TaskResult};
use crate::core::task::{probe_loop, CancellationToken, EventSink};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(400);
pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(50);

/// Where the probes of one scan are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanAddress {
    /// The target resolved to this address.
    Resolved(IpAddr),
    /// Resolution failed; each probe connects to the literal target string.
    Literal(String),
}

/// A sequential TCP connect scan over a port range.
#[derive(Debug, Clone)]
pub struct PortScanTask {
    pub target: ScanTarget,
    pub range: PortRange,
    pub connect_timeout: Duration,
    pub delay: Duration,
}

impl PortScanTask {
    pub fn new(target: ScanTarget, range: PortRange) -> Self {
        Self {
            target,
            range,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            delay: DEFAULT_PROBE_DELAY,
        }
    }

    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Scans every port of the range in ascending order and finishes with the
    /// open ones. Connection errors only ever mean "not open".
    pub async fn run(self, sink: &EventSink, token: &CancellationToken) {
        let host = self.target.host();
        info!(target = %host, start = self.range.start(), end = self.range.end(), "Starting port scan.");

        let address = resolve_target(&host).await;
        let address = &address;
        let connect_timeout = self.connect_timeout;

        let open_ports = probe_loop(self.range.ports(), self.delay, token, sink, |port| async move {
            probe_port(address, port, connect_timeout).await.then_some(port)
        })
        .await;

        info!(open = %open_ports.len(), stopped = token.is_stopped(), "Port scan finished.");
        sink.finished(TaskResult::OpenPorts(open_ports)).await;
    }
}

/// Resolves `host` once for the whole scan, keeping the literal string when
/// the lookup fails.
pub async fn resolve_target(host: &str) -> ScanAddress {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ScanAddress::Resolved(ip);
    }

    match tokio::net::lookup_host((host, 0)).await {
        Ok(mut addrs) => match addrs.next() {
            Some(addr) => {
                debug!(host, ip = %addr.ip(), "Resolved scan target.");
                ScanAddress::Resolved(addr.ip())
            }
            None => {
                warn!(host, "Scan target resolved to no addresses, using it as-is.");
                ScanAddress::Literal(host.to_string())
            }
        },
        Err(e) => {
            warn!(host, error = %e, "Could not resolve scan target, using it as-is.");
            ScanAddress::Literal(host.to_string())
        }
    }
}

/// Returns true when a TCP connection to `port` succeeds within `connect_timeout`.
pub async fn probe_port(address: &ScanAddress, port: u16, connect_timeout: Duration) -> bool {
    let attempt = match address {
        ScanAddress::Resolved(ip) => timeout(connect_timeout, TcpStream::connect(SocketAddr::new(*ip, port))).await,
        ScanAddress::Literal(host) => timeout(connect_timeout, TcpStream::connect((host.as_str(), port))).await,
    };

    match attempt {
        Ok(Ok(_stream)) => {
            info!(port, "Port open.");
            true
        }
        Ok(Err(e)) => {
            debug!(port, error = %e, "Port closed or unreachable.");
            false
        }
        Err(_elapsed) => {
            debug!(port, "Connect timed out.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn literal_ip_needs_no_lookup() {
        assert_eq!(
            resolve_target("127.0.0.1").await,
            ScanAddress::Resolved(IpAddr::V4(Ipv4Addr::LOCALHOST))
        );
    }

    #[tokio::test]
    async fn unresolvable_target_falls_back_to_literal() {
        assert_eq!(
            resolve_target("no-such-host.invalid").await,
            ScanAddress::Literal("no-such-host.invalid".to_string())
        );
    }

    #[tokio::test]
    async fn probe_finds_listening_port() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let address = ScanAddress::Resolved(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert!(probe_port(&address, port, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn probe_treats_refused_port_as_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let address = ScanAddress::Resolved(IpAddr::V4(Ipv4Addr::LOCALHOST));

        assert!(!probe_port(&address, port, Duration::from_millis(500)).await);
    }

    #[tokio::test]
    async fn probe_against_unresolvable_literal_is_closed() {
        let address = ScanAddress::Literal("no-such-host.invalid".to_string());
        assert!(!probe_port(&address, 80, Duration::from_millis(500)).await);
    }
}
