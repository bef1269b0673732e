// src/core/scanner/mod.rs

// The concrete tasks. Each one exposes a `run(self, &EventSink,
// &CancellationToken)` method that the runner in `core::task` drives.
pub mod page_fetcher;
pub mod port_scanner;
pub mod subdomain_scanner;

pub use self::page_fetcher::PageFetchTask;
pub use self::port_scanner::PortScanTask;
pub use self::subdomain_scanner::SubdomainProbeTask;
