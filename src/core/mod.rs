// src/core/mod.rs

/// Data structures shared by the tasks and their consumers, such as
/// `ScanTarget`, `PortRange`, `Finding` and `TaskReport`.
pub mod models;

/// The task engine: cancellation token, event sink, the generic probe loop
/// and the runner that drives tasks on the tokio runtime.
pub mod task;

/// The three concrete tasks (port scan, page fetch, subdomain probe).
pub mod scanner;

/// Built-in subdomain labels and wordlist file loading.
pub mod wordlist;

/// Tunables with defaults and environment overrides.
pub mod config;
