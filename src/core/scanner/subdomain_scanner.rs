// src/core/scanner/subdomain_scanner.rs

use crate::core::models::TaskResult;
use crate::core::task::{probe_loop, CancellationToken, EventSink};
use crate::core::wordlist::default_wordlist;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_PROBE_DELAY: Duration = Duration::from_millis(20);

/// Tries `{word}.{base}` for every word of a wordlist and keeps the names
/// that resolve.
#[derive(Debug, Clone)]
pub struct SubdomainProbeTask {
    pub base_domain: String,
    pub wordlist: Vec<String>,
    pub delay: Duration,
}

impl SubdomainProbeTask {
    /// A probe of `base_domain` with the built-in wordlist.
    pub fn new(base_domain: impl Into<String>) -> Self {
        Self {
            base_domain: base_domain.into(),
            wordlist: default_wordlist(),
            delay: DEFAULT_PROBE_DELAY,
        }
    }

    pub fn with_wordlist(mut self, wordlist: Vec<String>) -> Self {
        self.wordlist = wordlist;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub async fn run(self, sink: &EventSink, token: &CancellationToken) {
        let base = self.base_domain.trim_end_matches('.').to_string();
        info!(target = %base, words = %self.wordlist.len(), "Starting subdomain probe.");

        let resolver = system_resolver();
        let resolver = &resolver;
        let base_ref = base.as_str();

        let found = probe_loop(self.wordlist, self.delay, token, sink, |word| async move {
            let hostname = candidate_hostname(&word, base_ref);
            resolves(resolver, &hostname).await.then_some(hostname)
        })
        .await;

        info!(found = %found.len(), stopped = token.is_stopped(), "Subdomain probe finished.");
        sink.finished(TaskResult::Subdomains(found)).await;
    }
}

pub fn candidate_hostname(word: &str, base: &str) -> String {
    format!("{}.{}", word, base)
}

/// A resolver built from the system configuration, or from the default
/// upstream servers when that can't be read.
fn system_resolver() -> TokioAsyncResolver {
    match TokioAsyncResolver::tokio_from_system_conf() {
        Ok(resolver) => resolver,
        Err(e) => {
            warn!(error = %e, "Could not read system resolver config, using defaults.");
            TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
        }
    }
}

async fn resolves(resolver: &TokioAsyncResolver, hostname: &str) -> bool {
    match resolver.lookup_ip(hostname).await {
        Ok(lookup) => match lookup.iter().next() {
            Some(ip) => {
                info!(hostname, ip = %ip, "Subdomain resolved.");
                true
            }
            None => {
                debug!(hostname, "Lookup returned no addresses.");
                false
            }
        },
        Err(e) => {
            debug!(hostname, error = %e, "Subdomain did not resolve.");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::TaskKind;
    use crate::core::task::{TaskEvent, TaskMessage};
    use tokio::sync::mpsc;

    #[test]
    fn hostname_is_word_dot_base() {
        assert_eq!(candidate_hostname("api", "example.com"), "api.example.com");
    }

    #[test]
    fn new_task_uses_default_wordlist() {
        let task = SubdomainProbeTask::new("example.com");
        assert_eq!(task.wordlist, default_wordlist());
        assert_eq!(task.delay, DEFAULT_PROBE_DELAY);
    }

    #[tokio::test]
    async fn cancelled_probe_finishes_empty_without_lookups() {
        let (tx, mut rx) = mpsc::channel::<TaskMessage>(16);
        let sink = EventSink::new(TaskKind::SubdomainProbe, tx);
        let token = CancellationToken::new();
        token.request_stop();

        SubdomainProbeTask::new("example.com").run(&sink, &token).await;

        let msg = rx.try_recv().unwrap();
        assert_eq!(msg.event, TaskEvent::Finished(TaskResult::Subdomains(vec![])));
        assert!(rx.try_recv().is_err());
    }

    // Needs a working resolver and network access.
    #[tokio::test]
    #[ignore]
    async fn unknown_labels_produce_one_tick_each() {
        let (tx, mut rx) = mpsc::channel::<TaskMessage>(64);
        let sink = EventSink::new(TaskKind::SubdomainProbe, tx);
        let words: Vec<String> = ["qzx1", "qzx2", "qzx3"].iter().map(|s| s.to_string()).collect();

        SubdomainProbeTask::new("example.invalid")
            .with_wordlist(words)
            .with_delay(Duration::ZERO)
            .run(&sink, &CancellationToken::new())
            .await;

        let mut ticks = 0;
        while let Ok(msg) = rx.try_recv() {
            match msg.event {
                TaskEvent::Progress { .. } => ticks += 1,
                TaskEvent::Finished(result) => assert_eq!(result, TaskResult::Subdomains(vec![])),
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(ticks, 3);
    }
}
