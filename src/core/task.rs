// src/core/task.rs

//! The task engine shared by every scanner.
//!
//! A task runs on its own tokio task and talks to the outside world only
//! through an [`EventSink`], which forwards tagged [`TaskEvent`]s over a
//! bounded channel. Stopping is cooperative: the caller flips a
//! [`CancellationToken`] and the task notices it at the next step of its
//! [`probe_loop`].

use crate::core::models::{Finding, TaskKind, TaskResult};
use crate::core::scanner::page_fetcher::PageFetchTask;
use crate::core::scanner::port_scanner::PortScanTask;
use crate::core::scanner::subdomain_scanner::SubdomainProbeTask;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

/// Capacity of the event channel created by [`TaskRunner::new`].
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

// --- Cancellation ---

/// A shared stop flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    stopped: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the owning task to stop. Calling it more than once is harmless.
    pub fn request_stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

// --- Events ---

/// Everything a task can tell its observer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskEvent {
    Progress { done: usize, total: usize },
    Found(Finding),
    /// Page fetch only: the de-duplicated asset list, sent once.
    AssetsFound(Vec<String>),
    /// Page fetch only: one asset could not be retrieved or saved.
    AssetFailed { url: String, reason: String },
    Finished(TaskResult),
    /// Page fetch only: the page itself could not be retrieved.
    Failed(String),
}

impl TaskEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskEvent::Finished(_) | TaskEvent::Failed(_))
    }
}

/// A [`TaskEvent`] tagged with the kind of task that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskMessage {
    pub kind: TaskKind,
    pub event: TaskEvent,
}

/// The sending half handed to a running task.
///
/// After a terminal event (`finished` or `failed`) the sink is closed and
/// silently drops anything else the task tries to send.
#[derive(Debug)]
pub struct EventSink {
    kind: TaskKind,
    tx: mpsc::Sender<TaskMessage>,
    closed: AtomicBool,
}

impl EventSink {
    pub fn new(kind: TaskKind, tx: mpsc::Sender<TaskMessage>) -> Self {
        Self { kind, tx, closed: AtomicBool::new(false) }
    }

    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    async fn emit(&self, event: TaskEvent) {
        let already_closed = if event.is_terminal() {
            self.closed.swap(true, Ordering::SeqCst)
        } else {
            self.closed.load(Ordering::SeqCst)
        };
        if already_closed {
            debug!(kind = %self.kind, ?event, "Dropping event emitted after the task ended.");
            return;
        }
        if self.tx.send(TaskMessage { kind: self.kind, event }).await.is_err() {
            debug!(kind = %self.kind, "Event receiver is gone.");
        }
    }

    pub async fn progress(&self, done: usize, total: usize) {
        self.emit(TaskEvent::Progress { done, total }).await;
    }

    pub async fn found(&self, finding: Finding) {
        self.emit(TaskEvent::Found(finding)).await;
    }

    pub async fn assets_found(&self, assets: Vec<String>) {
        self.emit(TaskEvent::AssetsFound(assets)).await;
    }

    pub async fn asset_failed(&self, url: String, reason: String) {
        self.emit(TaskEvent::AssetFailed { url, reason }).await;
    }

    pub async fn finished(&self, result: TaskResult) {
        self.emit(TaskEvent::Finished(result)).await;
    }

    pub async fn failed(&self, reason: String) {
        self.emit(TaskEvent::Failed(reason)).await;
    }
}

// --- Probe Loop ---

/// Runs `probe` over `items` one at a time and returns the hits.
///
/// The token is checked before every item; once it is set the loop returns
/// what it has so far without probing again. Each hit is reported with
/// `found`, and every probe (hit or miss) is followed by `progress`. `delay`
/// is slept between consecutive probes. Terminal events are left to the
/// caller.
pub async fn probe_loop<I, T, F, Fut>(
    items: I,
    delay: Duration,
    token: &CancellationToken,
    sink: &EventSink,
    mut probe: F,
) -> Vec<T>
where
    I: IntoIterator,
    I::IntoIter: ExactSizeIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future<Output = Option<T>>,
    T: Clone + Into<Finding>,
{
    let items = items.into_iter();
    let total = items.len();
    let mut hits = Vec::new();

    for (index, item) in items.enumerate() {
        if token.is_stopped() {
            info!(kind = %sink.kind(), done = index, total, "Stop requested, leaving probe loop.");
            break;
        }

        if let Some(hit) = probe(item).await {
            sink.found(hit.clone().into()).await;
            hits.push(hit);
        }
        sink.progress(index + 1, total).await;

        if !delay.is_zero() && index + 1 < total {
            tokio::time::sleep(delay).await;
        }
    }

    hits
}

// --- Runner ---

/// Any of the tasks the runner can drive.
#[derive(Debug, Clone)]
pub enum Task {
    PortScan(PortScanTask),
    PageFetch(PageFetchTask),
    SubdomainProbe(SubdomainProbeTask),
}

impl Task {
    pub fn kind(&self) -> TaskKind {
        match self {
            Task::PortScan(_) => TaskKind::PortScan,
            Task::PageFetch(_) => TaskKind::PageFetch,
            Task::SubdomainProbe(_) => TaskKind::SubdomainProbe,
        }
    }

    /// Runs the task to completion. Always ends with exactly one terminal event.
    pub async fn run(self, sink: &EventSink, token: &CancellationToken) {
        match self {
            Task::PortScan(task) => task.run(sink, token).await,
            Task::PageFetch(task) => task.run(sink, token).await,
            Task::SubdomainProbe(task) => task.run(sink, token).await,
        }
    }
}

impl From<PortScanTask> for Task {
    fn from(task: PortScanTask) -> Self {
        Task::PortScan(task)
    }
}

impl From<PageFetchTask> for Task {
    fn from(task: PageFetchTask) -> Self {
        Task::PageFetch(task)
    }
}

impl From<SubdomainProbeTask> for Task {
    fn from(task: SubdomainProbeTask) -> Self {
        Task::SubdomainProbe(task)
    }
}

/// Spawns tasks on the tokio runtime and funnels all their events into one
/// channel.
#[derive(Debug, Clone)]
pub struct TaskRunner {
    tx: mpsc::Sender<TaskMessage>,
}

impl TaskRunner {
    /// Creates a runner together with the receiving end of its event channel.
    pub fn new() -> (Self, mpsc::Receiver<TaskMessage>) {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> (Self, mpsc::Receiver<TaskMessage>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Starts `task` in the background and returns at once.
    ///
    /// Must be called from within a tokio runtime. Every call gets its own
    /// cancellation token.
    pub fn start(&self, task: impl Into<Task>) -> TaskHandle {
        let task = task.into();
        let kind = task.kind();
        let token = CancellationToken::new();
        let sink = Arc::new(EventSink::new(kind, self.tx.clone()));

        info!(%kind, "Starting task.");
        let task_token = token.clone();
        let task_sink = Arc::clone(&sink);
        let join = tokio::spawn(async move {
            let worker = tokio::spawn(async move {
                task.run(&task_sink, &task_token).await;
            });
            if let Err(e) = worker.await {
                // A panicking task still owes its observer a terminal event.
                error!(%kind, panic = %e, "Task panicked!");
                sink.failed(format!("Task panicked: {}", e)).await;
            }
            debug!(%kind, "Task exited.");
        });

        TaskHandle { kind, token, join }
    }
}

/// The caller's grip on a running task.
#[derive(Debug)]
pub struct TaskHandle {
    kind: TaskKind,
    token: CancellationToken,
    join: JoinHandle<()>,
}

impl TaskHandle {
    pub fn kind(&self) -> TaskKind {
        self.kind
    }

    /// Requests a cooperative stop. The task keeps running until its next
    /// poll point and still emits its terminal event.
    pub fn stop(&self) {
        debug!(kind = %self.kind, "Stop requested.");
        self.token.request_stop();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.token.is_stopped()
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the background task to exit.
    pub async fn wait(self) {
        if let Err(e) = self.join.await {
            error!(kind = %self.kind, error = %e, "Task runner join failed.");
        }
    }
}
