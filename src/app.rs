// src/app.rs

use blackbird::core::config::Settings;
use blackbird::core::models::{ScanTarget, TaskKind, TaskReport, TaskResult, TaskState};
use blackbird::core::scanner::{PageFetchTask, PortScanTask, SubdomainProbeTask};
use blackbird::core::task::{Task, TaskEvent, TaskHandle, TaskMessage, TaskRunner};
use blackbird::core::wordlist::{default_wordlist, load_wordlist};
use chrono::{Local, Utc};
use color_eyre::eyre::Result;
use ratatui::widgets::ScrollbarState;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use strum::IntoEnumIterator;
use tracing::{info, warn};

pub const SPINNER_CHARS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// How many event log lines are kept in memory.
const MAX_LOG_LINES: usize = 500;

pub enum ExportStatus {
    Idle,
    Success(String),
    Error(String),
}

/// What the UI knows about one kind of task.
#[derive(Default)]
pub struct TaskPanel {
    pub state: TaskState,
    pub done: usize,
    pub total: usize,
    pub items: Vec<String>,
    pub report: Option<TaskReport>,
    pub handle: Option<TaskHandle>,
}

impl TaskPanel {
    pub fn is_running(&self) -> bool {
        matches!(self.state, TaskState::Running)
    }

    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.done as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }
}

pub struct App {
    pub should_quit: bool,
    pub show_disclaimer: bool,
    pub input: String,
    pub selected: TaskKind,
    pub retrieve_assets: bool,
    pub panels: BTreeMap<TaskKind, TaskPanel>,
    pub log_content: Vec<String>,
    pub log_scroll: usize,
    pub log_scroll_state: ScrollbarState,
    pub export_status: ExportStatus,
    pub spinner_frame: usize,
    pub settings: Settings,
    runner: TaskRunner,
}

impl App {
    pub fn new(settings: Settings, runner: TaskRunner) -> Self {
        Self {
            should_quit: false,
            show_disclaimer: true,
            input: String::new(),
            selected: TaskKind::PortScan,
            retrieve_assets: settings.retrieve_assets,
            panels: TaskKind::iter().map(|kind| (kind, TaskPanel::default())).collect(),
            log_content: Vec::new(),
            log_scroll: 0,
            log_scroll_state: ScrollbarState::default(),
            export_status: ExportStatus::Idle,
            spinner_frame: 0,
            settings,
            runner,
        }
    }

    pub fn panel(&self, kind: TaskKind) -> &TaskPanel {
        // Every kind gets a panel in `new`.
        &self.panels[&kind]
    }

    fn panel_mut(&mut self, kind: TaskKind) -> &mut TaskPanel {
        self.panels.entry(kind).or_default()
    }

    pub fn next_task(&mut self) {
        let kinds: Vec<TaskKind> = TaskKind::iter().collect();
        let index = kinds.iter().position(|k| *k == self.selected).unwrap_or(0);
        self.selected = kinds[(index + 1) % kinds.len()];
        self.export_status = ExportStatus::Idle;
    }

    pub fn toggle_assets(&mut self) {
        self.retrieve_assets = !self.retrieve_assets;
        self.push_log("INFO", format!("Asset download {}", if self.retrieve_assets { "on" } else { "off" }));
    }

    /// Starts the selected kind of task on the typed target, unless one of
    /// that kind is still running.
    pub async fn start_selected(&mut self) {
        let kind = self.selected;
        let Some(target) = ScanTarget::parse(&self.input) else {
            self.push_log("WARN", "Enter a target first.".to_string());
            return;
        };
        if self.panel(kind).is_running() {
            self.push_log("WARN", format!("{} is already running.", kind));
            return;
        }

        let task: Task = match kind {
            TaskKind::PortScan => PortScanTask::new(target.clone(), self.settings.port_range)
                .with_connect_timeout(self.settings.connect_timeout)
                .with_delay(self.settings.port_delay)
                .into(),
            TaskKind::PageFetch => PageFetchTask::new(target.as_url())
                .with_assets(self.retrieve_assets)
                .with_folder(self.settings.download_dir.clone())
                .with_timeout(self.settings.http_timeout)
                .into(),
            TaskKind::SubdomainProbe => SubdomainProbeTask::new(target.host())
                .with_wordlist(self.active_wordlist().await)
                .with_delay(self.settings.dns_delay)
                .into(),
        };

        info!(%kind, %target, "Starting task from UI.");
        self.push_log("INFO", format!("{} started on {}", kind, target));
        let handle = self.runner.start(task);
        let panel = self.panel_mut(kind);
        *panel = TaskPanel {
            state: TaskState::Running,
            report: Some(TaskReport::new(kind, &target)),
            handle: Some(handle),
            ..TaskPanel::default()
        };
    }

    async fn active_wordlist(&mut self) -> Vec<String> {
        let Some(path) = self.settings.wordlist.clone() else {
            return default_wordlist();
        };
        match load_wordlist(&path).await {
            Ok(words) => words,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Could not load wordlist, using the built-in one.");
                self.push_log("WARN", format!("Wordlist {} unreadable ({}), using defaults", path.display(), e));
                default_wordlist()
            }
        }
    }

    /// Asks the selected task to stop. Its state only changes once the task
    /// reports back.
    pub fn stop_selected(&mut self) {
        let kind = self.selected;
        let Some(handle) = self.panel(kind).handle.as_ref() else {
            return;
        };
        handle.stop();
        self.push_log("INFO", format!("Stop requested for {}", kind));
    }

    pub fn stop_all(&mut self) {
        for panel in self.panels.values() {
            if let Some(handle) = panel.handle.as_ref() {
                handle.stop();
            }
        }
    }

    /// Folds one event from the runner into the UI state.
    pub fn apply(&mut self, message: TaskMessage) {
        let TaskMessage { kind, event } = message;
        let mut log = None;
        let panel = self.panel_mut(kind);

        match event {
            TaskEvent::Progress { done, total } => {
                panel.done = done;
                panel.total = total;
            }
            TaskEvent::Found(finding) => {
                panel.items.push(finding.to_string());
                log = Some(("INFO", format!("[{}] found {}", kind, finding)));
                if let Some(report) = panel.report.as_mut() {
                    report.findings.push(finding);
                }
            }
            TaskEvent::AssetsFound(assets) => {
                log = Some(("INFO", format!("[{}] {} assets referenced", kind, assets.len())));
                if let Some(report) = panel.report.as_mut() {
                    report.assets = assets;
                }
            }
            TaskEvent::AssetFailed { url, reason } => {
                log = Some(("WARN", format!("[{}] failed {}: {}", kind, url, reason)));
            }
            TaskEvent::Finished(result) => {
                let stopped = panel.handle.as_ref().is_some_and(|h| h.is_stop_requested());
                panel.state = if stopped { TaskState::Cancelled } else { TaskState::Completed };
                panel.handle = None;
                log = Some(("INFO", format!("[{}] {}: {}", kind, panel.state, describe_result(&result))));
                if let Some(report) = panel.report.as_mut() {
                    report.state = panel.state;
                    report.finished_at = Some(Utc::now());
                    report.result = Some(result);
                }
            }
            TaskEvent::Failed(reason) => {
                panel.state = TaskState::Failed;
                panel.handle = None;
                log = Some(("ERROR", format!("[{}] failed: {}", kind, reason)));
                if let Some(report) = panel.report.as_mut() {
                    report.state = TaskState::Failed;
                    report.finished_at = Some(Utc::now());
                    report.failure = Some(reason);
                }
            }
        }

        if let Some((level, line)) = log {
            self.push_log(level, line);
        }
    }

    /// Writes the selected task's last report to the data directory.
    pub fn export_selected(&mut self, directory: &Path) {
        let Some(report) = self.panel(self.selected).report.as_ref() else {
            self.export_status = ExportStatus::Error("Nothing to export yet.".to_string());
            return;
        };
        self.export_status = match export_report(report, directory) {
            Ok(path) => {
                info!(path = %path.display(), "Exported report.");
                ExportStatus::Success(path.display().to_string())
            }
            Err(e) => {
                warn!(error = %e, "Export failed.");
                ExportStatus::Error(e.to_string())
            }
        };
    }

    pub fn push_log(&mut self, level: &str, message: String) {
        let stamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        self.log_content.push(format!("{} {} {}", stamp, level, message));
        if self.log_content.len() > MAX_LOG_LINES {
            let excess = self.log_content.len() - MAX_LOG_LINES;
            self.log_content.drain(..excess);
        }
    }

    pub fn on_tick(&mut self) {
        if self.panels.values().any(TaskPanel::is_running) {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_CHARS.len();
        }
    }

    // `log_scroll` counts lines up from the newest entry.
    pub fn scroll_up(&mut self) {
        self.log_scroll = self.log_scroll.saturating_add(1).min(self.log_content.len());
    }

    pub fn scroll_down(&mut self) {
        self.log_scroll = self.log_scroll.saturating_sub(1);
    }

    pub fn dismiss_disclaimer(&mut self) {
        self.show_disclaimer = false;
    }

    pub fn quit(&mut self) {
        self.stop_all();
        self.should_quit = true;
    }
}

fn describe_result(result: &TaskResult) -> String {
    match result {
        TaskResult::OpenPorts(ports) if ports.is_empty() => "no open ports".to_string(),
        TaskResult::OpenPorts(ports) => format!(
            "open ports {}",
            ports.iter().map(u16::to_string).collect::<Vec<_>>().join(", ")
        ),
        TaskResult::Download { folder, saved } => {
            format!("saved page and {} assets to {}", saved.len(), folder.display())
        }
        TaskResult::Subdomains(found) => format!("{} subdomains resolved", found.len()),
    }
}

/// Serializes `report` as pretty JSON into `directory`, named after the task
/// kind and the current time.
pub fn export_report(report: &TaskReport, directory: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(directory)?;
    let file_name = format!("{}-{}.json", report.kind.slug(), Local::now().format("%Y%m%d-%H%M%S"));
    let path = directory.join(file_name);
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use blackbird::core::models::Finding;

    fn app() -> App {
        let (runner, _rx) = TaskRunner::new();
        App::new(Settings::default(), runner)
    }

    fn message(kind: TaskKind, event: TaskEvent) -> TaskMessage {
        TaskMessage { kind, event }
    }

    fn running(app: &mut App, kind: TaskKind) {
        let target = ScanTarget::parse("example.com").unwrap();
        let panel = app.panel_mut(kind);
        panel.state = TaskState::Running;
        panel.report = Some(TaskReport::new(kind, &target));
    }

    #[test]
    fn tab_cycles_through_every_kind() {
        let mut app = app();
        let start = app.selected;
        app.next_task();
        app.next_task();
        assert_ne!(app.selected, start);
        app.next_task();
        assert_eq!(app.selected, start);
    }

    #[test]
    fn finished_event_completes_the_panel() {
        let mut app = app();
        running(&mut app, TaskKind::PortScan);

        app.apply(message(TaskKind::PortScan, TaskEvent::Progress { done: 1, total: 2 }));
        app.apply(message(TaskKind::PortScan, TaskEvent::Found(Finding::OpenPort(80))));
        app.apply(message(TaskKind::PortScan, TaskEvent::Progress { done: 2, total: 2 }));
        app.apply(message(TaskKind::PortScan, TaskEvent::Finished(TaskResult::OpenPorts(vec![80]))));

        let panel = app.panel(TaskKind::PortScan);
        assert_eq!(panel.state, TaskState::Completed);
        assert_eq!(panel.ratio(), 1.0);
        assert_eq!(panel.items, vec!["port 80 open"]);
        let report = panel.report.as_ref().unwrap();
        assert_eq!(report.findings, vec![Finding::OpenPort(80)]);
        assert!(report.finished_at.is_some());
        // Other panels are untouched.
        assert_eq!(app.panel(TaskKind::PageFetch).state, TaskState::Idle);
    }

    #[test]
    fn failed_event_marks_the_panel_failed() {
        let mut app = app();
        running(&mut app, TaskKind::PageFetch);

        app.apply(message(TaskKind::PageFetch, TaskEvent::Failed("HTTP request failed with status 404 Not Found".into())));

        let panel = app.panel(TaskKind::PageFetch);
        assert_eq!(panel.state, TaskState::Failed);
        assert!(panel.report.as_ref().unwrap().failure.is_some());
        assert!(app.log_content.last().unwrap().contains("ERROR"));
    }

    #[tokio::test]
    async fn blank_target_does_not_start_anything() {
        let mut app = app();
        app.input = "   ".into();
        app.start_selected().await;
        assert_eq!(app.panel(TaskKind::PortScan).state, TaskState::Idle);
    }

    #[test]
    fn export_writes_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        running(&mut app, TaskKind::SubdomainProbe);
        app.apply(message(
            TaskKind::SubdomainProbe,
            TaskEvent::Finished(TaskResult::Subdomains(vec!["www.example.com".into()])),
        ));
        app.selected = TaskKind::SubdomainProbe;

        app.export_selected(dir.path());

        let ExportStatus::Success(path) = &app.export_status else {
            panic!("export failed");
        };
        let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(json["kind"], "SubdomainProbe");
        assert_eq!(json["state"], "Completed");
    }

    #[test]
    fn export_without_report_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.export_selected(dir.path());
        assert!(matches!(app.export_status, ExportStatus::Error(_)));
    }
}
