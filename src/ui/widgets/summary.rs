// src/ui/widgets/summary.rs

use crate::app::{App, ExportStatus, SPINNER_CHARS};
use blackbird::core::models::{TaskKind, TaskState};
use ratatui::{
    prelude::*,
    text::Line,
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Renders the status of the selected task: its state, a progress gauge and
/// the latest export outcome.
pub fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let kind = app.selected;
    let panel = app.panel(kind);
    let container = Block::default().borders(Borders::ALL).title(format!("{} Status", kind));
    frame.render_widget(container, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // State
            Constraint::Length(1), // Options
            Constraint::Length(1), // Gauge
            Constraint::Min(0),    // Export status
        ])
        .split(area);

    let state_style = match panel.state {
        TaskState::Idle => Style::default().fg(Color::DarkGray),
        TaskState::Running => Style::default().fg(Color::Cyan),
        TaskState::Completed => Style::default().fg(Color::Green),
        TaskState::Cancelled => Style::default().fg(Color::Yellow),
        TaskState::Failed => Style::default().fg(Color::Red),
    };
    let mut state_spans = vec![Span::raw("State: "), Span::styled(panel.state.to_string(), state_style)];
    if panel.is_running() {
        state_spans.push(Span::styled(format!(" {}", SPINNER_CHARS[app.spinner_frame]), Style::default().fg(Color::Cyan)));
        if panel.handle.as_ref().is_some_and(|h| h.is_stop_requested()) {
            state_spans.push(Span::raw(" (stopping)"));
        }
    }
    frame.render_widget(Paragraph::new(Line::from(state_spans)), chunks[0]);

    let options = match kind {
        TaskKind::PortScan => format!(
            "Ports {}-{}, timeout {} ms",
            app.settings.port_range.start(),
            app.settings.port_range.end(),
            app.settings.connect_timeout.as_millis()
        ),
        TaskKind::PageFetch => format!(
            "Assets: {} (F2), folder {}",
            if app.retrieve_assets { "on" } else { "off" },
            app.settings.download_dir.display()
        ),
        TaskKind::SubdomainProbe => match &app.settings.wordlist {
            Some(path) => format!("Wordlist {}", path.display()),
            None => "Built-in wordlist".to_string(),
        },
    };
    frame.render_widget(Paragraph::new(options).style(Style::default().fg(Color::DarkGray)), chunks[1]);

    let gauge = Gauge::default()
        .ratio(panel.ratio())
        .label(format!("{}/{}", panel.done, panel.total))
        .gauge_style(Style::default().fg(match panel.state {
            TaskState::Failed => Color::Red,
            TaskState::Completed => Color::Green,
            _ => Color::Cyan,
        }));
    frame.render_widget(gauge, chunks[2]);

    let export_line = match &app.export_status {
        ExportStatus::Idle => Line::from(""),
        ExportStatus::Success(path) => Line::from(format!("Exported to {}", path)).style(Style::default().fg(Color::Green)),
        ExportStatus::Error(e) => Line::from(format!("Export failed: {}", e)).style(Style::default().fg(Color::Red)),
    };
    frame.render_widget(Paragraph::new(export_line), chunks[3]);
}
