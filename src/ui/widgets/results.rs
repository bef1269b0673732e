// src/ui/widgets/results.rs

use crate::app::App;
use blackbird::core::models::{TaskKind, TaskResult, TaskState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, Paragraph, Wrap},
};

/// Renders what the selected task has found so far, or why it failed.
pub fn render_results(frame: &mut Frame, app: &App, area: Rect) {
    let panel = app.panel(app.selected);
    let block = Block::default().borders(Borders::ALL).title("Results");

    if let (TaskState::Failed, Some(report)) = (panel.state, panel.report.as_ref()) {
        let reason = report.failure.clone().unwrap_or_default();
        let failed = Paragraph::new(Line::from(reason).style(Style::default().fg(Color::Red)))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(failed, area);
        return;
    }

    if panel.items.is_empty() {
        let text = match (panel.state, app.selected) {
            (TaskState::Idle, _) => "Type a target and press Enter.",
            (TaskState::Running, _) => "Nothing found yet...",
            (_, TaskKind::PortScan) => "No open ports found.",
            (_, TaskKind::PageFetch) => "No assets saved.",
            (_, TaskKind::SubdomainProbe) => "No subdomains resolved.",
        };
        frame.render_widget(Paragraph::new(text).alignment(Alignment::Center).block(block), area);
        return;
    }

    let mut items: Vec<ListItem> = panel
        .items
        .iter()
        .map(|item| ListItem::new(Line::from(vec![Span::styled("[+] ", Style::default().fg(Color::Green)), Span::raw(item.clone())])))
        .collect();

    if let Some(TaskResult::Download { folder, .. }) = panel.report.as_ref().and_then(|r| r.result.as_ref()) {
        items.push(ListItem::new(Line::from(format!("Saved to {}", folder.display())).style(Style::default().fg(Color::DarkGray))));
    }

    frame.render_widget(List::new(items).block(block), area);
}
