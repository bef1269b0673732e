// src/ui/widgets/task_tabs.rs

use crate::app::App;
use blackbird::core::models::{TaskKind, TaskState};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Tabs},
};
use strum::IntoEnumIterator;

/// Renders one tab per task kind, marking the selected one and any that are
/// running.
pub fn render_task_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let kinds: Vec<TaskKind> = TaskKind::iter().collect();
    let titles: Vec<Line> = kinds
        .iter()
        .map(|kind| {
            let marker = match app.panel(*kind).state {
                TaskState::Running => " ●",
                TaskState::Failed => " ✗",
                _ => "",
            };
            Line::from(format!("{}{}", kind, marker))
        })
        .collect();
    let selected = kinds.iter().position(|k| *k == app.selected).unwrap_or(0);

    let tabs = Tabs::new(titles)
        .block(Block::default().borders(Borders::ALL).title("Task (Tab to switch)"))
        .select(selected)
        .highlight_style(Style::new().bold().fg(Color::Yellow));
    frame.render_widget(tabs, area);
}
