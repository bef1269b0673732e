// src/ui/layout.rs

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// The screen areas each widget draws into.
pub struct AppLayout {
    pub input: Rect,
    pub tabs: Rect,
    pub summary: Rect,
    pub results: Rect,
    pub log_panel: Rect,
    pub footer: Rect,
}

/// Splits the frame into input and tab rows on top, a content area in the
/// middle and a one-line footer. The content area holds the task summary and
/// results on the left and the event log on the right.
pub fn create_layout(frame_size: Rect) -> AppLayout {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame_size);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(main_chunks[2]);

    let task_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(0)])
        .split(content_chunks[0]);

    AppLayout {
        input: main_chunks[0],
        tabs: main_chunks[1],
        summary: task_chunks[0],
        results: task_chunks[1],
        log_panel: content_chunks[1],
        footer: main_chunks[3],
    }
}
