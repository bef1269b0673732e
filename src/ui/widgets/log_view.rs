// src/ui/widgets/log_view.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation},
};

/// Renders the event log panel.
///
/// Lines look like `DATE TIME LEVEL MESSAGE`; the timestamp is dimmed and the
/// level coloured. The view follows the newest lines until the user scrolls
/// up with ↑.
pub fn render_log_view(frame: &mut Frame, app: &mut App, area: Rect) {
    let block = Block::default()
        .title("Events (scroll with ↑ ↓)")
        .borders(Borders::ALL);

    let inner_area = block.inner(area);
    frame.render_widget(block, area);

    let visible = inner_area.height as usize;
    let total = app.log_content.len();
    let max_offset = total.saturating_sub(visible);
    // Scrolling is measured from the bottom so new lines stay in view.
    let offset = max_offset.saturating_sub(app.log_scroll.min(max_offset));

    app.log_scroll_state = app.log_scroll_state.content_length(max_offset).position(offset);

    let log_lines: Vec<Line> = app
        .log_content
        .iter()
        .skip(offset)
        .take(visible)
        .map(|line_str| {
            let mut parts = line_str.splitn(4, ' ');
            match (parts.next(), parts.next(), parts.next(), parts.next()) {
                (Some(date), Some(time), Some(level), Some(rest)) => {
                    let level_style = match level.trim() {
                        "ERROR" => Style::default().fg(Color::Red),
                        "WARN" => Style::default().fg(Color::Yellow),
                        _ => Style::default().fg(Color::Green),
                    };
                    Line::from(vec![
                        Span::styled(format!("{} {}", date, time), Style::default().fg(Color::DarkGray)),
                        Span::styled(format!(" {}", level), level_style),
                        Span::raw(format!(" {}", rest)),
                    ])
                }
                _ => Line::from(line_str.as_str()),
            }
        })
        .collect();

    frame.render_widget(Paragraph::new(log_lines), inner_area);

    let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight).thumb_symbol("■");
    frame.render_stateful_widget(scrollbar, area, &mut app.log_scroll_state);
}
