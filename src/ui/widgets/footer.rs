// src/ui/widgets/footer.rs

use crate::app::App;
use ratatui::{
    prelude::*,
    style::{Color, Style, Stylize},
    text::{Line, Span},
    widgets::Paragraph,
};

fn key(label: &str) -> Span<'_> {
    Span::styled(label, Style::new().bold().fg(Color::Yellow))
}

/// Renders the footer with the keys that make sense right now.
pub fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let spans = if app.show_disclaimer {
        Line::from(vec![Span::raw("Press "), key("Enter"), Span::raw(" to continue, "), key("Esc"), Span::raw(" to quit.")])
    } else if app.panel(app.selected).is_running() {
        Line::from(vec![key("[F3]"), Span::raw(" Stop, "), key("[Tab]"), Span::raw(" Switch, "), key("[Esc]"), Span::raw(" Quit")])
    } else {
        Line::from(vec![
            key("[Enter]"),
            Span::raw(" Start, "),
            key("[Tab]"),
            Span::raw(" Switch, "),
            key("[F2]"),
            Span::raw(" Assets, "),
            key("[F5]"),
            Span::raw(" Export, "),
            key("[Esc]"),
            Span::raw(" Quit"),
        ])
    };

    let footer = Paragraph::new(spans).alignment(Alignment::Center);
    frame.render_widget(footer, area);
}
