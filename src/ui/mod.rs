// src/ui/mod.rs

use crate::app::App;
use ratatui::prelude::*;

mod layout;
mod widgets;

pub fn render(app: &mut App, frame: &mut Frame) {
    let layout = layout::create_layout(frame.area());

    widgets::input::render_input(frame, app, layout.input);
    widgets::task_tabs::render_task_tabs(frame, app, layout.tabs);
    widgets::summary::render_summary(frame, app, layout.summary);
    widgets::results::render_results(frame, app, layout.results);
    widgets::log_view::render_log_view(frame, app, layout.log_panel);
    widgets::footer::render_footer(frame, app, layout.footer);

    if app.show_disclaimer {
        widgets::disclaimer_popup::render_disclaimer_popup(frame, frame.area());
    }
}
