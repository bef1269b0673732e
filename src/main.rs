// src/main.rs

use blackbird::core::config::Settings;
use blackbird::core::task::{TaskMessage, TaskRunner};
use blackbird::logging;
use color_eyre::eyre::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::info;

mod app;
mod ui;

use app::App;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let log_path = logging::initialize_logging()?;
    let settings = Settings::from_env();
    info!(log = %log_path.display(), "Blackbird starting.");

    // --- Setup ---
    stdout().execute(EnterAlternateScreen)?;
    stdout().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    terminal.clear()?;

    let (runner, rx) = TaskRunner::new();
    let mut app = App::new(settings, runner);
    let outcome = run(&mut terminal, &mut app, rx).await;

    // --- Restore Terminal ---
    stdout().execute(LeaveAlternateScreen)?;
    stdout().execute(DisableMouseCapture)?;
    disable_raw_mode()?;
    info!("Blackbird exiting.");
    outcome
}

async fn run<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut rx: mpsc::Receiver<TaskMessage>,
) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        if event::poll(Duration::from_millis(100))? {
            handle_events(app).await?;
        }

        // Task events arrive from the runner's background tasks.
        while let Ok(message) = rx.try_recv() {
            app.apply(message);
        }
        app.on_tick();
    }
    Ok(())
}

async fn handle_events(app: &mut App) -> Result<()> {
    if let Event::Key(key) = event::read()? {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }
        if app.show_disclaimer {
            match key.code {
                KeyCode::Enter => app.dismiss_disclaimer(),
                KeyCode::Esc => app.quit(),
                _ => {}
            }
            return Ok(());
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            app.quit();
            return Ok(());
        }
        match key.code {
            KeyCode::Esc => app.quit(),
            KeyCode::Tab => app.next_task(),
            KeyCode::Enter => app.start_selected().await,
            KeyCode::F(2) => app.toggle_assets(),
            KeyCode::F(3) => app.stop_selected(),
            KeyCode::F(5) => app.export_selected(&logging::get_data_dir()),
            KeyCode::Up => app.scroll_up(),
            KeyCode::Down => app.scroll_down(),
            KeyCode::Backspace => {
                app.input.pop();
            }
            KeyCode::Char(c) => app.input.push(c),
            _ => {}
        }
    }
    Ok(())
}
