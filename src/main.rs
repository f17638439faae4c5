//! Roster - Student Tracking
//!
//! Manages students, their grades per lesson and their absences, stored in a
//! JSON data file. Runs a full-screen terminal interface by default, or a
//! numbered text menu with `--menu`.

use std::io;
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use roster::application::{App, AppMode};
use roster::config::{AppConfig, Cli, FrontEnd};
use roster::domain::StudentService;
use roster::infrastructure::{init_logger, JsonFileStore};
use roster::presentation::{render_ui, InputHandler, TextMenu};

/// Entry point for the roster application.
///
/// Parses the command line, sets up logging, loads the data file and runs
/// the selected front end.
///
/// # Errors
///
/// Returns an error if logging or terminal setup fails, or if the terminal
/// interface fails during runtime.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_cli(Cli::parse());
    init_logger(config.verbose, config.log_file.as_deref())?;
    log::info!("Starting roster with data file {}", config.data_file.display());

    let mut service = StudentService::new(Box::new(JsonFileStore::new(&config.data_file)));
    if config.seed_demo && service.is_empty() {
        service.seed_demo()?;
        log::info!("Seeded demo students");
    }

    match config.front_end {
        FrontEnd::Menu => {
            let stdin = io::stdin();
            TextMenu::new(&mut service, stdin.lock(), io::stdout()).run()?;
        }
        FrontEnd::Terminal => run_terminal(App::new(service))?,
    }

    log::info!("Exiting roster");
    Ok(())
}

fn run_terminal(mut app: App) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        log::error!("Terminal UI failed: {err}");
        println!("{err:?}");
    }
    if let Some(err) = app.service.last_save_error() {
        eprintln!("Warning: last changes were not saved to disk: {err}");
    }

    Ok(())
}

/// Main application event loop.
///
/// Redraws after every key press. Returns when the user presses 'q' in
/// normal mode.
///
/// # Errors
///
/// Returns an IO error if terminal operations fail.
fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| render_ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press {
                match key.code {
                    KeyCode::Char('q') if matches!(app.mode, AppMode::Normal) => return Ok(()),
                    _ => InputHandler::handle_key_event(app, key.code, key.modifiers),
                }
            }
        }
    }
}
