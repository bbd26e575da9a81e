use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use super::worker::Worker;
use crate::api::ApiClient;
use crate::config::Config;
use crate::session::SessionStore;
use crate::ui::app::{App, InputMode, Screen};
use crate::ui::commands;
use crate::ui::util::{scroll_down, scroll_to_bottom, scroll_to_top, scroll_up};

/// How long to wait for a key before checking the worker again.
const TICK: Duration = Duration::from_millis(100);

pub(crate) fn as_tui(config: &Config) -> Result<()> {
    let store = SessionStore::in_dir(&config.data_dir);
    let api = ApiClient::new(&config.api_url, config.timeout)
        .context("Failed to build the HTTP client")?;
    tracing::info!(api = api.base_url(), "starting tui");
    let mut worker = Worker::spawn(api)?;
    let mut app = App::new(&config.currency, store.load());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &mut worker, &store);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(ref e) = result {
        tracing::error!(error = %e, "tui exited with an error");
        eprintln!("Error: {e:?}");
    }

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    worker: &mut Worker,
    store: &SessionStore,
) -> Result<()> {
    while app.running {
        let epoch = app.epoch;
        for job in app.outbox.drain(..) {
            tracing::debug!(action = job.action(), epoch, "submitting job");
            worker.submit(epoch, job)?;
        }
        app.busy = worker.is_busy();
        persist_session(app, store);

        terminal.draw(|f| {
            // tab + status + command bars, two borders, one table header
            let content_height = f.area().height.saturating_sub(6) as usize;
            app.visible_rows = content_height.max(1);
            crate::ui::render::render(f, app);
        })?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(key, app);
                }
            }
        }

        while let Some((epoch, outcome)) = worker.poll()? {
            app.accept_outcome(epoch, outcome);
        }
    }
    Ok(())
}

/// Write or remove the session file after the session was replaced or dropped.
fn persist_session(app: &mut App, store: &SessionStore) {
    if !app.session_changed {
        return;
    }
    app.session_changed = false;
    let result = match &app.session {
        Some(session) => store.save(session),
        None => store.clear(),
    };
    if let Err(e) = result {
        tracing::warn!(path = %store.path().display(), error = %e, "could not persist session");
        app.set_status(format!("Warning: {e:#}"));
    }
}

fn handle_key(key: event::KeyEvent, app: &mut App) {
    if app.show_help {
        app.show_help = false;
        return;
    }
    match app.input_mode {
        InputMode::Normal => handle_normal_input(key, app),
        InputMode::Command => handle_command_input(key, app),
        InputMode::Editing => handle_login_input(key, app),
        InputMode::Confirm => handle_confirm_input(key, app),
    }
}

// ── Input handlers ───────────────────────────────────────────

fn is_quit(key: &event::KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
}

fn handle_login_input(key: event::KeyEvent, app: &mut App) {
    if is_quit(&key) {
        app.running = false;
        return;
    }
    match key.code {
        KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.login.toggle_register();
            let label = if app.login.registering {
                "Create an account"
            } else {
                "Log in"
            };
            app.set_status(label);
        }
        KeyCode::Tab | KeyCode::Down => app.login.next_field(),
        KeyCode::BackTab | KeyCode::Up => app.login.prev_field(),
        KeyCode::Enter => {
            if app.busy {
                app.set_status("Still waiting for the server…");
            } else {
                app.submit_login();
            }
        }
        KeyCode::Backspace => app.login.pop(),
        KeyCode::Char(c) => app.login.push(c),
        _ => {}
    }
}

fn handle_normal_input(key: event::KeyEvent, app: &mut App) {
    if is_quit(&key) {
        app.running = false;
        return;
    }
    match key.code {
        KeyCode::Char(':') => {
            app.input_mode = InputMode::Command;
            app.command_input.clear();
        }
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char('j') | KeyCode::Down => handle_move_down(app),
        KeyCode::Char('k') | KeyCode::Up => handle_move_up(app),
        KeyCode::Char('g') => handle_goto_top(app),
        KeyCode::Char('G') => handle_goto_bottom(app),
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_down(app);
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            for _ in 0..app.visible_rows / 2 {
                handle_move_up(app);
            }
        }
        KeyCode::Char(c @ '1'..='4') => {
            let idx = c as usize - '1' as usize;
            if let Some(&screen) = Screen::all().get(idx) {
                switch_screen(app, screen);
            }
        }
        KeyCode::Tab => cycle_screen(app, 1),
        KeyCode::BackTab => cycle_screen(app, Screen::all().len() - 1),
        KeyCode::Char('r') => run_command("refresh", app),
        KeyCode::Char('D') if app.screen == Screen::Budgets => run_command("delete-budget", app),
        KeyCode::Char('D') if app.screen == Screen::Expenses => {
            run_command("delete-expense", app);
        }
        KeyCode::Esc => app.set_status(""),
        _ => {}
    }
}

fn handle_command_input(key: event::KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Enter => {
            let input = app.command_input.clone();
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
            run_command(&input, app);
        }
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
            app.command_input.clear();
        }
        KeyCode::Backspace => {
            app.command_input.pop();
            if app.command_input.is_empty() {
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.command_input.clear();
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Char('w') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let trimmed = app.command_input.trim_end();
            if let Some(pos) = trimmed.rfind(' ') {
                app.command_input.truncate(pos + 1);
            } else {
                app.command_input.clear();
                app.input_mode = InputMode::Normal;
            }
        }
        KeyCode::Char(c) => app.command_input.push(c),
        _ => {}
    }
}

fn handle_confirm_input(key: event::KeyEvent, app: &mut App) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.run_pending(),
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => app.cancel_pending(),
        _ => {}
    }
}

/// Commands report their own problems on the status bar; anything that
/// escapes as an error is shown there too instead of closing the UI.
fn run_command(input: &str, app: &mut App) {
    if let Err(e) = commands::handle_command(input, app) {
        tracing::warn!(command = input, error = %e, "command failed");
        app.set_status(format!("Error: {e:#}"));
    }
}

// ── Navigation helpers ───────────────────────────────────────

fn switch_screen(app: &mut App, screen: Screen) {
    app.screen = screen;
    app.set_status(screen.to_string());
}

fn cycle_screen(app: &mut App, step: usize) {
    let screens = Screen::all();
    let idx = screens.iter().position(|s| *s == app.screen).unwrap_or(0);
    switch_screen(app, screens[(idx + step) % screens.len()]);
}

fn handle_move_down(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Budgets => scroll_down(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::Expenses => scroll_down(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        _ => {}
    }
}

fn handle_move_up(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_up(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Expenses => scroll_up(&mut app.expense_index, &mut app.expense_scroll),
        _ => {}
    }
}

fn handle_goto_top(app: &mut App) {
    match app.screen {
        Screen::Budgets => scroll_to_top(&mut app.budget_index, &mut app.budget_scroll),
        Screen::Expenses => scroll_to_top(&mut app.expense_index, &mut app.expense_scroll),
        _ => {}
    }
}

fn handle_goto_bottom(app: &mut App) {
    let page = app.visible_rows;
    match app.screen {
        Screen::Budgets => scroll_to_bottom(
            &mut app.budget_index,
            &mut app.budget_scroll,
            app.budgets.len(),
            page,
        ),
        Screen::Expenses => scroll_to_bottom(
            &mut app.expense_index,
            &mut app.expense_scroll,
            app.expenses.len(),
            page,
        ),
        _ => {}
    }
}
