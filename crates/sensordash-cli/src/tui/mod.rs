//! Interactive terminal dashboard.
//!
//! [`run`] connects to the store, spawns a [`DashboardWorker`] and draws the
//! [`App`] every 100 ms until the user quits. Worker events are drained
//! after each frame; key presses become [`Command`]s for the worker or local
//! view changes. The terminal is restored before waiting on the worker.

pub mod app;
pub mod input;
pub mod ui;

pub use app::App;

use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    ExecutableCommand,
    event::{self, Event, KeyEventKind},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::info;

use sensordash_core::{Command, DashboardEvent, DashboardWorker, RemoteStore, Thresholds};

use crate::config::Config;
use crate::util::{build_dispatcher, build_recognizer, connect_store};

/// Set up the terminal for TUI rendering.
pub fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    Ok(terminal)
}

/// Restore the terminal to its original state.
pub fn restore_terminal() -> Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard until the user quits.
pub async fn run(config: &Config) -> Result<()> {
    let store: Arc<dyn RemoteStore> = connect_store(config)?;

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(32);
    let (event_tx, event_rx) = mpsc::channel::<DashboardEvent>(64);

    let dispatcher = build_dispatcher(config, store.clone(), Some(event_tx.clone()));
    let mut worker = DashboardWorker::new(cmd_rx, event_tx, store)
        .with_thresholds(Thresholds::new(config.thresholds.clone()))
        .with_dispatcher(dispatcher)
        .with_poll_interval(config.polling.interval());
    if let Some(recognizer) = build_recognizer(config) {
        worker = worker.with_recognizer(recognizer);
    }
    let cancel = worker.cancel_token();
    let worker_handle = worker.spawn();
    info!("Dashboard started");

    let mut app = App::new(event_rx, config);
    let mut terminal = setup_terminal()?;

    let result = run_event_loop(&mut terminal, &mut app, &cmd_tx).await;

    let _ = cmd_tx.try_send(Command::Shutdown);
    cancel.cancel();

    restore_terminal()?;

    let _ = worker_handle.await;
    info!("Dashboard stopped");

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    command_tx: &mpsc::Sender<Command>,
) -> Result<()> {
    while !app.should_quit() {
        app.tick_spinner();
        app.clean_expired_notices();

        terminal.draw(|f| ui::draw(f, app))?;

        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            let action = input::handle_key(key.code, app.prompt.is_some());
            if let Some(cmd) = input::apply_action(app, action) {
                let _ = command_tx.try_send(cmd);
            }
        }

        while let Ok(event) = app.event_rx.try_recv() {
            app.handle_event(event);
        }
    }

    Ok(())
}
