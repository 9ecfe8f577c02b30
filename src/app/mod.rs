use std::fs;
use std::io::Stdout;
use std::path::Path;

use anyhow::{Context, Result};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::delivery::Delivery;
use crate::storage::RosterStore;
use crate::ui::dialogs::{HelpView, Notice};
use crate::ui::{self, Modal, Step};

pub mod actions;
pub mod events;
mod flows;
pub mod state;

pub use events::{CrosstermEvents, EventSource, ScriptedEvents, UiEvent};
pub use state::{LandingState, MenuAction};

/// Everything one interactive run needs. Flows borrow the session, so the
/// terminal, input source and running flag are never ambient.
pub struct Session<B: Backend, E: EventSource> {
    config: AppConfig,
    store: RosterStore,
    delivery: Box<dyn Delivery>,
    terminal: Terminal<B>,
    events: E,
    landing: LandingState,
    running: bool,
}

impl<B: Backend, E: EventSource> Session<B, E> {
    pub fn new(
        config: AppConfig,
        store: RosterStore,
        delivery: Box<dyn Delivery>,
        terminal: Terminal<B>,
        events: E,
    ) -> Self {
        let banner = config
            .ui
            .banner
            .as_deref()
            .map(load_banner)
            .unwrap_or_default();
        Self {
            config,
            store,
            delivery,
            terminal,
            events,
            landing: LandingState::new(banner),
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn landing(&self) -> &LandingState {
        &self.landing
    }

    pub fn store(&self) -> &RosterStore {
        &self.store
    }

    pub fn terminal(&self) -> &Terminal<B> {
        &self.terminal
    }

    pub fn terminal_mut(&mut self) -> &mut Terminal<B> {
        &mut self.terminal
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    /// Landing loop. Returns when the operator quits or input fails.
    pub fn run(&mut self) -> Result<()> {
        tracing::info!("session started");
        self.draw_landing()?;
        while self.running {
            let Some(event) = self.events.poll_event(self.config.ui.tick())? else {
                continue;
            };
            match event {
                UiEvent::Resize(cols, rows) => {
                    tracing::debug!(cols, rows, "terminal resized");
                    self.terminal.autoresize().context("resizing terminal")?;
                }
                UiEvent::Key(key) if is_interrupt(&key) => self.running = false,
                UiEvent::Key(key) => {
                    if let Some(action) = self.landing.handle_key(key) {
                        self.perform(action)?;
                    }
                }
            }
            if self.running {
                self.draw_landing()?;
            }
        }
        tracing::info!("session finished");
        Ok(())
    }

    pub fn perform(&mut self, action: MenuAction) -> Result<()> {
        tracing::debug!(action = action.label(), "menu action");
        match action {
            MenuAction::Send => self.send_flow(),
            MenuAction::Lists => self.list_flow(),
            MenuAction::Help => self.run_modal(&mut HelpView).map(|_| ()),
            MenuAction::Quit => {
                self.running = false;
                Ok(())
            }
            MenuAction::Drafts | MenuAction::Schedule => {
                self.notify("Coming soon", "This section is not implemented yet.")
            }
        }
    }

    /// Drives `modal` until it finishes. Ctrl+C cancels and ends the session;
    /// a resize re-lays out the screen and lets the modal decide.
    pub fn run_modal<M: Modal>(&mut self, modal: &mut M) -> Result<Option<M::Output>> {
        draw_over(&mut self.terminal, &self.landing, modal)?;
        loop {
            let Some(event) = self.events.poll_event(self.config.ui.tick())? else {
                continue;
            };
            let step = match event {
                UiEvent::Key(key) if is_interrupt(&key) => {
                    self.running = false;
                    Step::Cancel
                }
                UiEvent::Key(key) => modal.handle_key(key),
                UiEvent::Resize(_, _) => {
                    self.terminal.autoresize().context("resizing terminal")?;
                    modal.handle_resize()
                }
            };
            match step {
                Step::Continue => draw_over(&mut self.terminal, &self.landing, modal)?,
                Step::Done(output) => return Ok(Some(output)),
                Step::Cancel => return Ok(None),
            }
        }
    }

    pub fn notify(&mut self, title: &str, body: &str) -> Result<()> {
        self.run_modal(&mut Notice::new(title, body)).map(|_| ())
    }

    fn draw_landing(&mut self) -> Result<()> {
        let landing = &self.landing;
        self.terminal
            .draw(|frame| ui::draw_landing(frame, landing))
            .context("rendering landing screen")?;
        Ok(())
    }
}

fn draw_over<B: Backend, M: Modal + ?Sized>(
    terminal: &mut Terminal<B>,
    landing: &LandingState,
    modal: &mut M,
) -> Result<()> {
    terminal
        .draw(|frame| {
            ui::draw_landing(frame, landing);
            ui::draw_modal(frame, modal);
        })
        .context("rendering overlay")?;
    Ok(())
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

fn load_banner(path: &Path) -> Vec<String> {
    match fs::read_to_string(path) {
        Ok(raw) => raw.lines().map(|line| line.trim_end().to_string()).collect(),
        Err(err) => {
            tracing::warn!(?err, path = %path.display(), "banner unreadable");
            Vec::new()
        }
    }
}

/// Runs the full-screen interface on the real terminal.
pub fn run_tui(config: AppConfig, store: RosterStore, delivery: Box<dyn Delivery>) -> Result<()> {
    let terminal = setup_terminal()?;
    let mut session = Session::new(config, store, delivery, terminal, CrosstermEvents);
    let result = session.run();
    restore_terminal(session.terminal_mut())?;
    result
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen).context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("restoring screen state")?;
    Ok(())
}
