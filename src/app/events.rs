use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Key(KeyEvent),
    Resize(u16, u16),
}

impl UiEvent {
    pub fn key(code: KeyCode) -> Self {
        UiEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    pub fn ctrl(ch: char) -> Self {
        UiEvent::Key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::CONTROL))
    }
}

/// Non-blocking input. `Ok(None)` means nothing arrived within `timeout`.
pub trait EventSource {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<UiEvent>>;
}

/// Reads the real terminal. Polls without blocking and sleeps the tick when
/// idle so the loop never stalls inside a read.
#[derive(Debug, Default)]
pub struct CrosstermEvents;

impl EventSource for CrosstermEvents {
    fn poll_event(&mut self, timeout: Duration) -> Result<Option<UiEvent>> {
        if !event::poll(Duration::ZERO).context("polling for terminal events")? {
            thread::sleep(timeout);
            return Ok(None);
        }
        match event::read().context("reading terminal event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(UiEvent::Key(key))),
            Event::Resize(cols, rows) => Ok(Some(UiEvent::Resize(cols, rows))),
            _ => Ok(None),
        }
    }
}

/// Replays a fixed script; `None` entries stand for idle polls. Running out
/// is an error so a stuck flow fails instead of hanging.
#[derive(Debug, Default)]
pub struct ScriptedEvents {
    queue: VecDeque<Option<UiEvent>>,
}

impl ScriptedEvents {
    pub fn new(events: impl IntoIterator<Item = UiEvent>) -> Self {
        Self {
            queue: events.into_iter().map(Some).collect(),
        }
    }

    pub fn push(&mut self, event: UiEvent) {
        self.queue.push_back(Some(event));
    }

    pub fn push_idle(&mut self) {
        self.queue.push_back(None);
    }

    /// Queues one key press per character.
    pub fn type_text(&mut self, text: &str) {
        for ch in text.chars() {
            let code = match ch {
                '\n' => KeyCode::Enter,
                ch => KeyCode::Char(ch),
            };
            self.push(UiEvent::key(code));
        }
    }

    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}

impl EventSource for ScriptedEvents {
    fn poll_event(&mut self, _timeout: Duration) -> Result<Option<UiEvent>> {
        match self.queue.pop_front() {
            Some(event) => Ok(event),
            None => bail!("scripted input exhausted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_events_replay_in_order_then_fail() {
        let mut events = ScriptedEvents::new([UiEvent::key(KeyCode::Down)]);
        events.push_idle();
        events.type_text("a\n");
        assert_eq!(events.remaining(), 4);
        assert_eq!(
            events.poll_event(Duration::ZERO).expect("event"),
            Some(UiEvent::key(KeyCode::Down))
        );
        assert_eq!(events.poll_event(Duration::ZERO).expect("idle"), None);
        assert_eq!(
            events.poll_event(Duration::ZERO).expect("event"),
            Some(UiEvent::key(KeyCode::Char('a')))
        );
        assert_eq!(
            events.poll_event(Duration::ZERO).expect("event"),
            Some(UiEvent::key(KeyCode::Enter))
        );
        assert!(events.poll_event(Duration::ZERO).is_err());
    }
}
