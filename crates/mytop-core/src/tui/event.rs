//! Keyboard events for the console.
//!
//! A separate thread polls the terminal and forwards keys to the dispatch
//! loop. Quit keys also cancel the console token directly, so quitting
//! works while the loop is blocked on a drill-down fetch.

use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, unbounded};
use crossterm::event::{
    self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
};
use tracing::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::ConsoleError;

/// Keys the console reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Esc,
    CtrlC,
    Up,
    Down,
    PageUp,
    PageDown,
}

impl Key {
    /// Maps a terminal key event; unsupported keys map to `None`.
    pub fn from_event(key: KeyEvent) -> Option<Key> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Key::CtrlC),
            KeyCode::Char(c) => Some(Key::Char(c)),
            KeyCode::Backspace => Some(Key::Backspace),
            KeyCode::Enter => Some(Key::Enter),
            KeyCode::Esc => Some(Key::Esc),
            KeyCode::Up => Some(Key::Up),
            KeyCode::Down => Some(Key::Down),
            KeyCode::PageUp => Some(Key::PageUp),
            KeyCode::PageDown => Some(Key::PageDown),
            _ => None,
        }
    }

    pub fn is_quit(self) -> bool {
        matches!(self, Key::Esc | Key::CtrlC)
    }
}

/// Events delivered to the dispatch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiEvent {
    Key(Key),
    /// Terminal resized; the screen must be redrawn.
    Resize,
}

/// Spawns the key reader thread.
///
/// The thread polls with `poll` as timeout so it notices cancellation, and
/// exits when the token is cancelled or the receiver is dropped.
pub fn spawn_key_reader(
    cancel: CancelToken,
    poll: Duration,
) -> Result<(Receiver<UiEvent>, JoinHandle<()>), ConsoleError> {
    let (tx, rx) = unbounded();
    let handle = thread::Builder::new()
        .name("mytop-keys".into())
        .spawn(move || read_keys(&cancel, poll, &tx))
        .map_err(|source| ConsoleError::Spawn {
            name: "key reader",
            source,
        })?;
    Ok((rx, handle))
}

fn read_keys(cancel: &CancelToken, poll: Duration, tx: &Sender<UiEvent>) {
    while !cancel.is_cancelled() {
        match event::poll(poll) {
            Ok(false) => continue,
            Ok(true) => {}
            Err(e) => {
                warn!(error = %e, "terminal poll failed");
                cancel.cancel();
                break;
            }
        }
        let ui_event = match event::read() {
            Ok(CrosstermEvent::Key(key)) => match Key::from_event(key) {
                Some(k) => UiEvent::Key(k),
                None => continue,
            },
            Ok(CrosstermEvent::Resize(..)) => UiEvent::Resize,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "terminal read failed");
                cancel.cancel();
                break;
            }
        };
        if let UiEvent::Key(k) = ui_event {
            if k.is_quit() {
                debug!(key = ?k, "quit key pressed");
                cancel.cancel();
            }
        }
        if tx.send(ui_event).is_err() {
            break;
        }
    }
}
