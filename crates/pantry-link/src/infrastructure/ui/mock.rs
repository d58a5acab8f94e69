//! Recording UI sink and an in-memory console writer for unit testing.

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use pantry_core::{Cocktail, ConnectionState, Difficulty, Recipe, SyncOrigin};

use crate::application::ui_sink::UiSink;

/// One call received by [`RecordingUi`].  Dishes are recorded by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCall {
    Indicator(Difficulty),
    Changed(Difficulty, SyncOrigin),
    Diagnostic(String),
    Connection(ConnectionState, Option<String>),
    Recipe { name: String, offline: bool },
    Cocktail { name: String, offline: bool },
    Status(String),
}

/// A [`UiSink`] that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingUi {
    calls: Mutex<Vec<UiCall>>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Only the `notify_difficulty_changed` calls.
    pub fn changes(&self) -> Vec<(Difficulty, SyncOrigin)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Changed(d, o) => Some((d, o)),
                _ => None,
            })
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn push(&self, call: UiCall) {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(call);
    }
}

impl UiSink for RecordingUi {
    fn set_difficulty_indicator(&self, difficulty: Difficulty) {
        self.push(UiCall::Indicator(difficulty));
    }

    fn notify_difficulty_changed(&self, difficulty: Difficulty, origin: SyncOrigin) {
        self.push(UiCall::Changed(difficulty, origin));
    }

    fn append_diagnostic(&self, line: &str) {
        self.push(UiCall::Diagnostic(line.to_string()));
    }

    fn connection_changed(&self, state: ConnectionState, port: Option<&str>) {
        self.push(UiCall::Connection(state, port.map(str::to_string)));
    }

    fn show_recipe(&self, recipe: &Recipe, offline: bool) {
        self.push(UiCall::Recipe {
            name: recipe.name.clone(),
            offline,
        });
    }

    fn show_cocktail(&self, cocktail: &Cocktail, offline: bool) {
        self.push(UiCall::Cocktail {
            name: cocktail.name.clone(),
            offline,
        });
    }

    fn status(&self, message: &str) {
        self.push(UiCall::Status(message.to_string()));
    }
}

/// A cloneable in-memory writer, so tests can read what was printed.
#[derive(Debug, Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
