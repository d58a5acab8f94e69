//! The UI seam.
//!
//! The coordinator reports every transition through three calls; the rest of
//! the application adds connection, dish and status reports.  Those extra
//! calls have empty default bodies so that a minimal sink (for example a
//! test recorder that only cares about difficulty) implements three methods.
//!
//! All calls are synchronous and must not block: sinks print a line or push
//! into a channel and return.

use std::sync::Arc;

use pantry_core::{Cocktail, ConnectionState, Difficulty, Recipe, SyncOrigin};

/// Receives everything the user should see.
pub trait UiSink: Send + Sync {
    /// Light exactly the indicator for `difficulty`.
    fn set_difficulty_indicator(&self, difficulty: Difficulty);

    /// A difficulty transition finished.
    fn notify_difficulty_changed(&self, difficulty: Difficulty, origin: SyncOrigin);

    /// Firmware log text from the device.
    fn append_diagnostic(&self, line: &str);

    fn connection_changed(&self, _state: ConnectionState, _port: Option<&str>) {}

    fn show_recipe(&self, _recipe: &Recipe, _offline: bool) {}

    fn show_cocktail(&self, _cocktail: &Cocktail, _offline: bool) {}

    fn status(&self, _message: &str) {}
}

/// Forwards every call to each of its sinks, in order.
#[derive(Default, Clone)]
pub struct FanoutUi {
    sinks: Vec<Arc<dyn UiSink>>,
}

impl FanoutUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink; builder style.
    pub fn with(mut self, sink: Arc<dyn UiSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl UiSink for FanoutUi {
    fn set_difficulty_indicator(&self, difficulty: Difficulty) {
        for sink in &self.sinks {
            sink.set_difficulty_indicator(difficulty);
        }
    }

    fn notify_difficulty_changed(&self, difficulty: Difficulty, origin: SyncOrigin) {
        for sink in &self.sinks {
            sink.notify_difficulty_changed(difficulty, origin);
        }
    }

    fn append_diagnostic(&self, line: &str) {
        for sink in &self.sinks {
            sink.append_diagnostic(line);
        }
    }

    fn connection_changed(&self, state: ConnectionState, port: Option<&str>) {
        for sink in &self.sinks {
            sink.connection_changed(state, port);
        }
    }

    fn show_recipe(&self, recipe: &Recipe, offline: bool) {
        for sink in &self.sinks {
            sink.show_recipe(recipe, offline);
        }
    }

    fn show_cocktail(&self, cocktail: &Cocktail, offline: bool) {
        for sink in &self.sinks {
            sink.show_cocktail(cocktail, offline);
        }
    }

    fn status(&self, message: &str) {
        for sink in &self.sinks {
            sink.status(message);
        }
    }
}
