//! LineDispatcher: routes each framed device line to its handler.
//!
//! | Line                         | Action                                   |
//! |------------------------------|------------------------------------------|
//! | `BUTTON:<token>`             | logged only                              |
//! | `DIFFICULTY:<EASY|MEDIUM|HARD>` | coordinator `set_from_device`         |
//! | `DIFFICULTY:<other>`         | warning, dropped                         |
//! | firmware log text            | appended to the UI diagnostics           |
//! | anything else                | logged, dropped                          |
//!
//! A bad line never stops the dispatcher.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pantry_core::DeviceLine;

use super::difficulty_sync::DifficultySync;
use super::ui_sink::UiSink;

pub struct LineDispatcher {
    sync: Arc<DifficultySync>,
    ui: Arc<dyn UiSink>,
}

impl LineDispatcher {
    pub fn new(sync: Arc<DifficultySync>, ui: Arc<dyn UiSink>) -> Self {
        Self { sync, ui }
    }

    /// Classifies and handles one line.  Returns the classification so the
    /// caller (and tests) can see what happened.
    pub async fn dispatch(&self, line: &str) -> DeviceLine {
        debug!("device → {line:?}");
        let parsed = DeviceLine::parse(line);

        match &parsed {
            DeviceLine::Button { token } => {
                info!("device button: {token}");
            }
            DeviceLine::Difficulty(level) => {
                if let Err(e) = self.sync.set_from_device(*level).await {
                    warn!("device difficulty {level} not applied: {e}");
                }
            }
            DeviceLine::InvalidDifficulty { token } => {
                warn!("device sent an unknown difficulty {token:?}; ignored");
            }
            DeviceLine::Diagnostic(text) => {
                self.ui.append_diagnostic(text);
            }
            DeviceLine::Unrecognized(text) => {
                info!("unrecognized device line: {text:?}");
            }
        }

        parsed
    }

    /// Dispatches lines in arrival order until the channel closes.
    pub async fn run(&self, mut lines: mpsc::Receiver<String>) {
        while let Some(line) = lines.recv().await {
            let parsed = self.dispatch(&line).await;
            debug!("dispatched {} line", parsed.kind());
        }
        debug!("device line channel closed; dispatcher exiting");
    }
}
