//! DifficultySync: keeps the device LEDs and the UI indicator on one value.
//!
//! There are two views of the current difficulty, the device's three LEDs and
//! the on-screen indicator, and either side can change it:
//!
//! ```text
//!  device button ──DIFFICULTY:HARD──▶ set_from_device(Hard)
//!                                        ├─ state = Hard
//!                                        ├─ UI indicator = Hard
//!                                        └─ notify (Hard, FromDevice)
//!
//!  UI click ─────────────────────────▶ set_from_ui(Medium)
//!                                        ├─ state = Medium
//!                                        ├─ UI indicator = Medium
//!                                        ├─ notify (Medium, FromUi)
//!                                        └─ LIGHTS:EASY:0,MEDIUM:1,HARD:0  (only when connected)
//! ```
//!
//! The in-process value held here is authoritative.  A change from the device
//! is never written back to the device.
//!
//! # Echo suppression
//!
//! Each transition registers itself as *in flight* for as long as its side
//! effects run, including the one awaited `LIGHTS` write.  While it is in
//! flight, a second transition with the **same value** and the **opposite
//! origin** is an echo (the device confirming the lights we just sent, or a
//! UI listener reacting to the indicator we just set) and is dropped.
//!
//! A transition with a *different* value is applied even inside the window:
//! the last write wins.  Repeats from the same origin are applied too, so
//! pressing the same level twice notifies twice.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};

use pantry_core::{DeviceCommand, Difficulty, IndicatorLights, ProtocolError, SyncOrigin};

use super::device_link::{DeviceLink, TransportError};
use super::ui_sink::UiSink;

/// Error type for difficulty transitions.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The requested level was not one of the three known tokens.
    #[error(transparent)]
    InvalidToken(#[from] ProtocolError),

    /// The state changed but the `LIGHTS` line could not be written.
    #[error("difficulty applied but the device was not updated: {0}")]
    Transport(#[from] TransportError),
}

/// What a transition request did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The state changed (or was re-confirmed) and the UI was notified.
    /// `transmitted` is true when a `LIGHTS` line went to the device.
    Applied { transmitted: bool },
    /// Dropped as an echo of a transition still in flight.
    Suppressed,
}

#[derive(Debug)]
struct SyncState {
    current: Difficulty,
    lights: IndicatorLights,
    /// Transitions whose side effects are still running.
    in_flight: Vec<InFlight>,
    next_id: u64,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    id: u64,
    value: Difficulty,
    origin: SyncOrigin,
}

/// The difficulty coordinator.
pub struct DifficultySync {
    state: Mutex<SyncState>,
    link: Arc<dyn DeviceLink>,
    ui: Arc<dyn UiSink>,
}

impl DifficultySync {
    /// Creates a coordinator starting at `initial`.  Nothing is sent or
    /// shown until the first transition.
    pub fn new(initial: Difficulty, link: Arc<dyn DeviceLink>, ui: Arc<dyn UiSink>) -> Self {
        Self {
            state: Mutex::new(SyncState {
                current: initial,
                lights: initial.lights(),
                in_flight: Vec::new(),
                next_id: 0,
            }),
            link,
            ui,
        }
    }

    pub fn current(&self) -> Difficulty {
        self.lock_state().current
    }

    /// The indicator state matching [`current`](Self::current).  Exactly one
    /// channel is always on.
    pub fn indicator(&self) -> IndicatorLights {
        self.lock_state().lights
    }

    /// The device reported `value`.
    ///
    /// # Errors
    ///
    /// Never fails with [`SyncError::Transport`]: device-origin transitions
    /// write nothing.
    pub async fn set_from_device(&self, value: Difficulty) -> Result<SyncOutcome, SyncError> {
        self.apply(value, SyncOrigin::FromDevice).await
    }

    /// The user picked `value` on screen.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Transport`] when the link is connected but the
    /// `LIGHTS` write fails.  The state and the UI are updated regardless.
    pub async fn set_from_ui(&self, value: Difficulty) -> Result<SyncOutcome, SyncError> {
        self.apply(value, SyncOrigin::FromUi).await
    }

    /// Parses `token` (EASY / MEDIUM / HARD, any case) and applies it as a
    /// UI-origin transition.
    ///
    /// # Errors
    ///
    /// [`SyncError::InvalidToken`] for anything else; nothing changes.
    pub async fn set_from_ui_token(&self, token: &str) -> Result<SyncOutcome, SyncError> {
        let value: Difficulty = token.parse()?;
        self.set_from_ui(value).await
    }

    /// Moves to the next level as a UI-origin transition.
    pub async fn cycle_from_ui(&self) -> Result<SyncOutcome, SyncError> {
        let next = self.current().next();
        self.set_from_ui(next).await
    }

    /// Writes the current lights to the device, if connected.  Used after a
    /// (re)connect so the LEDs match the host.
    ///
    /// # Errors
    ///
    /// Returns the transport error of the write.
    pub async fn resend_lights(&self) -> Result<bool, TransportError> {
        if !self.link.is_connected() {
            return Ok(false);
        }
        let lights = self.indicator();
        self.link.send_command(&DeviceCommand::Lights(lights)).await?;
        Ok(true)
    }

    async fn apply(&self, value: Difficulty, origin: SyncOrigin) -> Result<SyncOutcome, SyncError> {
        // Decide and register under the lock; the guard deregisters on every
        // exit path, including a cancelled future.
        let _guard = {
            let mut state = self.lock_state();
            let echo = state
                .in_flight
                .iter()
                .any(|t| t.value == value && t.origin == origin.opposite());
            if echo {
                debug!("suppressed {value} from {origin}: echo of a transition in flight");
                return Ok(SyncOutcome::Suppressed);
            }

            let id = state.next_id;
            state.next_id += 1;
            state.in_flight.push(InFlight { id, value, origin });
            state.current = value;
            state.lights = value.lights();
            InFlightGuard { sync: self, id }
        };

        info!("difficulty → {value} (from {origin})");
        self.ui.set_difficulty_indicator(value);
        // Raised before the awaited write: a transition that overtakes this
        // one during the write then also notifies last.
        self.ui.notify_difficulty_changed(value, origin);

        let mut write_result = Ok(false);
        if origin == SyncOrigin::FromUi && self.link.is_connected() {
            let command = DeviceCommand::Lights(value.lights());
            write_result = self.link.send_command(&command).await.map(|()| true);
        }

        match write_result {
            Ok(transmitted) => Ok(SyncOutcome::Applied { transmitted }),
            Err(e) => {
                warn!("difficulty {value} not sent to device: {e}");
                Err(SyncError::Transport(e))
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SyncState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Removes one transition from the in-flight list when dropped.
struct InFlightGuard<'a> {
    sync: &'a DifficultySync,
    id: u64,
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.sync.lock_state().in_flight.retain(|t| t.id != self.id);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::serial::mock::MockDeviceLink;
    use crate::infrastructure::ui::mock::{RecordingUi, UiCall};
    use pantry_core::ConnectionState;

    fn setup(state: ConnectionState) -> (Arc<DifficultySync>, Arc<MockDeviceLink>, Arc<RecordingUi>) {
        let link = Arc::new(MockDeviceLink::new(state));
        let ui = Arc::new(RecordingUi::new());
        let sync = Arc::new(DifficultySync::new(
            Difficulty::Medium,
            Arc::clone(&link) as Arc<dyn DeviceLink>,
            Arc::clone(&ui) as Arc<dyn UiSink>,
        ));
        (sync, link, ui)
    }

    #[tokio::test]
    async fn test_set_from_device_sends_nothing_and_notifies_once() {
        // Arrange
        let (sync, link, ui) = setup(ConnectionState::Connected);

        // Act
        let outcome = sync.set_from_device(Difficulty::Hard).await.unwrap();

        // Assert
        assert_eq!(outcome, SyncOutcome::Applied { transmitted: false });
        assert!(link.sent().is_empty(), "device-origin changes are never echoed");
        assert_eq!(ui.changes(), vec![(Difficulty::Hard, SyncOrigin::FromDevice)]);
        assert_eq!(
            sync.indicator(),
            IndicatorLights {
                easy: false,
                medium: false,
                hard: true
            }
        );
    }

    #[tokio::test]
    async fn test_set_from_ui_while_connected_sends_one_lights_line() {
        let (sync, link, ui) = setup(ConnectionState::Connected);

        let outcome = sync.set_from_ui(Difficulty::Medium).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Applied { transmitted: true });
        assert_eq!(link.sent(), vec!["LIGHTS:EASY:0,MEDIUM:1,HARD:0".to_string()]);
        assert_eq!(ui.changes(), vec![(Difficulty::Medium, SyncOrigin::FromUi)]);
    }

    #[tokio::test]
    async fn test_set_from_ui_while_disconnected_updates_ui_only() {
        let (sync, link, ui) = setup(ConnectionState::Disconnected);

        let outcome = sync.set_from_ui(Difficulty::Easy).await;

        assert!(matches!(outcome, Ok(SyncOutcome::Applied { transmitted: false })));
        assert!(link.sent().is_empty());
        assert_eq!(sync.current(), Difficulty::Easy);
        assert_eq!(ui.calls()[0], UiCall::Indicator(Difficulty::Easy));
    }

    #[tokio::test]
    async fn test_repeated_device_value_is_idempotent_but_notifies_each_time() {
        let (sync, link, ui) = setup(ConnectionState::Connected);

        sync.set_from_device(Difficulty::Easy).await.unwrap();
        let after_once = sync.indicator();
        sync.set_from_device(Difficulty::Easy).await.unwrap();

        assert_eq!(sync.indicator(), after_once);
        assert_eq!(sync.current(), Difficulty::Easy);
        assert_eq!(ui.changes().len(), 2);
        assert!(link.sent().is_empty());
    }

    #[tokio::test]
    async fn test_exactly_one_light_after_every_transition() {
        let (sync, link, _ui) = setup(ConnectionState::Connected);

        for level in [Difficulty::Hard, Difficulty::Easy, Difficulty::Medium, Difficulty::Easy] {
            sync.set_from_ui(level).await.unwrap();
            assert_eq!(sync.indicator().lit_count(), 1);
            assert_eq!(sync.indicator().difficulty(), Some(level));
        }
        for line in link.sent() {
            assert_eq!(line.matches(":1").count(), 1, "{line}");
        }
    }

    #[tokio::test]
    async fn test_invalid_token_is_rejected_without_side_effects() {
        let (sync, link, ui) = setup(ConnectionState::Connected);

        let result = sync.set_from_ui_token("EXTREME").await;

        assert!(matches!(
            result,
            Err(SyncError::InvalidToken(ProtocolError::InvalidDifficultyToken { .. }))
        ));
        assert_eq!(sync.current(), Difficulty::Medium);
        assert!(link.sent().is_empty());
        assert!(ui.calls().is_empty());
    }

    #[tokio::test]
    async fn test_token_is_case_insensitive() {
        let (sync, _link, _ui) = setup(ConnectionState::Disconnected);
        sync.set_from_ui_token("hard").await.unwrap();
        assert_eq!(sync.current(), Difficulty::Hard);
    }

    #[tokio::test]
    async fn test_write_failure_still_updates_state_and_notifies() {
        let (sync, link, ui) = setup(ConnectionState::Connected);
        link.set_should_fail(true);

        let result = sync.set_from_ui(Difficulty::Hard).await;

        assert!(matches!(result, Err(SyncError::Transport(_))));
        assert_eq!(sync.current(), Difficulty::Hard);
        assert_eq!(ui.changes(), vec![(Difficulty::Hard, SyncOrigin::FromUi)]);
    }

    #[tokio::test]
    async fn test_device_echo_during_lights_write_is_suppressed() {
        // Arrange: writes block until the gate opens, holding the window open
        let (sync, link, ui) = setup(ConnectionState::Connected);
        let gate = link.gate_writes();

        // Act: UI picks Hard; while LIGHTS is in flight the device echoes Hard
        let ui_task = {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move { sync.set_from_ui(Difficulty::Hard).await })
        };
        link.wait_for_sent(1).await;
        let echo = sync.set_from_device(Difficulty::Hard).await.unwrap();
        gate.add_permits(1);
        let first = ui_task.await.unwrap().unwrap();

        // Assert
        assert_eq!(echo, SyncOutcome::Suppressed);
        assert_eq!(first, SyncOutcome::Applied { transmitted: true });
        assert_eq!(ui.changes(), vec![(Difficulty::Hard, SyncOrigin::FromUi)]);
    }

    #[tokio::test]
    async fn test_different_value_inside_window_wins() {
        let (sync, link, ui) = setup(ConnectionState::Connected);
        let gate = link.gate_writes();

        let ui_task = {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move { sync.set_from_ui(Difficulty::Hard).await })
        };
        link.wait_for_sent(1).await;
        let device = sync.set_from_device(Difficulty::Easy).await.unwrap();
        gate.add_permits(1);
        ui_task.await.unwrap().unwrap();

        assert_eq!(device, SyncOutcome::Applied { transmitted: false });
        assert_eq!(sync.current(), Difficulty::Easy);
        assert_eq!(ui.changes().len(), 2);
    }

    #[tokio::test]
    async fn test_last_notification_matches_state_when_device_overtakes_ui_write() {
        // Arrange: the UI's LIGHTS write stalls until the gate opens
        let (sync, link, ui) = setup(ConnectionState::Connected);
        let gate = link.gate_writes();
        let ui_task = {
            let sync = Arc::clone(&sync);
            tokio::spawn(async move { sync.set_from_ui(Difficulty::Hard).await })
        };
        link.wait_for_sent(1).await;

        // Act: the device moves to Easy mid-write, then the write completes
        sync.set_from_device(Difficulty::Easy).await.unwrap();
        gate.add_permits(1);
        ui_task.await.unwrap().unwrap();

        // Assert
        assert_eq!(sync.current(), Difficulty::Easy);
        assert_eq!(
            ui.changes(),
            vec![
                (Difficulty::Hard, SyncOrigin::FromUi),
                (Difficulty::Easy, SyncOrigin::FromDevice),
            ]
        );
        let last_indicator = ui.calls().into_iter().rev().find_map(|c| match c {
            UiCall::Indicator(d) => Some(d),
            _ => None,
        });
        assert_eq!(last_indicator, Some(Difficulty::Easy));
    }

    #[tokio::test]
    async fn test_window_closes_after_transition_completes() {
        let (sync, link, ui) = setup(ConnectionState::Connected);

        sync.set_from_ui(Difficulty::Hard).await.unwrap();
        // Not in flight any more: the device repeating Hard is a real event
        let later = sync.set_from_device(Difficulty::Hard).await.unwrap();

        assert_eq!(later, SyncOutcome::Applied { transmitted: false });
        assert_eq!(ui.changes().len(), 2);
        assert_eq!(link.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_resend_lights_only_when_connected() {
        let (sync, link, _ui) = setup(ConnectionState::Disconnected);
        assert!(!sync.resend_lights().await.unwrap());

        link.set_state(ConnectionState::Connected);
        assert!(sync.resend_lights().await.unwrap());
        assert_eq!(link.sent(), vec!["LIGHTS:EASY:0,MEDIUM:1,HARD:0".to_string()]);
    }

    #[tokio::test]
    async fn test_cycle_moves_to_next_level() {
        let (sync, _link, _ui) = setup(ConnectionState::Disconnected);
        sync.cycle_from_ui().await.unwrap();
        assert_eq!(sync.current(), Difficulty::Hard);
        sync.cycle_from_ui().await.unwrap();
        assert_eq!(sync.current(), Difficulty::Easy);
    }
}
