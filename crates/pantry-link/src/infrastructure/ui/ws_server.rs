//! WebSocket UI: broadcasts [`UiEvent`]s to browsers and collects their
//! [`UiCommand`]s.
//!
//! This module is responsible for:
//!
//! 1. Accepting TCP connections from browsers on the configured address.
//! 2. Upgrading each connection to a WebSocket session.
//! 3. Sending a new session the current difficulty and connection state.
//! 4. Running two concurrent tasks per session:
//!    - **Host → Browser**: every `UiEvent` published through [`WsUi`] is
//!      serialized to JSON and sent as a text frame.
//!    - **Browser → Host**: JSON text frames are parsed as `UiCommand`s and
//!      pushed into the same command channel the console feeds.
//! 5. Stopping the accept loop when the `running` flag is cleared.
//!
//! Events are fanned out with a `tokio::sync::broadcast` channel.  A session
//! that falls too far behind skips the events it missed and carries on.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::Context;
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::timeout;
use tokio_tungstenite::{
    accept_async,
    tungstenite::{Error as WsError, Message as WsMessage},
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use pantry_core::{Cocktail, ConnectionState, Difficulty, Recipe, SyncOrigin};

use crate::application::ui_sink::UiSink;
use crate::domain::{ui_command_type_name, UiCommand, UiEvent};

const EVENT_CHANNEL_CAPACITY: usize = 128;

#[derive(Debug, Clone)]
struct Snapshot {
    difficulty: Difficulty,
    connection: ConnectionState,
    port: Option<String>,
}

/// The browser-facing [`UiSink`].
pub struct WsUi {
    events: broadcast::Sender<UiEvent>,
    snapshot: Mutex<Snapshot>,
}

impl WsUi {
    pub fn new(initial: Difficulty) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            events,
            snapshot: Mutex::new(Snapshot {
                difficulty: initial,
                connection: ConnectionState::Disconnected,
                port: None,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// What a newly connected browser is told first.
    pub fn welcome_events(&self) -> Vec<UiEvent> {
        let snapshot = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner).clone();
        vec![
            UiEvent::DifficultyIndicator {
                difficulty: snapshot.difficulty,
            },
            UiEvent::ConnectionState {
                state: snapshot.connection,
                port: snapshot.port,
            },
        ]
    }

    fn publish(&self, event: UiEvent) {
        // An error only means no browser is connected right now.
        let _ = self.events.send(event);
    }

    fn update(&self, f: impl FnOnce(&mut Snapshot)) {
        f(&mut self.snapshot.lock().unwrap_or_else(PoisonError::into_inner));
    }
}

impl UiSink for WsUi {
    fn set_difficulty_indicator(&self, difficulty: Difficulty) {
        self.update(|s| s.difficulty = difficulty);
        self.publish(UiEvent::DifficultyIndicator { difficulty });
    }

    fn notify_difficulty_changed(&self, difficulty: Difficulty, origin: SyncOrigin) {
        self.publish(UiEvent::DifficultyChanged { difficulty, origin });
    }

    fn append_diagnostic(&self, line: &str) {
        self.publish(UiEvent::Diagnostic {
            line: line.to_string(),
        });
    }

    fn connection_changed(&self, state: ConnectionState, port: Option<&str>) {
        let port = port.map(str::to_string);
        self.update(|s| {
            s.connection = state;
            s.port = port.clone();
        });
        self.publish(UiEvent::ConnectionState { state, port });
    }

    fn show_recipe(&self, recipe: &Recipe, offline: bool) {
        self.publish(UiEvent::RecipeReady {
            recipe: recipe.clone(),
            offline,
        });
    }

    fn show_cocktail(&self, cocktail: &Cocktail, offline: bool) {
        self.publish(UiEvent::CocktailReady {
            cocktail: cocktail.clone(),
            offline,
        });
    }

    fn status(&self, message: &str) {
        self.publish(UiEvent::Status {
            message: message.to_string(),
        });
    }
}

// ── Accept loop ───────────────────────────────────────────────────────────────

/// Binds the WebSocket listener.
///
/// # Errors
///
/// Fails if the address is in use or cannot be bound.
pub async fn bind(addr: SocketAddr) -> anyhow::Result<TcpListener> {
    TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind WebSocket listener on {addr}"))
}

/// Accepts browser sessions on `listener` until `running` is cleared.
pub async fn run_server(
    listener: TcpListener,
    ui: Arc<WsUi>,
    commands: mpsc::Sender<UiCommand>,
    running: Arc<AtomicBool>,
) {
    if let Ok(addr) = listener.local_addr() {
        info!("browser UI listening on ws://{addr}");
    }

    loop {
        if !running.load(Ordering::Relaxed) {
            info!("shutdown flag set; stopping WebSocket accept loop");
            break;
        }

        // Short timeout so the flag is checked even when nobody connects.
        match timeout(Duration::from_millis(200), listener.accept()).await {
            Ok(Ok((stream, peer_addr))) => {
                info!("new browser connection from {peer_addr}");
                let ui = Arc::clone(&ui);
                let commands = commands.clone();
                tokio::spawn(async move {
                    handle_session(stream, peer_addr, ui, commands).await;
                });
            }
            Ok(Err(e)) => error!("accept error: {e}"),
            Err(_) => {}
        }
    }
}

// ── Per-session handler ───────────────────────────────────────────────────────

async fn handle_session(
    stream: TcpStream,
    peer_addr: SocketAddr,
    ui: Arc<WsUi>,
    commands: mpsc::Sender<UiCommand>,
) {
    let session_id = Uuid::new_v4();
    match run_session(stream, session_id, ui, commands).await {
        Ok(()) => info!("session {session_id} ({peer_addr}) closed normally"),
        Err(e) => warn!("session {session_id} ({peer_addr}) closed with error: {e:#}"),
    }
}

async fn run_session(
    stream: TcpStream,
    session_id: Uuid,
    ui: Arc<WsUi>,
    commands: mpsc::Sender<UiCommand>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream)
        .await
        .with_context(|| format!("WebSocket handshake failed for session {session_id}"))?;
    let (mut ws_tx, mut ws_rx) = ws_stream.split();

    // Subscribe before the welcome so nothing published in between is lost.
    let mut events = ui.subscribe();
    for event in ui.welcome_events() {
        let json = serde_json::to_string(&event).context("serializing welcome event")?;
        ws_tx
            .send(WsMessage::Text(json))
            .await
            .context("sending welcome event")?;
    }

    // ── Task A: Host → Browser ────────────────────────────────────────────────
    let outbound = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("session {session_id}: browser lagging, skipped {skipped} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_tx.send(WsMessage::Text(json)).await.is_err() {
                        debug!("session {session_id}: send failed (browser disconnected)");
                        break;
                    }
                }
                Err(e) => error!("session {session_id}: JSON serialization error: {e}"),
            }
        }
    });

    // ── Task B: Browser → Host ────────────────────────────────────────────────
    let inbound = tokio::spawn(async move {
        loop {
            let message = match ws_rx.next().await {
                Some(Ok(msg)) => msg,
                Some(Err(WsError::ConnectionClosed | WsError::Protocol(_))) => {
                    debug!("session {session_id}: browser WebSocket closed");
                    break;
                }
                Some(Err(e)) => {
                    warn!("session {session_id}: browser WebSocket error: {e}");
                    break;
                }
                None => {
                    debug!("session {session_id}: browser stream ended");
                    break;
                }
            };

            match message {
                WsMessage::Text(json) => {
                    let command: UiCommand = match serde_json::from_str(&json) {
                        Ok(c) => c,
                        Err(e) => {
                            warn!("session {session_id}: invalid JSON from browser: {e}");
                            continue;
                        }
                    };
                    debug!(
                        "session {session_id}: browser → host: {}",
                        ui_command_type_name(&command)
                    );
                    if commands.send(command).await.is_err() {
                        debug!("session {session_id}: command pump gone");
                        break;
                    }
                }
                WsMessage::Binary(_) => {
                    warn!("session {session_id}: unexpected binary frame (ignored)");
                }
                WsMessage::Close(_) => {
                    debug!("session {session_id}: Close frame received");
                    break;
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => {}
            }
        }
    });

    tokio::select! {
        _ = outbound => debug!("session {session_id}: outbound task ended"),
        _ = inbound => debug!("session {session_id}: inbound task ended"),
    }
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_tungstenite::connect_async;

    async fn next_event<S>(ws: &mut S) -> UiEvent
    where
        S: futures_util::Stream<Item = Result<WsMessage, WsError>> + Unpin,
    {
        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Text(json))) => return serde_json::from_str(&json).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("unexpected frame: {other:?}"),
            }
        }
    }

    #[test]
    fn test_welcome_reports_current_state() {
        // Arrange
        let ui = WsUi::new(Difficulty::Easy);
        ui.connection_changed(ConnectionState::Connected, Some("/dev/ttyUSB0"));
        ui.set_difficulty_indicator(Difficulty::Hard);

        // Act
        let welcome = ui.welcome_events();

        // Assert
        assert_eq!(
            welcome,
            vec![
                UiEvent::DifficultyIndicator {
                    difficulty: Difficulty::Hard
                },
                UiEvent::ConnectionState {
                    state: ConnectionState::Connected,
                    port: Some("/dev/ttyUSB0".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_publish_without_browsers_is_harmless() {
        let ui = WsUi::new(Difficulty::Medium);
        ui.status("nobody listening");
        ui.append_diagnostic("Arduino ready");
    }

    #[tokio::test]
    async fn test_browser_session_receives_events_and_sends_commands() {
        // Arrange
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let ui = Arc::new(WsUi::new(Difficulty::Medium));
        let (tx, mut rx) = mpsc::channel(8);
        let running = Arc::new(AtomicBool::new(true));
        let server = tokio::spawn(run_server(
            listener,
            Arc::clone(&ui),
            tx,
            Arc::clone(&running),
        ));

        // Act: connect and read the welcome
        let (mut ws, _) = connect_async(format!("ws://{addr}")).await.unwrap();
        let first = next_event(&mut ws).await;
        let second = next_event(&mut ws).await;

        // Assert: welcome
        assert_eq!(
            first,
            UiEvent::DifficultyIndicator {
                difficulty: Difficulty::Medium
            }
        );
        assert!(matches!(second, UiEvent::ConnectionState { .. }));

        // Act: a host event reaches the browser
        ui.notify_difficulty_changed(Difficulty::Hard, SyncOrigin::FromDevice);
        assert_eq!(
            next_event(&mut ws).await,
            UiEvent::DifficultyChanged {
                difficulty: Difficulty::Hard,
                origin: SyncOrigin::FromDevice,
            }
        );

        // Act: a browser command reaches the pump; bad JSON is skipped
        ws.send(WsMessage::Text("not json".to_string())).await.unwrap();
        ws.send(WsMessage::Text(
            r#"{"type":"SetDifficulty","difficulty":"easy"}"#.to_string(),
        ))
        .await
        .unwrap();
        assert_eq!(
            rx.recv().await,
            Some(UiCommand::SetDifficulty {
                difficulty: Difficulty::Easy
            })
        );

        // Cleanup
        running.store(false, Ordering::Relaxed);
        server.await.unwrap();
    }
}
