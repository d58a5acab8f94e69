//! SerialLink: one line-oriented connection to the device.
//!
//! # Lifecycle
//!
//! ```text
//! Disconnected ──open_port / attach──▶ Connecting ──ok──▶ Connected
//!       ▲                                  │                 │
//!       └──────────── open failed ─────────┘                 │
//!       └──────── close / EOF / read or write failure ───────┘
//! ```
//!
//! While connected, a reader task decodes inbound bytes, frames them into
//! lines and forwards each line, in arrival order, on the channel returned
//! by [`SerialLink::new`].  State changes are published on a watch channel.
//!
//! Each connection carries a generation number.  A reader task only tears
//! the link down if its generation is still the current one, so a stale
//! reader from a replaced connection cannot disconnect its successor.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use pantry_core::{ChunkDecoder, ConnectionState, LineFramer};

use super::port;
use crate::application::device_link::{DeviceLink, TransportError};

/// Baud rate the device firmware uses.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default bound on a single line write.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(2);

const LINE_CHANNEL_CAPACITY: usize = 256;
const READ_BUFFER: usize = 1024;

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

pub struct SerialLink {
    state_tx: watch::Sender<ConnectionState>,
    writer: tokio::sync::Mutex<Option<BoxedWriter>>,
    reader_task: Mutex<Option<JoinHandle<()>>>,
    port_name: Mutex<Option<String>>,
    lines_tx: mpsc::Sender<String>,
    generation: AtomicU64,
    write_timeout: Duration,
}

impl SerialLink {
    /// Creates a disconnected link and the receiver of its inbound lines.
    pub fn new(write_timeout: Duration) -> (Arc<Self>, mpsc::Receiver<String>) {
        let (lines_tx, lines_rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let link = Arc::new(Self {
            state_tx,
            writer: tokio::sync::Mutex::new(None),
            reader_task: Mutex::new(None),
            port_name: Mutex::new(None),
            lines_tx,
            generation: AtomicU64::new(0),
            write_timeout,
        });
        (link, lines_rx)
    }

    /// Watches the connection state.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// The port (or stream label) of the current connection.
    pub fn port_name(&self) -> Option<String> {
        self.port_name
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Opens the serial port at `path`.  An existing connection is closed
    /// first.
    ///
    /// # Errors
    ///
    /// [`TransportError::Open`]; the link is left `Disconnected`.
    pub async fn open_port(self: &Arc<Self>, path: &str, baud: u32) -> Result<(), TransportError> {
        self.close().await;
        self.set_state(ConnectionState::Connecting);
        info!("opening serial port {path} at {baud} baud");

        let owned_path = path.to_string();
        let opened = tokio::task::spawn_blocking(move || port::open(&owned_path, baud))
            .await
            .unwrap_or_else(|e| {
                Err(TransportError::Open {
                    port: path.to_string(),
                    reason: format!("open task failed: {e}"),
                })
            });

        match opened {
            Ok(stream) => {
                self.connect_stream(stream, path).await;
                Ok(())
            }
            Err(e) => {
                warn!("{e}");
                self.set_state(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Uses `stream` as the device connection.  An existing connection is
    /// closed first.
    pub async fn attach<S>(self: &Arc<Self>, stream: S, label: &str)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        self.close().await;
        self.set_state(ConnectionState::Connecting);
        self.connect_stream(stream, label).await;
    }

    async fn connect_stream<S>(self: &Arc<Self>, stream: S, label: &str)
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        let (reader, writer) = tokio::io::split(stream);

        // Connected is published before the reader starts, and the reader's
        // teardown re-checks the generation under the writer lock, so an
        // immediate EOF always ends in Disconnected.
        let generation = {
            let mut slot = self.writer.lock().await;
            *slot = Some(Box::new(writer));
            *self.port_name.lock().unwrap_or_else(PoisonError::into_inner) = Some(label.to_string());
            let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
            self.set_state(ConnectionState::Connected);
            generation
        };
        info!("device connected on {label}");

        let link = Arc::clone(self);
        let task = tokio::spawn(async move {
            read_loop(reader, link.lines_tx.clone()).await;
            let mut slot = link.writer.lock().await;
            if link.generation.load(Ordering::Acquire) == generation {
                slot.take();
                link.set_state(ConnectionState::Disconnected);
                info!("device connection on {} ended", link.port_name().unwrap_or_default());
            }
        });
        *self.reader_task.lock().unwrap_or_else(PoisonError::into_inner) = Some(task);
    }

    /// Closes the current connection, if any.  Safe to call repeatedly.
    pub async fn close(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let task = self
            .reader_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
        }
        if *self.state_tx.borrow() != ConnectionState::Disconnected {
            info!("device link closed");
        }
        // Visible before the writer lock, which a stalled write may hold
        // until its timeout.
        self.set_state(ConnectionState::Disconnected);
        if let Some(mut writer) = self.writer.lock().await.take() {
            let _ = writer.shutdown().await;
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state_tx.send_if_modified(|current| {
            let changed = *current != state;
            *current = state;
            changed
        });
    }

    /// Drops the connection after a failed write.  The caller holds the
    /// writer lock and has already taken the writer.
    fn fail_connection(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        if let Some(task) = self
            .reader_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
        self.set_state(ConnectionState::Disconnected);
    }
}

#[async_trait]
impl DeviceLink for SerialLink {
    fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        let mut guard = self.writer.lock().await;
        let writer = match guard.as_mut() {
            Some(w) if self.state() == ConnectionState::Connected => w,
            _ => return Err(TransportError::NotConnected),
        };

        let mut data = String::with_capacity(line.len() + 1);
        data.push_str(line);
        data.push('\n');

        let write = async {
            writer.write_all(data.as_bytes()).await?;
            writer.flush().await
        };
        let error = match timeout(self.write_timeout, write).await {
            Ok(Ok(())) => {
                debug!("device ← {line:?}");
                return Ok(());
            }
            Ok(Err(e)) => TransportError::Write(e),
            Err(_) => TransportError::WriteTimeout(self.write_timeout),
        };

        warn!("{error}; disconnecting");
        guard.take();
        self.fail_connection();
        Err(error)
    }
}

/// Reads until EOF or error, forwarding each complete line.
async fn read_loop<R>(mut reader: R, lines_tx: mpsc::Sender<String>)
where
    R: AsyncRead + Unpin,
{
    let mut decoder = ChunkDecoder::new();
    let mut framer = LineFramer::new();
    let mut buf = vec![0u8; READ_BUFFER];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!("serial stream closed by the device");
                break;
            }
            Ok(n) => match decoder.decode(&buf[..n]) {
                Ok(text) => {
                    for line in framer.feed(&text) {
                        if lines_tx.send(line).await.is_err() {
                            debug!("line receiver dropped; reader exiting");
                            return;
                        }
                    }
                }
                Err(e) => {
                    warn!("dropping serial chunk: {e}");
                }
            },
            Err(e) => {
                warn!("{}", TransportError::Read(e));
                break;
            }
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
