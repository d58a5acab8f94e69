//! Mock device link for unit testing.
//!
//! Records every line "sent" to the device without touching a port.  Tests
//! can flip the connection state, make writes fail, or hold writes open to
//! observe what happens while a write is in flight.

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use pantry_core::ConnectionState;

use crate::application::device_link::{DeviceLink, TransportError};

/// A mock implementation of [`DeviceLink`].
pub struct MockDeviceLink {
    state: Mutex<ConnectionState>,
    sent: Mutex<Vec<String>>,
    should_fail: Mutex<bool>,
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl MockDeviceLink {
    pub fn new(state: ConnectionState) -> Self {
        Self {
            state: Mutex::new(state),
            sent: Mutex::new(Vec::new()),
            should_fail: Mutex::new(false),
            gate: Mutex::new(None),
        }
    }

    /// Lines written so far, without terminators.
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_state(&self, state: ConnectionState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    /// When true, every write returns [`TransportError::Write`].
    pub fn set_should_fail(&self, fail: bool) {
        *self.should_fail.lock().unwrap_or_else(PoisonError::into_inner) = fail;
    }

    /// From now on each write is recorded and then waits for one permit on
    /// the returned semaphore before completing.
    pub fn gate_writes(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(Arc::clone(&gate));
        gate
    }

    /// Yields until at least `count` lines have been recorded.
    pub async fn wait_for_sent(&self, count: usize) {
        while self.sent.lock().unwrap_or_else(PoisonError::into_inner).len() < count {
            tokio::task::yield_now().await;
        }
    }
}

impl Default for MockDeviceLink {
    fn default() -> Self {
        Self::new(ConnectionState::Disconnected)
    }
}

#[async_trait]
impl DeviceLink for MockDeviceLink {
    fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn send_line(&self, line: &str) -> Result<(), TransportError> {
        if self.state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }
        if *self.should_fail.lock().unwrap_or_else(PoisonError::into_inner) {
            return Err(TransportError::Write(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock write failure",
            )));
        }

        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());

        let gate = self.gate.lock().unwrap_or_else(PoisonError::into_inner).clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }
        Ok(())
    }
}
