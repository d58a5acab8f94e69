//! Bridges a blocking `serialport` handle onto tokio.
//!
//! `serialport` only offers blocking reads and writes, so each open port
//! gets two small OS threads:
//!
//! ```text
//!  device ──read──▶ [serial-read thread] ──write──▶ ┐
//!                                                   │ duplex pipe ◀──▶ SerialLink
//!  device ◀─write── [serial-write thread] ◀─read─── ┘
//! ```
//!
//! The caller only ever sees the async end of a [`DuplexStream`].  Dropping
//! that end closes the pipe; the write thread sees EOF and exits, and the
//! read thread notices on its next read timeout.

use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt, DuplexStream};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::application::device_link::TransportError;

/// How long a blocking read waits before checking whether the host side
/// has gone away.
const READ_POLL: Duration = Duration::from_millis(100);

const PIPE_CAPACITY: usize = 4096;

/// Opens `path` at `baud` (8N1) and returns the async end of the bridge.
///
/// Must be called from within a tokio runtime (including
/// `spawn_blocking`), since the bridge threads use its handle.
///
/// # Errors
///
/// [`TransportError::Open`] if the port cannot be opened or cloned.
pub fn open(path: &str, baud: u32) -> Result<DuplexStream, TransportError> {
    let open_error = |reason: String| TransportError::Open {
        port: path.to_string(),
        reason,
    };

    let mut read_port = serialport::new(path, baud)
        .timeout(READ_POLL)
        .open()
        .map_err(|e| open_error(e.to_string()))?;
    let mut write_port = read_port.try_clone().map_err(|e| open_error(e.to_string()))?;

    let (host_side, bridge_side) = tokio::io::duplex(PIPE_CAPACITY);
    let (mut from_host, mut to_host) = tokio::io::split(bridge_side);
    let handle = Handle::current();
    let closed = Arc::new(AtomicBool::new(false));

    let read_handle = handle.clone();
    let read_closed = Arc::clone(&closed);
    std::thread::Builder::new()
        .name(format!("serial-read {path}"))
        .spawn(move || {
            let mut buf = [0u8; 256];
            loop {
                match read_port.read(&mut buf) {
                    Ok(0) => {
                        debug!("serial port returned EOF");
                        break;
                    }
                    Ok(n) => {
                        if read_handle.block_on(to_host.write_all(&buf[..n])).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::TimedOut => {
                        if read_closed.load(Ordering::Acquire) {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("serial port read failed: {e}");
                        break;
                    }
                }
            }
            read_closed.store(true, Ordering::Release);
            let _ = read_handle.block_on(to_host.shutdown());
        })
        .map_err(|e| open_error(format!("cannot start reader thread: {e}")))?;

    let write_closed = Arc::clone(&closed);
    std::thread::Builder::new()
        .name(format!("serial-write {path}"))
        .spawn(move || {
            let mut buf = [0u8; 256];
            loop {
                let n = match handle.block_on(from_host.read(&mut buf)) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => n,
                };
                if let Err(e) = write_port.write_all(&buf[..n]).and_then(|()| write_port.flush()) {
                    warn!("serial port write failed: {e}");
                    break;
                }
            }
            write_closed.store(true, Ordering::Release);
            debug!("serial writer thread exiting");
        })
        .map_err(|e| open_error(format!("cannot start writer thread: {e}")))?;

    Ok(host_side)
}

/// Names of the serial ports on this machine, with a short kind label.
pub fn list_ports() -> Result<Vec<String>, serialport::Error> {
    let ports = serialport::available_ports()?;
    Ok(ports
        .into_iter()
        .map(|p| {
            let kind = match p.port_type {
                serialport::SerialPortType::UsbPort(usb) => match usb.product {
                    Some(product) => format!("USB: {product}"),
                    None => "USB".to_string(),
                },
                serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                serialport::SerialPortType::PciPort => "PCI".to_string(),
                serialport::SerialPortType::Unknown => "unknown".to_string(),
            };
            format!("{} ({kind})", p.port_name)
        })
        .collect())
}
