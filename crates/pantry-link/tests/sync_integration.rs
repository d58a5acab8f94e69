//! End-to-end difficulty sync against a simulated device.
//!
//! The device is the far end of an in-memory duplex attached to a real
//! `SerialLink`, so these tests exercise the chunk decoder, line framer,
//! dispatcher and coordinator together.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf, WriteHalf};
use tokio::time::timeout;

use pantry_core::{ConnectionState, DeviceCommand, Difficulty, IndicatorLights, SyncOrigin};
use pantry_link::application::device_link::DeviceLink;
use pantry_link::application::difficulty_sync::{DifficultySync, SyncOutcome};
use pantry_link::application::dispatch::LineDispatcher;
use pantry_link::application::ui_sink::UiSink;
use pantry_link::infrastructure::serial::mock::MockDeviceLink;
use pantry_link::infrastructure::serial::SerialLink;
use pantry_link::infrastructure::ui::mock::{RecordingUi, UiCall};

const WAIT: Duration = Duration::from_secs(2);
const QUIET: Duration = Duration::from_millis(150);

/// The device side of the connection.
struct SimulatedDevice {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl SimulatedDevice {
    async fn send(&mut self, bytes: &str) {
        self.writer.write_all(bytes.as_bytes()).await.unwrap();
        self.writer.flush().await.unwrap();
    }

    async fn next_command(&mut self) -> DeviceCommand {
        let line = timeout(WAIT, self.lines.next_line())
            .await
            .expect("device received nothing")
            .unwrap()
            .expect("link closed");
        DeviceCommand::parse(&line).unwrap_or_else(|| panic!("unexpected line {line:?}"))
    }

    async fn assert_quiet(&mut self) {
        let received = timeout(QUIET, self.lines.next_line()).await;
        assert!(received.is_err(), "device unexpectedly received {received:?}");
    }
}

struct Harness {
    link: Arc<SerialLink>,
    sync: Arc<DifficultySync>,
    ui: Arc<RecordingUi>,
    device: SimulatedDevice,
}

async fn connect() -> Harness {
    let (link, lines) = SerialLink::new(Duration::from_secs(1));
    let ui = Arc::new(RecordingUi::new());
    let sync = Arc::new(DifficultySync::new(
        Difficulty::Medium,
        Arc::clone(&link) as Arc<dyn DeviceLink>,
        Arc::clone(&ui) as Arc<dyn UiSink>,
    ));
    let dispatcher = LineDispatcher::new(Arc::clone(&sync), Arc::clone(&ui) as Arc<dyn UiSink>);
    tokio::spawn(async move { dispatcher.run(lines).await });

    let (host_end, device_end) = tokio::io::duplex(1024);
    link.attach(host_end, "simulated").await;
    let device = simulated(device_end);

    Harness { link, sync, ui, device }
}

fn simulated(stream: DuplexStream) -> SimulatedDevice {
    let (reader, writer) = tokio::io::split(stream);
    SimulatedDevice {
        lines: BufReader::new(reader).lines(),
        writer,
    }
}

async fn wait_for_difficulty(sync: &DifficultySync, expected: Difficulty) {
    timeout(WAIT, async {
        while sync.current() != expected {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("difficulty never became {expected}"));
}

// ── Device → UI ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_device_button_updates_ui_without_writing_back() {
    // Arrange
    let mut h = connect().await;

    // Act
    h.device.send("BUTTON:HARD\nDIFFICULTY:HARD\n").await;
    wait_for_difficulty(&h.sync, Difficulty::Hard).await;

    // Assert
    assert_eq!(h.ui.changes(), vec![(Difficulty::Hard, SyncOrigin::FromDevice)]);
    assert!(h.ui.calls().contains(&UiCall::Indicator(Difficulty::Hard)));
    h.device.assert_quiet().await;
}

#[tokio::test]
async fn test_line_split_across_writes_is_reassembled() {
    let mut h = connect().await;

    h.device.send("DIFF").await;
    h.device.send("ICULTY:EA").await;
    h.device.send("SY\r\n").await;
    wait_for_difficulty(&h.sync, Difficulty::Easy).await;

    assert_eq!(h.ui.changes(), vec![(Difficulty::Easy, SyncOrigin::FromDevice)]);
}

#[tokio::test]
async fn test_firmware_chatter_goes_to_diagnostics_only() {
    let mut h = connect().await;

    h.device.send("System ready\nDIFFICULTY:PURPLE\nDIFFICULTY:EASY\n").await;
    wait_for_difficulty(&h.sync, Difficulty::Easy).await;

    let calls = h.ui.calls();
    assert!(calls.contains(&UiCall::Diagnostic("System ready".to_string())));
    assert_eq!(h.ui.changes(), vec![(Difficulty::Easy, SyncOrigin::FromDevice)]);
}

// ── UI → device ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_ui_change_lights_the_device_once() {
    // Arrange
    let mut h = connect().await;

    // Act
    let outcome = h.sync.set_from_ui(Difficulty::Easy).await.unwrap();

    // Assert
    assert_eq!(outcome, SyncOutcome::Applied { transmitted: true });
    assert_eq!(
        h.device.next_command().await,
        DeviceCommand::Lights(IndicatorLights::only(Difficulty::Easy))
    );
    h.device.assert_quiet().await;
}

#[tokio::test]
async fn test_device_confirmation_after_ui_change_does_not_ping_pong() {
    let mut h = connect().await;

    h.sync.set_from_ui(Difficulty::Hard).await.unwrap();
    let _ = h.device.next_command().await;
    h.device.send("DIFFICULTY:HARD\n").await;
    tokio::time::sleep(QUIET).await;

    // The late confirmation carries the same value, so nothing changes and
    // nothing is sent back.
    assert_eq!(h.sync.current(), Difficulty::Hard);
    h.device.assert_quiet().await;
}

#[tokio::test]
async fn test_ui_change_while_disconnected_stays_local() {
    let h = connect().await;
    let mut state = h.link.subscribe();
    drop(h.device);
    timeout(WAIT, state.wait_for(|s| *s == ConnectionState::Disconnected))
        .await
        .expect("link never noticed the device going away")
        .unwrap();

    let outcome = h.sync.set_from_ui(Difficulty::Hard).await.unwrap();

    assert_eq!(outcome, SyncOutcome::Applied { transmitted: false });
    assert_eq!(h.sync.current(), Difficulty::Hard);
}

#[tokio::test]
async fn test_reconnect_then_resend_restores_lights() {
    // Arrange: change difficulty while connected to the first device
    let h = connect().await;
    h.sync.set_from_ui(Difficulty::Hard).await.unwrap();

    // Act: a new device takes over the link
    let (host_end, device_end) = tokio::io::duplex(1024);
    h.link.attach(host_end, "replacement").await;
    let mut replacement = simulated(device_end);
    let resent = h.sync.resend_lights().await.unwrap();

    // Assert
    assert!(resent);
    assert_eq!(h.link.port_name().as_deref(), Some("replacement"));
    assert_eq!(
        replacement.next_command().await,
        DeviceCommand::Lights(IndicatorLights::only(Difficulty::Hard))
    );
}

// ── Echo inside the write window ──────────────────────────────────────────────

#[tokio::test]
async fn test_device_echo_during_pending_write_is_suppressed() {
    // Arrange: a link whose writes block until released
    let link = Arc::new(MockDeviceLink::new(ConnectionState::Connected));
    let gate = link.gate_writes();
    let ui = Arc::new(RecordingUi::new());
    let sync = Arc::new(DifficultySync::new(
        Difficulty::Medium,
        Arc::clone(&link) as Arc<dyn DeviceLink>,
        Arc::clone(&ui) as Arc<dyn UiSink>,
    ));
    let dispatcher = LineDispatcher::new(Arc::clone(&sync), Arc::clone(&ui) as Arc<dyn UiSink>);

    let pending = {
        let sync = Arc::clone(&sync);
        tokio::spawn(async move { sync.set_from_ui(Difficulty::Easy).await })
    };
    link.wait_for_sent(1).await;

    // Act: the device confirms while the LIGHTS write is still in flight
    dispatcher.dispatch("DIFFICULTY:EASY").await;
    gate.add_permits(1);
    pending.await.unwrap().unwrap();

    // Assert
    assert_eq!(ui.changes(), vec![(Difficulty::Easy, SyncOrigin::FromUi)]);
    assert_eq!(link.sent().len(), 1);
}
