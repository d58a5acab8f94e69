//! Integration tests for the inbound serial path.
//!
//! Raw device bytes go through the chunk decoder, the line framer and the
//! line parser exactly as the link's read loop uses them.

use pantry_core::protocol::messages::DIAGNOSTIC_MARKERS;
use pantry_core::{ChunkDecoder, DeviceCommand, DeviceLine, Difficulty, IndicatorLights, LineFramer};

/// Runs `chunks` through a fresh decoder and framer and parses every line.
fn parse_stream(chunks: &[&[u8]]) -> Vec<DeviceLine> {
    let mut decoder = ChunkDecoder::new();
    let mut framer = LineFramer::new();
    let mut out = Vec::new();
    for chunk in chunks {
        if let Ok(text) = decoder.decode(chunk) {
            out.extend(framer.feed(&text).iter().map(|line| DeviceLine::parse(line)));
        }
    }
    out
}

#[test]
fn test_button_press_session_split_mid_line() {
    // Arrange: the device reports a press and the new level, split mid-token
    let chunks: [&[u8]; 3] = [b"BUTTON:PRE", b"SS\r\nDIFFICULTY:HA", b"RD\r\n"];

    // Act
    let lines = parse_stream(&chunks);

    // Assert
    assert_eq!(
        lines,
        vec![
            DeviceLine::Button {
                token: "PRESS".to_string()
            },
            DeviceLine::Difficulty(Difficulty::Hard),
        ]
    );
}

#[test]
fn test_chinese_diagnostic_split_inside_a_character() {
    let line = "LED狀態: E=0 M=1 H=0\n".as_bytes();
    // Split inside the three-byte encoding of the first CJK character
    let (a, b) = line.split_at(4);

    let lines = parse_stream(&[a, b]);

    assert_eq!(
        lines,
        vec![DeviceLine::Diagnostic("LED狀態: E=0 M=1 H=0".to_string())]
    );
}

#[test]
fn test_malformed_chunk_is_dropped_and_stream_recovers() {
    let chunks: [&[u8]; 3] = [b"DIFFICULTY:EASY\n", b"\xff\xfe garbage\n", b"DIFFICULTY:MEDIUM\n"];

    let lines = parse_stream(&chunks);

    assert_eq!(
        lines,
        vec![
            DeviceLine::Difficulty(Difficulty::Easy),
            DeviceLine::Difficulty(Difficulty::Medium),
        ]
    );
}

#[test]
fn test_every_marker_classifies_as_diagnostic() {
    for marker in DIAGNOSTIC_MARKERS {
        let text = format!("boot {marker} ok\n");
        let lines = parse_stream(&[text.as_bytes()]);
        assert!(
            matches!(lines.as_slice(), [DeviceLine::Diagnostic(_)]),
            "{marker:?}: {lines:?}"
        );
    }
}

#[test]
fn test_outbound_lights_for_each_level_parse_back_to_one_lit_channel() {
    for level in Difficulty::ALL {
        let encoded = DeviceCommand::Lights(level.lights()).encode();
        let parsed = DeviceCommand::parse(&encoded);
        assert_eq!(parsed, Some(DeviceCommand::Lights(IndicatorLights::only(level))));
        assert!(!encoded.contains('\n'));
    }
}
