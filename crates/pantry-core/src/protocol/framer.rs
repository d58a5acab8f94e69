//! Streaming UTF-8 decoding and newline framing for the serial link.
//!
//! Both types are created fresh for every connection and dropped when it
//! closes, so no partial line or half-decoded character survives a reconnect.
//!
//! # Known limitation
//!
//! The framer never caps its buffer.  A peer that streams text without ever
//! sending `\n` makes the buffer grow without bound.  The device firmware
//! always terminates lines, so this is accepted rather than guarded.

use crate::protocol::messages::ProtocolError;

// ── Chunk decoder ─────────────────────────────────────────────────────────────

/// Turns raw serial chunks into text.
///
/// A multi-byte character split across two reads is held back and completed
/// by the next chunk.  A chunk containing a genuinely malformed sequence is
/// rejected as a whole with [`ProtocolError::Decode`]; the caller logs it and
/// keeps reading.
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    /// Bytes of an incomplete trailing character from the previous chunk.
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes `chunk`, prefixed by any bytes held back from the last call.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Decode`] if the bytes contain an invalid UTF-8
    /// sequence.  The held-back bytes and the whole chunk are discarded in
    /// that case.
    pub fn decode(&mut self, chunk: &[u8]) -> Result<String, ProtocolError> {
        let mut bytes = std::mem::take(&mut self.pending);
        bytes.extend_from_slice(chunk);

        match std::str::from_utf8(&bytes) {
            Ok(text) => Ok(text.to_owned()),
            // `error_len() == None` means the input ended in the middle of a
            // character: everything up to `valid_up_to` is fine, the tail
            // waits for the next chunk.
            Err(e) if e.error_len().is_none() => {
                let valid = e.valid_up_to();
                self.pending = bytes.split_off(valid);
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            Err(e) => Err(ProtocolError::Decode {
                valid_up_to: e.valid_up_to(),
                len: bytes.len(),
            }),
        }
    }

    /// Number of bytes currently held back.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

// ── Line framer ───────────────────────────────────────────────────────────────

/// Splits a chunked text stream into trimmed, non-empty lines.
///
/// # Example
///
/// ```
/// use pantry_core::LineFramer;
///
/// let mut framer = LineFramer::new();
/// assert!(framer.feed("BUTTON:TOG").is_empty());
/// assert_eq!(framer.feed("GLE\r\nDIFF"), vec!["BUTTON:TOGGLE"]);
/// assert_eq!(framer.pending(), "DIFF");
/// ```
#[derive(Debug, Default)]
pub struct LineFramer {
    /// Text after the last `\n` seen so far.  Holds at most one fragment.
    buffer: String,
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `chunk` and returns every line it completed, in order.
    ///
    /// Lines are trimmed of surrounding whitespace (including the `\r` of a
    /// CRLF terminator) and empty lines are dropped.
    pub fn feed(&mut self, chunk: &str) -> Vec<String> {
        self.buffer.push_str(chunk);

        let Some(last_newline) = self.buffer.rfind('\n') else {
            return Vec::new();
        };

        // Everything up to and including the last '\n' is complete; the rest
        // becomes the new buffer.
        let fragment = self.buffer.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.buffer, fragment);

        complete
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// The incomplete fragment waiting for its terminator.
    pub fn pending(&self) -> &str {
        &self.buffer
    }

    /// Discards any buffered fragment.
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "BUTTON:TOGGLE\nDIFFICULTY:HARD\n";

    #[test]
    fn test_feed_whole_input_yields_both_lines() {
        let mut framer = LineFramer::new();
        assert_eq!(framer.feed(SAMPLE), vec!["BUTTON:TOGGLE", "DIFFICULTY:HARD"]);
        assert_eq!(framer.pending(), "");
    }

    #[test]
    fn test_feed_split_at_every_offset_matches_whole_feed() {
        for offset in 0..=SAMPLE.len() {
            // Arrange
            let mut framer = LineFramer::new();
            let (a, b) = SAMPLE.split_at(offset);

            // Act
            let mut lines = framer.feed(a);
            lines.extend(framer.feed(b));

            // Assert
            assert_eq!(
                lines,
                vec!["BUTTON:TOGGLE", "DIFFICULTY:HARD"],
                "split at {offset}"
            );
        }
    }

    #[test]
    fn test_feed_without_newline_buffers_everything() {
        let mut framer = LineFramer::new();
        assert!(framer.feed("DIFFICULTY:").is_empty());
        assert!(framer.feed("EA").is_empty());
        assert_eq!(framer.pending(), "DIFFICULTY:EA");
    }

    #[test]
    fn test_feed_trims_and_drops_blank_lines() {
        let mut framer = LineFramer::new();
        let lines = framer.feed("  BUTTON:TOGGLE \r\n\r\n   \n\tDIFFICULTY:EASY\r\n");
        assert_eq!(lines, vec!["BUTTON:TOGGLE", "DIFFICULTY:EASY"]);
    }

    #[test]
    fn test_line_count_matches_newlines_over_single_byte_chunks() {
        // Arrange: 5 newlines, every segment non-empty after trim
        let input = "a\nbb\n ccc \nDIFFICULTY:MEDIUM\nLED狀態: ok\ntail";
        let mut framer = LineFramer::new();

        // Act: feed one character at a time
        let mut lines = Vec::new();
        for ch in input.chars() {
            lines.extend(framer.feed(&ch.to_string()));
        }

        // Assert
        assert_eq!(lines, vec!["a", "bb", "ccc", "DIFFICULTY:MEDIUM", "LED狀態: ok"]);
        assert_eq!(framer.pending(), "tail");
    }

    #[test]
    fn test_clear_discards_fragment() {
        let mut framer = LineFramer::new();
        framer.feed("half");
        framer.clear();
        assert_eq!(framer.feed("line\n"), vec!["line"]);
    }

    #[test]
    fn test_decoder_carries_split_multibyte_character() {
        // Arrange: "狀" is three bytes; split after the first byte
        let bytes = "LED狀態\n".as_bytes();
        let split = 4;
        let mut decoder = ChunkDecoder::new();

        // Act
        let first = decoder.decode(&bytes[..split]).unwrap();
        let held = decoder.pending_len();
        let second = decoder.decode(&bytes[split..]).unwrap();

        // Assert
        assert_eq!(first, "LED");
        assert_eq!(held, 1);
        assert_eq!(second, "狀態\n");
        assert_eq!(decoder.pending_len(), 0);
    }

    #[test]
    fn test_decoder_every_split_reassembles_original_text() {
        let text = "按鈕 pressed\nDIFFICULTY:HARD\n系統 ready\n";
        let bytes = text.as_bytes();
        for split in 0..=bytes.len() {
            let mut decoder = ChunkDecoder::new();
            let mut out = decoder.decode(&bytes[..split]).unwrap();
            out.push_str(&decoder.decode(&bytes[split..]).unwrap());
            assert_eq!(out, text, "split at {split}");
        }
    }

    #[test]
    fn test_decoder_rejects_malformed_chunk_and_recovers() {
        let mut decoder = ChunkDecoder::new();

        // Act: 0xFF can never appear in UTF-8
        let bad = decoder.decode(b"DIFF\xFFICULTY\n");

        // Assert: chunk rejected, next chunk decodes normally
        assert!(matches!(bad, Err(ProtocolError::Decode { valid_up_to: 4, .. })));
        assert_eq!(decoder.decode(b"DIFFICULTY:EASY\n").unwrap(), "DIFFICULTY:EASY\n");
    }
}
