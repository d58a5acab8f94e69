//! Serial line protocol: chunk decoding, line framing, and message types.
//!
//! # Data flow (for beginners)
//!
//! ```text
//! serial bytes ─▶ ChunkDecoder ─▶ text ─▶ LineFramer ─▶ lines ─▶ DeviceLine::parse
//! ```
//!
//! A serial port is a byte *stream*: one `read()` may return half a line, or
//! three lines at once, or even half of a multi-byte UTF-8 character.  The
//! decoder and framer together hide that from everything downstream, which
//! only ever sees whole, trimmed, non-empty lines.

pub mod framer;
pub mod messages;

pub use framer::{ChunkDecoder, LineFramer};
pub use messages::{DeviceCommand, DeviceLine, ProtocolError, DIAGNOSTIC_MARKERS};
