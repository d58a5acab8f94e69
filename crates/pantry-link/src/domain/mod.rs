//! Domain layer for pantry-link.
//!
//! Pure types with no I/O: the JSON messages exchanged with browser UIs.
//! Difficulty, dish and protocol types live in `pantry-core` and are shared
//! with it.
//!
//! # What does NOT belong here?
//!
//! - Any `tokio`, serial port, or WebSocket types
//! - File I/O or environment variable reading

pub mod messages;

pub use messages::{ui_command_type_name, UiCommand, UiEvent};
