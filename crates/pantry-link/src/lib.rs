//! pantry-link library crate.
//!
//! Keeps a small button/LED device and the on-screen UIs agreeing on one
//! recipe difficulty, and serves generated (or offline) recipes and
//! cocktails to both.
//!
//! # Architecture (clean architecture)
//!
//! ```text
//! Device (serial lines)          Console / Browser (text / JSON)
//!         ↕                                  ↕
//! [pantry-link]
//!   ├── domain/           Pure types: browser JSON messages
//!   ├── application/      DifficultySync, LineDispatcher, DishService,
//!   │                     DeviceAnnouncer, PreferenceHistory
//!   └── infrastructure/
//!         ├── serial/     SerialLink over a real port or any async stream
//!         ├── ui/         Console and WebSocket UIs
//!         ├── backend     External text generator program
//!         ├── storage/    TOML configuration
//!         └── runtime     Wires everything together
//! ```
//!
//! # Layer rules
//!
//! - `domain` has no I/O.
//! - `application` depends on `domain` and `pantry-core`, and reaches the
//!   outside world only through the `DeviceLink`, `UiSink` and
//!   `TextGenerator` traits.
//! - `infrastructure` depends on all other layers plus `tokio`,
//!   `serialport` and `tungstenite`.
//!
//! # For beginners: why this structure?
//!
//! The interesting logic here (echo suppression, line dispatch, fallback
//! dishes) does not care whether bytes come from a USB cable or a test
//! buffer.  Keeping it behind small traits means every rule can be tested
//! with an in-memory mock, and the serial or browser plumbing can change
//! without touching it.

/// Domain layer: browser-facing message types.
pub mod domain;

/// Application layer: difficulty sync, dispatch, and dish generation.
pub mod application;

/// Infrastructure layer: serial link, UIs, backend, config, runtime.
pub mod infrastructure;
