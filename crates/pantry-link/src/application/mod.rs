//! Application layer for pantry-link.
//!
//! The application layer knows *what* happens when a line arrives from the
//! device or a command arrives from a UI, and delegates *how* bytes move to
//! the infrastructure layer through two traits:
//!
//! - [`DeviceLink`] – writes lines to the device and reports link state.
//! - [`UiSink`] – shows state changes, diagnostics and dishes to the user.
//!
//! # What does NOT belong here?
//!
//! - Opening serial ports or sockets (that is infrastructure)
//! - Reading stdin or printing (that is infrastructure)
//! - Spawning long-lived tasks (that happens in `infrastructure::runtime`)

pub mod announce;
pub mod device_link;
pub mod difficulty_sync;
pub mod dispatch;
pub mod generate_dish;
pub mod preferences;
pub mod ui_sink;

pub use announce::{DeviceAnnouncer, EffectTimings};
pub use device_link::{DeviceLink, TransportError};
pub use difficulty_sync::{DifficultySync, SyncError, SyncOutcome};
pub use dispatch::LineDispatcher;
pub use generate_dish::{DishService, GenerateError, Generated, TextGenerator};
pub use preferences::{PreferenceHistory, PreferenceSummary};
pub use ui_sink::{FanoutUi, UiSink};
