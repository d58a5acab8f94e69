//! # pantry-core
//!
//! Shared library for Pantry Link containing the difficulty domain, the
//! serial line protocol spoken by the button/LED device, and the free-text
//! extractor that turns generated recipe and cocktail text into records.
//!
//! It has zero dependencies on serial ports, sockets, or terminals.  All I/O
//! lives in `pantry-link`.
//!
//! # Architecture overview (for beginners)
//!
//! Pantry Link is a small kitchen helper.  A user asks for a recipe or a
//! convenience-store cocktail; a text backend (optional) writes one; a
//! physical box with a button and three LEDs mirrors the chosen difficulty.
//!
//! This crate defines:
//!
//! - **`domain`** – Plain data: the three difficulty levels, which LEDs are
//!   lit, where a change came from, and the recipe/cocktail records.
//!
//! - **`protocol`** – How text travels over the serial line.  Raw chunks are
//!   decoded as UTF-8, split into newline-terminated lines, and classified
//!   into typed [`DeviceLine`] values.  Outbound commands are typed
//!   [`DeviceCommand`] values encoded into single lines.
//!
//! - **`extract`** – Best-effort field mining over generated text.  Every
//!   field falls back through a fixed chain of strategies and records which
//!   one produced it.
//!
//! - **`prompt`** / **`fallback`** – Prompt builders that ask the backend for
//!   the layout `extract` understands, and canned dishes used when no backend
//!   answers.

pub mod domain;
pub mod extract;
pub mod fallback;
pub mod prompt;
pub mod protocol;

// Re-export the most-used types at the crate root so callers can write
// `pantry_core::Difficulty` instead of `pantry_core::domain::difficulty::Difficulty`.
pub use domain::difficulty::{ConnectionState, Difficulty, IndicatorLights, SyncOrigin};
pub use domain::dish::{
    AlcoholLevel, Cocktail, CocktailRequest, CocktailStyle, Recipe, RecipeRequest,
};
pub use extract::{Field, FieldSource};
pub use protocol::framer::{ChunkDecoder, LineFramer};
pub use protocol::messages::{DeviceCommand, DeviceLine, ProtocolError};
