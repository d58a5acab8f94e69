//! Domain layer: pure data types with no I/O.
//!
//! - [`difficulty`] – the tri-valued difficulty, its LED pattern, and the
//!   connection lifecycle of the device link.
//! - [`dish`] – recipe and cocktail records plus the requests that produce
//!   them.

pub mod difficulty;
pub mod dish;
