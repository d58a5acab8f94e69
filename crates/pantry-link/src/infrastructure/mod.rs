//! Infrastructure layer for Pantry Link.
//!
//! Contains OS-facing adapters: the serial port link, the console and
//! browser UIs, the external text backend, file-system storage, and the
//! runtime that wires them together.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `pantry_core`, but MUST NOT be imported by the `application` or domain
//! layers (test-only mocks excepted).

pub mod backend;
pub mod runtime;
pub mod serial;
pub mod storage;
pub mod ui;
