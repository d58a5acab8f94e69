//! Serial transport to the button/LED device.
//!
//! [`SerialLink`] owns one connection at a time.  The bytes can come from a
//! real port ([`port::open`]) or from any async stream handed to
//! [`SerialLink::attach`], which is how tests simulate a device.

pub mod link;
pub mod mock;
pub mod port;

pub use link::{SerialLink, DEFAULT_BAUD_RATE};
pub use port::list_ports;
