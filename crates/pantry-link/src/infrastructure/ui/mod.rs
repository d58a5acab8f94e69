//! User-facing surfaces: a terminal console and a WebSocket server for a
//! browser page.  Both implement [`UiSink`](crate::application::UiSink) and
//! both turn user input into [`UiCommand`](crate::domain::UiCommand)s.

pub mod console;
pub mod mock;
pub mod ws_server;

pub use console::{parse_console_command, ConsoleUi, HELP_TEXT};
pub use ws_server::WsUi;
