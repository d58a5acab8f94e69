//! Pantry Link entry point.
//!
//! Connects to the button/LED difficulty device over a serial port, keeps it
//! in sync with the console and browser UIs, and serves recipes and
//! cocktails from an external text backend or the built-in offline set.
//!
//! # Usage
//!
//! ```text
//! pantry-link [OPTIONS]
//!
//! Options:
//!   --config <PATH>            Config file [default: platform config dir]
//!   --port <PORT>              Serial port, e.g. /dev/ttyACM0 or COM3
//!   --baud <BAUD>              Serial baud rate [default: 9600]
//!   --ws-bind <ADDR>           Browser UI address [default: 127.0.0.1:24810]
//!   --no-ws                    Do not start the browser UI
//!   --no-console               Do not read commands from stdin
//!   --list-ports               Print the serial ports and exit
//!   --backend-command <PATH>   Text generator program
//!   --log-level <LEVEL>        Fallback when RUST_LOG is unset
//! ```
//!
//! # Precedence
//!
//! Command-line flags beat `PANTRY_*` environment variables, which beat the
//! config file, which beats the built-in defaults.
//!
//! | Variable                  | Flag                 |
//! |---------------------------|----------------------|
//! | `PANTRY_CONFIG`           | `--config`           |
//! | `PANTRY_PORT`             | `--port`             |
//! | `PANTRY_BAUD`             | `--baud`             |
//! | `PANTRY_WS_BIND`          | `--ws-bind`          |
//! | `PANTRY_BACKEND_COMMAND`  | `--backend-command`  |
//! | `PANTRY_LOG_LEVEL`        | `--log-level`        |

use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use pantry_link::infrastructure::runtime::run;
use pantry_link::infrastructure::serial::list_ports;
use pantry_link::infrastructure::storage::{load_config, load_config_from, AppConfig};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Pantry Link: difficulty device sync plus recipe and cocktail helper.
#[derive(Debug, Parser)]
#[command(
    name = "pantry-link",
    about = "Keeps a button/LED difficulty device in sync with a recipe and cocktail helper",
    version
)]
struct Cli {
    /// Config file to load instead of the platform default.
    #[arg(long, env = "PANTRY_CONFIG")]
    config: Option<PathBuf>,

    /// Serial port of the device.
    #[arg(long, env = "PANTRY_PORT")]
    port: Option<String>,

    /// Serial baud rate.
    #[arg(long, env = "PANTRY_BAUD")]
    baud: Option<u32>,

    /// Address the browser UI listens on.
    #[arg(long, env = "PANTRY_WS_BIND")]
    ws_bind: Option<String>,

    /// Do not start the browser UI.
    #[arg(long)]
    no_ws: bool,

    /// Do not read commands from stdin.
    #[arg(long)]
    no_console: bool,

    /// Print the available serial ports and exit.
    #[arg(long)]
    list_ports: bool,

    /// Program that turns a prompt on stdin into text on stdout.
    #[arg(long, env = "PANTRY_BACKEND_COMMAND")]
    backend_command: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, env = "PANTRY_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    /// Loads the config file and applies the command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed.
    fn into_app_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => load_config_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?,
            None => load_config().context("failed to load config")?,
        };
        self.apply_overrides(&mut config);
        Ok(config)
    }

    fn apply_overrides(self, config: &mut AppConfig) {
        if let Some(port) = self.port {
            config.device.port = Some(port);
        }
        if let Some(baud) = self.baud {
            config.device.baud_rate = baud;
        }
        if let Some(ws_bind) = self.ws_bind {
            config.ui.ws_bind = ws_bind;
        }
        if self.no_ws {
            config.ui.enable_ws = false;
        }
        if self.no_console {
            config.ui.console = false;
        }
        if let Some(command) = self.backend_command {
            config.backend.command = Some(command);
        }
        if let Some(level) = self.log_level {
            config.app.log_level = level;
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.list_ports {
        let ports = list_ports().context("failed to enumerate serial ports")?;
        if ports.is_empty() {
            println!("No serial ports found");
        }
        for port in ports {
            println!("{port}");
        }
        return Ok(());
    }

    let config = cli.into_app_config()?;

    // ── Logging setup ─────────────────────────────────────────────────────────
    //
    // `RUST_LOG` wins; otherwise the configured level.  Logs go to stderr so
    // they never interleave with the console UI on stdout.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.app.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Pantry Link starting: port={}, ws={}",
        config.device.port.as_deref().unwrap_or("none"),
        if config.ui.enable_ws { config.ui.ws_bind.as_str() } else { "off" }
    );

    // ── Graceful shutdown flag ────────────────────────────────────────────────
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = Arc::clone(&running);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, shutting down");
                running_clone.store(false, Ordering::Relaxed);
            }
            Err(e) => tracing::error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    run(config, running).await?;

    info!("Pantry Link stopped");
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_without_flags_changes_nothing() {
        // Arrange
        let cli = Cli::parse_from(["pantry-link"]);
        let mut config = AppConfig::default();

        // Act
        cli.apply_overrides(&mut config);

        // Assert
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_cli_flags_override_config_values() {
        let cli = Cli::parse_from([
            "pantry-link",
            "--port",
            "/dev/ttyACM0",
            "--baud",
            "115200",
            "--ws-bind",
            "0.0.0.0:9000",
            "--backend-command",
            "gen-text",
            "--log-level",
            "debug",
        ]);
        let mut config = AppConfig::default();

        cli.apply_overrides(&mut config);

        assert_eq!(config.device.port.as_deref(), Some("/dev/ttyACM0"));
        assert_eq!(config.device.baud_rate, 115200);
        assert_eq!(config.ui.ws_bind, "0.0.0.0:9000");
        assert_eq!(config.backend.command.as_deref(), Some("gen-text"));
        assert_eq!(config.app.log_level, "debug");
    }

    #[test]
    fn test_cli_switches_disable_surfaces() {
        let cli = Cli::parse_from(["pantry-link", "--no-ws", "--no-console"]);
        let mut config = AppConfig::default();

        cli.apply_overrides(&mut config);

        assert!(!config.ui.enable_ws);
        assert!(!config.ui.console);
    }

    #[test]
    fn test_list_ports_flag_parses() {
        let cli = Cli::parse_from(["pantry-link", "--list-ports"]);
        assert!(cli.list_ports);
    }

    #[test]
    fn test_into_app_config_with_missing_file_uses_defaults_plus_flags() {
        let missing = std::env::temp_dir().join("pantry-link-no-such-dir/config.toml");
        let cli = Cli::parse_from([
            "pantry-link",
            "--config",
            missing.to_str().unwrap(),
            "--port",
            "COM3",
        ]);

        let config = cli.into_app_config().unwrap();

        assert_eq!(config.device.port.as_deref(), Some("COM3"));
        assert_eq!(config.device.baud_rate, 9600);
    }
}
