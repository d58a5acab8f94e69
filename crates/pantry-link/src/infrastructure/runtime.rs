//! Runtime wiring: builds every component from `AppConfig` and runs until
//! the `running` flag is cleared or a UI asks to quit.
//!
//! # Task layout
//!
//! ```text
//!  serial reader ──lines──▶ dispatcher ──▶ DifficultySync ──▶ UIs
//!  link state watch ──────▶ connection reporter (+ re-send lights)
//!  console stdin ─┐
//!                 ├─UiCommand─▶ command pump ──▶ DifficultySync / DishService /
//!  browser WS  ───┘                              DeviceAnnouncer / SerialLink
//! ```
//!
//! Dish generation may wait on the backend for a while, so each generate
//! command runs in its own task and the pump stays responsive to difficulty
//! changes meanwhile.

use std::io::BufRead;
use std::net::SocketAddr;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use pantry_core::{CocktailRequest, ConnectionState, RecipeRequest};

use crate::application::{
    DeviceAnnouncer, DeviceLink, DifficultySync, DishService, EffectTimings, FanoutUi,
    LineDispatcher, TextGenerator, UiSink,
};
use crate::domain::{ui_command_type_name, UiCommand};
use crate::infrastructure::backend::{is_plausible_api_key, CommandGenerator};
use crate::infrastructure::serial::SerialLink;
use crate::infrastructure::storage::AppConfig;
use crate::infrastructure::ui::{ws_server, ConsoleUi, WsUi};

const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// How often the pump checks the `running` flag while idle.
const IDLE_POLL: Duration = Duration::from_millis(200);

// ── Command pump ──────────────────────────────────────────────────────────────

/// Executes [`UiCommand`]s from any UI.
#[derive(Clone)]
pub struct CommandPump {
    pub sync: Arc<DifficultySync>,
    pub link: Arc<SerialLink>,
    pub dishes: Arc<DishService>,
    pub announcer: Arc<DeviceAnnouncer>,
    pub ui: Arc<dyn UiSink>,
    /// Port used by `Connect` without an explicit one.
    pub default_port: Option<String>,
    pub baud_rate: u32,
}

impl CommandPump {
    /// Runs one command to completion.  Returns `Break` for `Quit`.
    pub async fn handle(&self, command: UiCommand) -> ControlFlow<()> {
        debug!("command: {}", ui_command_type_name(&command));
        match command {
            UiCommand::SetDifficulty { difficulty } => {
                if let Err(e) = self.sync.set_from_ui(difficulty).await {
                    self.ui.status(&format!("Difficulty set, but {e}"));
                }
            }
            UiCommand::CycleDifficulty => {
                if let Err(e) = self.sync.cycle_from_ui().await {
                    self.ui.status(&format!("Difficulty set, but {e}"));
                }
            }
            UiCommand::GenerateRecipe {
                ingredients,
                requirements,
                budget,
                calories,
            } => {
                // Favourites come from the dish service's history.
                let request = RecipeRequest {
                    ingredients,
                    requirements,
                    budget,
                    calories,
                    difficulty: self.sync.current(),
                    ..RecipeRequest::default()
                };
                self.generate_recipe(request).await;
            }
            UiCommand::GenerateCocktail {
                alcohol_level,
                style,
            } => {
                let request = CocktailRequest {
                    alcohol_level: alcohol_level.unwrap_or_else(|| self.dishes.alcohol_level()),
                    style,
                };
                self.generate_cocktail(request).await;
            }
            UiCommand::CycleAlcoholLevel => {
                let level = self.dishes.cycle_alcohol_level();
                self.ui.status(&format!("Alcohol level: {level} ({})", level.abv_hint()));
            }
            UiCommand::Connect { port } => self.connect(port).await,
            UiCommand::Disconnect => self.link.close().await,
            UiCommand::TestLights => match self.announcer.light_test().await {
                Ok(true) => self.ui.status("LED test finished"),
                Ok(false) => self.ui.status("Device not connected; nothing to test"),
                Err(e) => self.ui.status(&format!("LED test failed: {e}")),
            },
            UiCommand::Status => self.ui.status(&self.status_text()),
            UiCommand::Quit => {
                info!("quit requested");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    async fn generate_recipe(&self, request: RecipeRequest) {
        self.ui.status(&format!("Generating a {} recipe...", request.difficulty));
        let generated = self.dishes.generate_recipe(request).await;
        if let Some(failure) = &generated.failure {
            if self.dishes.has_backend() {
                self.ui.status(&format!("Text backend failed ({failure}); showing an offline recipe"));
            }
        }
        self.ui.show_recipe(&generated.dish, generated.offline);
        if let Err(e) = self.announcer.announce_recipe(&generated.dish).await {
            warn!("recipe announcement failed: {e}");
        }
    }

    async fn generate_cocktail(&self, request: CocktailRequest) {
        self.ui.status(&format!("Mixing a {} cocktail...", request.alcohol_level));
        let generated = self.dishes.generate_cocktail(request).await;
        if let Some(failure) = &generated.failure {
            if self.dishes.has_backend() {
                self.ui.status(&format!("Text backend failed ({failure}); showing an offline cocktail"));
            }
        }
        self.ui.show_cocktail(&generated.dish, generated.offline);
        if let Err(e) = self.announcer.announce_cocktail(&generated.dish).await {
            warn!("cocktail announcement failed: {e}");
        }
    }

    async fn connect(&self, port: Option<String>) {
        let Some(port) = port.or_else(|| self.default_port.clone()) else {
            self.ui.status("No serial port configured; use: connect <port>");
            return;
        };
        if let Err(e) = self.link.open_port(&port, self.baud_rate).await {
            self.ui.status(&format!("Could not connect: {e}"));
        }
    }

    fn status_text(&self) -> String {
        let device = match (self.link.state(), self.link.port_name()) {
            (ConnectionState::Connected, Some(port)) => format!("connected on {port}"),
            (state, _) => state.to_string(),
        };
        let prefs = self.dishes.preferences();
        let mut text = format!(
            "Difficulty: {}  Device: {device}  Alcohol: {}  Backend: {}",
            self.sync.current(),
            self.dishes.alcohol_level(),
            if self.dishes.has_backend() { "configured" } else { "offline" },
        );
        if !prefs.favorite_ingredients.is_empty() {
            text.push_str(&format!(
                "\nFavourite ingredients: {}",
                prefs.favorite_ingredients.join(", ")
            ));
        }
        if let Some(difficulty) = prefs.preferred_difficulty {
            text.push_str(&format!("\nUsual difficulty: {difficulty}"));
        }
        text
    }
}

// ── Wiring ────────────────────────────────────────────────────────────────────

/// Builds the text backend from `[backend]`, or `None` for offline mode.
fn build_generator(config: &AppConfig) -> Option<Arc<dyn TextGenerator>> {
    let program = config.backend.command.as_ref()?;
    let mut generator = CommandGenerator::new(program.clone(), config.backend.args.clone());

    match std::env::var(&config.backend.api_key_env) {
        Ok(key) if is_plausible_api_key(&key) => {
            generator = generator.with_api_key(config.backend.api_key_env.clone(), key.trim());
        }
        Ok(_) => warn!(
            "{} does not look like an API key; starting the backend without it",
            config.backend.api_key_env
        ),
        Err(_) => debug!("{} not set", config.backend.api_key_env),
    }

    info!("text backend: {program}");
    Some(Arc::new(generator))
}

/// Forwards stdin lines into an async pipe from a plain OS thread, so a
/// pending terminal read never holds up shutdown.
fn spawn_stdin_bridge() -> DuplexStream {
    let (reader, mut writer) = tokio::io::duplex(1024);
    let handle = Handle::current();
    let spawned = std::thread::Builder::new()
        .name("console-stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(mut line) = line else { break };
                line.push('\n');
                if handle.block_on(writer.write_all(line.as_bytes())).is_err() {
                    break;
                }
            }
        });
    if let Err(e) = spawned {
        warn!("console input unavailable: {e}");
    }
    reader
}

/// Runs the whole application until `running` is cleared or a UI quits.
///
/// # Errors
///
/// Fails if the WebSocket address is invalid or cannot be bound.
pub async fn run(config: AppConfig, running: Arc<AtomicBool>) -> anyhow::Result<()> {
    let initial = config.app.default_difficulty;
    let (link, lines) = SerialLink::new(config.device.write_timeout());

    // ── UI surfaces ───────────────────────────────────────────────────────────
    let mut fanout = FanoutUi::new();
    let console = config.ui.console.then(|| Arc::new(ConsoleUi::stdout()));
    if let Some(console) = &console {
        fanout = fanout.with(Arc::clone(console) as Arc<dyn UiSink>);
    }
    let ws = config.ui.enable_ws.then(|| Arc::new(WsUi::new(initial)));
    if let Some(ws) = &ws {
        fanout = fanout.with(Arc::clone(ws) as Arc<dyn UiSink>);
    }
    let ui: Arc<dyn UiSink> = Arc::new(fanout);

    // ── Core services ─────────────────────────────────────────────────────────
    let sync = Arc::new(DifficultySync::new(
        initial,
        Arc::clone(&link) as Arc<dyn DeviceLink>,
        Arc::clone(&ui),
    ));
    ui.set_difficulty_indicator(initial);

    let dishes = Arc::new(DishService::new(build_generator(&config), config.backend.timeout()));
    let timings = EffectTimings {
        blink_interval: Duration::from_millis(config.device.blink_interval_ms),
        light_test_step: Duration::from_millis(config.device.light_test_step_ms),
    };
    let announcer = Arc::new(DeviceAnnouncer::new(
        Arc::clone(&link) as Arc<dyn DeviceLink>,
        Arc::clone(&sync),
        timings,
    ));

    // ── Device → host ─────────────────────────────────────────────────────────
    let dispatcher = LineDispatcher::new(Arc::clone(&sync), Arc::clone(&ui));
    let dispatcher_task = tokio::spawn(async move { dispatcher.run(lines).await });

    let reporter_task = {
        let mut state_rx = link.subscribe();
        let link = Arc::clone(&link);
        let sync = Arc::clone(&sync);
        let ui = Arc::clone(&ui);
        tokio::spawn(async move {
            while state_rx.changed().await.is_ok() {
                let state = *state_rx.borrow_and_update();
                let port = link.port_name();
                ui.connection_changed(state, port.as_deref());
                if state == ConnectionState::Connected {
                    if let Err(e) = sync.resend_lights().await {
                        warn!("could not restore the device lights: {e}");
                    }
                }
            }
        })
    };

    // ── UI → host ─────────────────────────────────────────────────────────────
    let (command_tx, mut command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

    let ws_task = match &ws {
        Some(ws) => {
            let addr: SocketAddr = config
                .ui
                .ws_bind
                .parse()
                .with_context(|| format!("invalid ws_bind address {:?}", config.ui.ws_bind))?;
            let listener = ws_server::bind(addr).await?;
            Some(tokio::spawn(ws_server::run_server(
                listener,
                Arc::clone(ws),
                command_tx.clone(),
                Arc::clone(&running),
            )))
        }
        None => None,
    };

    let console_task = console.map(|console| {
        let tx = command_tx.clone();
        console.status("Pantry Link ready. Type 'help' for commands.");
        tokio::spawn(async move {
            let input = BufReader::new(spawn_stdin_bridge());
            console.read_commands(input, tx).await;
        })
    });
    drop(command_tx);

    let pump = CommandPump {
        sync: Arc::clone(&sync),
        link: Arc::clone(&link),
        dishes,
        announcer,
        ui: Arc::clone(&ui),
        default_port: config.device.port.clone(),
        baud_rate: config.device.baud_rate,
    };

    if config.device.auto_connect && config.device.port.is_some() {
        pump.handle(UiCommand::Connect { port: None }).await;
    } else if config.device.port.is_none() {
        ui.status("No serial port configured; running without the device");
    }

    // ── Command pump ──────────────────────────────────────────────────────────
    while running.load(Ordering::Relaxed) {
        let command = match tokio::time::timeout(IDLE_POLL, command_rx.recv()).await {
            Ok(Some(command)) => command,
            Ok(None) => {
                info!("all command sources closed");
                break;
            }
            Err(_) => continue,
        };

        match command {
            UiCommand::GenerateRecipe { .. } | UiCommand::GenerateCocktail { .. } => {
                let pump = pump.clone();
                tokio::spawn(async move {
                    pump.handle(command).await;
                });
            }
            other => {
                if pump.handle(other).await.is_break() {
                    break;
                }
            }
        }
    }

    // ── Shutdown ──────────────────────────────────────────────────────────────
    info!("shutting down");
    running.store(false, Ordering::Relaxed);
    link.close().await;
    if let Some(task) = ws_task {
        let _ = task.await;
    }
    if let Some(task) = console_task {
        task.abort();
    }
    reporter_task.abort();
    dispatcher_task.abort();
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
