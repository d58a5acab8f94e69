//! Terminal UI: prints events as plain lines and reads commands from stdin.
//!
//! # Commands
//!
//! ```text
//! easy | medium | hard        set the difficulty
//! next                        cycle the difficulty
//! recipe [items] [budget=N] [calories=N] [need=X]
//! cocktail [light|medium|strong] [convenience|fruit|classic|creative]
//! alcohol                     cycle the default alcohol level
//! connect [port] | disconnect
//! lights                      run the LED test on the device
//! status | help | quit
//! ```

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use pantry_core::{
    AlcoholLevel, Cocktail, CocktailStyle, ConnectionState, Difficulty, Recipe, SyncOrigin,
};

use crate::application::ui_sink::UiSink;
use crate::domain::UiCommand;

pub const HELP_TEXT: &str = "\
Commands:
  easy | medium | hard         set the difficulty
  next                         cycle the difficulty
  recipe [ingredients...]      generate a recipe (budget=N calories=N need=X)
  cocktail [level] [style]     generate a cocktail (light|medium|strong)
  alcohol                      cycle the default alcohol level
  connect [port]               open the serial port
  disconnect                   close the serial port
  lights                       run the LED test on the device
  status                       show the current state
  help                         show this text
  quit                         exit";

/// One parsed console line.
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleInput {
    Command(UiCommand),
    Help,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleParseError {
    #[error("unknown command {0:?}; type 'help' for a list")]
    Unknown(String),

    #[error("{command}: cannot use {value:?}")]
    InvalidArgument { command: &'static str, value: String },
}

/// Parses one console line.  Command words are case-insensitive.
pub fn parse_console_command(line: &str) -> Result<ConsoleInput, ConsoleParseError> {
    let mut words = line.split_whitespace();
    let Some(head) = words.next() else {
        return Ok(ConsoleInput::Empty);
    };
    let args: Vec<&str> = words.collect();

    let command = match head.to_ascii_lowercase().as_str() {
        "easy" => UiCommand::SetDifficulty {
            difficulty: Difficulty::Easy,
        },
        "medium" => UiCommand::SetDifficulty {
            difficulty: Difficulty::Medium,
        },
        "hard" => UiCommand::SetDifficulty {
            difficulty: Difficulty::Hard,
        },
        "next" => UiCommand::CycleDifficulty,
        "recipe" => parse_recipe_args(&args)?,
        "cocktail" => parse_cocktail_args(&args)?,
        "alcohol" => UiCommand::CycleAlcoholLevel,
        "connect" => UiCommand::Connect {
            port: args.first().map(|p| p.to_string()),
        },
        "disconnect" => UiCommand::Disconnect,
        "lights" => UiCommand::TestLights,
        "status" => UiCommand::Status,
        "quit" | "exit" => UiCommand::Quit,
        "help" | "?" => return Ok(ConsoleInput::Help),
        other => return Err(ConsoleParseError::Unknown(other.to_string())),
    };
    Ok(ConsoleInput::Command(command))
}

fn parse_recipe_args(args: &[&str]) -> Result<UiCommand, ConsoleParseError> {
    let mut ingredients = Vec::new();
    let mut requirements = Vec::new();
    let mut budget = None;
    let mut calories = None;

    for arg in args {
        if let Some(value) = arg.strip_prefix("budget=") {
            budget = Some(parse_number("recipe", value)?);
        } else if let Some(value) = arg.strip_prefix("calories=") {
            calories = Some(parse_number("recipe", value)?);
        } else if let Some(value) = arg.strip_prefix("need=") {
            requirements.push(value.to_string());
        } else {
            ingredients.extend(
                arg.split([',', '、', '，'])
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string),
            );
        }
    }

    Ok(UiCommand::GenerateRecipe {
        ingredients,
        requirements,
        budget,
        calories,
    })
}

fn parse_cocktail_args(args: &[&str]) -> Result<UiCommand, ConsoleParseError> {
    let mut alcohol_level = None;
    let mut style = None;
    for arg in args {
        if let Some(level) = AlcoholLevel::from_name(arg) {
            alcohol_level = Some(level);
        } else if let Some(s) = CocktailStyle::from_name(arg) {
            style = Some(s);
        } else {
            return Err(ConsoleParseError::InvalidArgument {
                command: "cocktail",
                value: arg.to_string(),
            });
        }
    }
    Ok(UiCommand::GenerateCocktail {
        alcohol_level,
        style,
    })
}

fn parse_number(command: &'static str, value: &str) -> Result<u32, ConsoleParseError> {
    value
        .parse()
        .map_err(|_| ConsoleParseError::InvalidArgument {
            command,
            value: value.to_string(),
        })
}

// ── Output ────────────────────────────────────────────────────────────────────

/// Prints every UI event as human-readable text.
pub struct ConsoleUi {
    out: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleUi {
    pub fn stdout() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    fn print(&self, text: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{text}").and_then(|()| out.flush()) {
            debug!("console write failed: {e}");
        }
    }

    /// Reads commands from `input` until EOF or `quit`, forwarding each one
    /// on `commands`.  Parse errors and `help` are answered directly.
    pub async fn read_commands<R>(&self, input: R, commands: mpsc::Sender<UiCommand>)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            let line = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    debug!("console input closed");
                    break;
                }
                Err(e) => {
                    warn!("console read failed: {e}");
                    break;
                }
            };

            match parse_console_command(&line) {
                Ok(ConsoleInput::Command(command)) => {
                    let quit = command == UiCommand::Quit;
                    if commands.send(command).await.is_err() || quit {
                        break;
                    }
                }
                Ok(ConsoleInput::Help) => self.print(HELP_TEXT),
                Ok(ConsoleInput::Empty) => {}
                Err(e) => self.print(&e.to_string()),
            }
        }
    }
}

fn indicator_row(current: Difficulty) -> String {
    Difficulty::ALL
        .iter()
        .map(|d| {
            let mark = if *d == current { '*' } else { ' ' };
            format!("({mark}) {d}")
        })
        .collect::<Vec<_>>()
        .join("  ")
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("  {}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n")
}

impl UiSink for ConsoleUi {
    fn set_difficulty_indicator(&self, difficulty: Difficulty) {
        self.print(&format!("Difficulty  {}", indicator_row(difficulty)));
    }

    fn notify_difficulty_changed(&self, difficulty: Difficulty, origin: SyncOrigin) {
        let source = match origin {
            SyncOrigin::FromDevice => "device button",
            SyncOrigin::FromUi => "screen",
        };
        self.print(&format!("Difficulty is now {difficulty} (set from the {source})"));
    }

    fn append_diagnostic(&self, line: &str) {
        self.print(&format!("[device] {line}"));
    }

    fn connection_changed(&self, state: ConnectionState, port: Option<&str>) {
        let text = match (state, port) {
            (ConnectionState::Connected, Some(port)) => format!("Device connected on {port}"),
            (ConnectionState::Connected, None) => "Device connected".to_string(),
            (ConnectionState::Connecting, _) => "Connecting to the device...".to_string(),
            (ConnectionState::Disconnected, _) => "Device disconnected".to_string(),
        };
        self.print(&text);
    }

    fn show_recipe(&self, recipe: &Recipe, offline: bool) {
        let mut text = format!("\n=== {} ===", recipe.name);
        if offline {
            text.push_str(" (offline recipe)");
        }
        text.push_str(&format!(
            "\nDifficulty: {}   Budget: {} NT$   Calories: {} kcal",
            recipe.difficulty, recipe.budget, recipe.calories
        ));
        if !recipe.tags.is_empty() {
            text.push_str(&format!("\nTags: {}", recipe.tags.join(", ")));
        }
        text.push_str(&format!("\nIngredients:\n{}", numbered(&recipe.ingredients)));
        text.push_str(&format!("\nSteps:\n{}\n", numbered(&recipe.steps)));
        self.print(&text);
    }

    fn show_cocktail(&self, cocktail: &Cocktail, offline: bool) {
        let mut text = format!("\n=== {} ===", cocktail.name);
        if offline {
            text.push_str(" (offline cocktail)");
        }
        text.push_str(&format!(
            "\nStrength: {}   Style: {}",
            cocktail.alcohol_level, cocktail.style
        ));
        text.push_str(&format!("\nIngredients:\n{}", numbered(&cocktail.ingredients)));
        text.push_str(&format!("\nSteps:\n{}\n", numbered(&cocktail.steps)));
        self.print(&text);
    }

    fn status(&self, message: &str) {
        self.print(message);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
