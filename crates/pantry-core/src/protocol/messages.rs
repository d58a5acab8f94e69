//! Inbound and outbound serial line messages.
//!
//! # Inbound grammar (device → host)
//!
//! | Line                         | Parsed as                          |
//! |------------------------------|------------------------------------|
//! | `BUTTON:<token>`             | [`DeviceLine::Button`]             |
//! | `DIFFICULTY:<EASY\|MEDIUM\|HARD>` | [`DeviceLine::Difficulty`] (payload case-insensitive) |
//! | `DIFFICULTY:<other>`         | [`DeviceLine::InvalidDifficulty`]  |
//! | contains a diagnostic marker | [`DeviceLine::Diagnostic`]         |
//! | anything else                | [`DeviceLine::Unrecognized`]       |
//!
//! Prefixes are case-sensitive.  Parsing is total: every line maps to exactly
//! one variant and nothing here can fail.
//!
//! # Outbound grammar (host → device)
//!
//! ```text
//! LIGHTS:EASY:<0|1>,MEDIUM:<0|1>,HARD:<0|1>
//! RECIPE_GENERATED:<name>
//! COCKTAIL_GENERATED:<name>
//! STATS:BUDGET:<n>,CALORIES:<n>
//! ```
//!
//! [`DeviceCommand::encode`] returns the line *without* its `\n` terminator;
//! the link appends it when writing.

use thiserror::Error;

use crate::domain::difficulty::{Difficulty, IndicatorLights};

/// Substrings that mark a line as firmware log output.
///
/// The firmware prints LED state and boot chatter in both Chinese and English.
pub const DIAGNOSTIC_MARKERS: &[&str] = &[
    "LED狀態:",
    "按鈕",
    "Arduino",
    "系統",
    "LED state:",
    "System",
];

const BUTTON_PREFIX: &str = "BUTTON:";
const DIFFICULTY_PREFIX: &str = "DIFFICULTY:";
const LIGHTS_PREFIX: &str = "LIGHTS:";
const RECIPE_PREFIX: &str = "RECIPE_GENERATED:";
const COCKTAIL_PREFIX: &str = "COCKTAIL_GENERATED:";
const STATS_PREFIX: &str = "STATS:";

/// Error type for the serial line protocol.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// A `DIFFICULTY:` payload (or any other difficulty input) was not one of
    /// the three canonical tokens.
    #[error("invalid difficulty token: {token:?}")]
    InvalidDifficultyToken { token: String },

    /// A serial chunk contained bytes that are not valid UTF-8.
    #[error("malformed UTF-8 in serial chunk: {len} bytes, valid up to byte {valid_up_to}")]
    Decode { valid_up_to: usize, len: usize },
}

// ── Inbound ───────────────────────────────────────────────────────────────────

/// A classified line received from the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceLine {
    /// A button event.  Informational only; the device follows it with a
    /// `DIFFICULTY:` line carrying the new level.
    Button { token: String },
    /// The device reports a new difficulty.
    Difficulty(Difficulty),
    /// A `DIFFICULTY:` line whose payload is not a known level.
    InvalidDifficulty { token: String },
    /// Firmware log text.
    Diagnostic(String),
    /// Anything else.
    Unrecognized(String),
}

impl DeviceLine {
    /// Classifies one complete, already-trimmed line.
    pub fn parse(line: &str) -> DeviceLine {
        if let Some(token) = line.strip_prefix(BUTTON_PREFIX) {
            return DeviceLine::Button {
                token: token.trim().to_string(),
            };
        }

        if let Some(payload) = line.strip_prefix(DIFFICULTY_PREFIX) {
            return match payload.parse::<Difficulty>() {
                Ok(level) => DeviceLine::Difficulty(level),
                Err(_) => DeviceLine::InvalidDifficulty {
                    token: payload.trim().to_string(),
                },
            };
        }

        if DIAGNOSTIC_MARKERS.iter().any(|m| line.contains(m)) {
            return DeviceLine::Diagnostic(line.to_string());
        }

        DeviceLine::Unrecognized(line.to_string())
    }

    /// Short variant name for log messages.
    pub fn kind(&self) -> &'static str {
        match self {
            DeviceLine::Button { .. } => "button",
            DeviceLine::Difficulty(_) => "difficulty",
            DeviceLine::InvalidDifficulty { .. } => "invalid-difficulty",
            DeviceLine::Diagnostic(_) => "diagnostic",
            DeviceLine::Unrecognized(_) => "unrecognized",
        }
    }
}

// ── Outbound ──────────────────────────────────────────────────────────────────

/// A command line sent to the device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceCommand {
    /// Set the three indicator LEDs.
    Lights(IndicatorLights),
    /// A recipe was generated; the device may show its name.
    RecipeGenerated { name: String },
    /// A cocktail was generated.
    CocktailGenerated { name: String },
    /// Budget and calorie summary of the last recipe.
    Stats { budget: u32, calories: u32 },
}

impl DeviceCommand {
    /// Encodes the command as a single line, without the trailing `\n`.
    ///
    /// Names are flattened so that a stray line break inside them cannot
    /// split one command into two.
    pub fn encode(&self) -> String {
        match self {
            DeviceCommand::Lights(lights) => format!(
                "{LIGHTS_PREFIX}EASY:{},MEDIUM:{},HARD:{}",
                u8::from(lights.easy),
                u8::from(lights.medium),
                u8::from(lights.hard)
            ),
            DeviceCommand::RecipeGenerated { name } => {
                format!("{RECIPE_PREFIX}{}", single_line(name))
            }
            DeviceCommand::CocktailGenerated { name } => {
                format!("{COCKTAIL_PREFIX}{}", single_line(name))
            }
            DeviceCommand::Stats { budget, calories } => {
                format!("{STATS_PREFIX}BUDGET:{budget},CALORIES:{calories}")
            }
        }
    }

    /// Parses an encoded command line.  Returns `None` for anything that is
    /// not exactly one of the four outbound shapes.
    ///
    /// The host never receives these; simulated devices in tests do.
    pub fn parse(line: &str) -> Option<DeviceCommand> {
        if let Some(rest) = line.strip_prefix(LIGHTS_PREFIX) {
            return parse_lights(rest).map(DeviceCommand::Lights);
        }
        if let Some(name) = line.strip_prefix(RECIPE_PREFIX) {
            return Some(DeviceCommand::RecipeGenerated {
                name: name.to_string(),
            });
        }
        if let Some(name) = line.strip_prefix(COCKTAIL_PREFIX) {
            return Some(DeviceCommand::CocktailGenerated {
                name: name.to_string(),
            });
        }
        if let Some(rest) = line.strip_prefix(STATS_PREFIX) {
            let (budget, calories) = rest.split_once(',')?;
            let budget = budget.strip_prefix("BUDGET:")?.parse().ok()?;
            let calories = calories.strip_prefix("CALORIES:")?.parse().ok()?;
            return Some(DeviceCommand::Stats { budget, calories });
        }
        None
    }
}

fn parse_lights(rest: &str) -> Option<IndicatorLights> {
    let mut channels = rest.split(',');
    let easy = channel(channels.next()?, "EASY:")?;
    let medium = channel(channels.next()?, "MEDIUM:")?;
    let hard = channel(channels.next()?, "HARD:")?;
    if channels.next().is_some() {
        return None;
    }
    Some(IndicatorLights { easy, medium, hard })
}

fn channel(field: &str, label: &str) -> Option<bool> {
    match field.strip_prefix(label)? {
        "0" => Some(false),
        "1" => Some(true),
        _ => None,
    }
}

fn single_line(name: &str) -> String {
    name.split(['\r', '\n'])
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Tests ─────────────────────────────────────────────────────────────────────
