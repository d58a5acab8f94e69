//! JSON messages for the browser-facing WebSocket UI.
//!
//! # Message flow
//!
//! ```text
//! Host    → Browser: UiEvent    (state changes, diagnostics, dishes)
//! Browser → Host:    UiCommand  (the same actions the console offers)
//! ```
//!
//! Every message is a JSON object with a `"type"` field naming the variant;
//! the other fields sit next to it:
//!
//! ```json
//! {"type":"DifficultyChanged","difficulty":"hard","origin":"from_device"}
//! {"type":"SetDifficulty","difficulty":"easy"}
//! ```
//!
//! The two directions are separate enums so that an event can never be sent
//! where a command is expected.

use serde::{Deserialize, Serialize};

use pantry_core::{
    AlcoholLevel, Cocktail, CocktailStyle, ConnectionState, Difficulty, Recipe, SyncOrigin,
};

// ── Host → Browser ────────────────────────────────────────────────────────────

/// Everything the host tells a browser UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiEvent {
    /// Which of the three difficulty indicators is lit.
    DifficultyIndicator { difficulty: Difficulty },

    /// A difficulty transition finished.  Sent for every transition,
    /// including repeats of the current value.
    DifficultyChanged {
        difficulty: Difficulty,
        origin: SyncOrigin,
    },

    /// Firmware log text from the device.
    Diagnostic { line: String },

    /// The device link changed state.
    ConnectionState {
        state: ConnectionState,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        port: Option<String>,
    },

    /// A recipe is ready.  `offline` is true when it came from the built-in
    /// fallback instead of the text backend.
    RecipeReady { recipe: Recipe, offline: bool },

    /// A cocktail is ready.
    CocktailReady { cocktail: Cocktail, offline: bool },

    /// A free-form status line ("Alcohol level: strong", errors, help).
    Status { message: String },
}

// ── Browser → Host ────────────────────────────────────────────────────────────

/// Every action a UI can ask for.  The console parses its input lines into
/// the same type, so both surfaces drive one command pump.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum UiCommand {
    /// Select a difficulty on screen.
    SetDifficulty { difficulty: Difficulty },

    /// Move to the next difficulty (Easy → Medium → Hard → Easy).
    CycleDifficulty,

    /// Generate a recipe at the current difficulty.
    GenerateRecipe {
        #[serde(default)]
        ingredients: Vec<String>,
        #[serde(default)]
        requirements: Vec<String>,
        #[serde(default)]
        budget: Option<u32>,
        #[serde(default)]
        calories: Option<u32>,
    },

    /// Generate a cocktail.  Without an explicit level the current
    /// alcohol-level preference is used.
    GenerateCocktail {
        #[serde(default)]
        alcohol_level: Option<AlcoholLevel>,
        #[serde(default)]
        style: Option<CocktailStyle>,
    },

    /// Light → medium → strong → light.
    CycleAlcoholLevel,

    /// Open the serial port.  Without a port the configured one is used.
    Connect {
        #[serde(default)]
        port: Option<String>,
    },

    Disconnect,

    /// Run the LED test sequence on the device.
    TestLights,

    /// Report difficulty, connection and preferences.
    Status,

    /// Stop the whole program.
    Quit,
}

/// Short variant name for log messages.
pub fn ui_command_type_name(command: &UiCommand) -> &'static str {
    match command {
        UiCommand::SetDifficulty { .. } => "SetDifficulty",
        UiCommand::CycleDifficulty => "CycleDifficulty",
        UiCommand::GenerateRecipe { .. } => "GenerateRecipe",
        UiCommand::GenerateCocktail { .. } => "GenerateCocktail",
        UiCommand::CycleAlcoholLevel => "CycleAlcoholLevel",
        UiCommand::Connect { .. } => "Connect",
        UiCommand::Disconnect => "Disconnect",
        UiCommand::TestLights => "TestLights",
        UiCommand::Status => "Status",
        UiCommand::Quit => "Quit",
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
