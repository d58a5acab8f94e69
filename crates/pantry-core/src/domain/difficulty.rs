//! Difficulty levels, LED indicator patterns, and link lifecycle states.
//!
//! The device has three LEDs labelled EASY, MEDIUM and HARD.  Whenever the
//! difficulty settles, exactly one of them is lit.  [`IndicatorLights::only`]
//! is the single constructor used for that case, so the "one channel on"
//! rule is enforced by construction rather than checked after the fact.
//!
//! The all-on / all-off patterns exist only for light effects (cocktail
//! blink, light test) and never describe a difficulty.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::protocol::messages::ProtocolError;

// ── Difficulty ────────────────────────────────────────────────────────────────

/// One of the three difficulty levels.  Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// All levels in device order (EASY, MEDIUM, HARD).
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Upper-case token used on the serial line (`EASY`, `MEDIUM`, `HARD`).
    pub fn as_device_token(self) -> &'static str {
        match self {
            Difficulty::Easy => "EASY",
            Difficulty::Medium => "MEDIUM",
            Difficulty::Hard => "HARD",
        }
    }

    /// Lower-case in-process name (`easy`, `medium`, `hard`).
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    /// The level a single button press moves to: easy → medium → hard → easy.
    pub fn next(self) -> Difficulty {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium => Difficulty::Hard,
            Difficulty::Hard => Difficulty::Easy,
        }
    }

    /// The LED pattern for this level.
    pub fn lights(self) -> IndicatorLights {
        IndicatorLights::only(self)
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = ProtocolError;

    /// Parses one of the three canonical tokens, ignoring ASCII case and
    /// surrounding whitespace.  Anything else is rejected; there is no
    /// "closest match" coercion.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.eq_ignore_ascii_case("easy") {
            Ok(Difficulty::Easy)
        } else if token.eq_ignore_ascii_case("medium") {
            Ok(Difficulty::Medium)
        } else if token.eq_ignore_ascii_case("hard") {
            Ok(Difficulty::Hard)
        } else {
            Err(ProtocolError::InvalidDifficultyToken {
                token: token.to_string(),
            })
        }
    }
}

// ── Indicator lights ──────────────────────────────────────────────────────────

/// On/off state of the three indicator channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IndicatorLights {
    pub easy: bool,
    pub medium: bool,
    pub hard: bool,
}

impl IndicatorLights {
    /// Exactly the channel for `value` on, the other two off.
    pub fn only(value: Difficulty) -> Self {
        Self {
            easy: value == Difficulty::Easy,
            medium: value == Difficulty::Medium,
            hard: value == Difficulty::Hard,
        }
    }

    /// Every channel on.  Used by light effects only.
    pub fn all_on() -> Self {
        Self {
            easy: true,
            medium: true,
            hard: true,
        }
    }

    /// Every channel off.
    pub fn all_off() -> Self {
        Self {
            easy: false,
            medium: false,
            hard: false,
        }
    }

    /// Number of channels currently lit.
    pub fn lit_count(&self) -> usize {
        [self.easy, self.medium, self.hard]
            .iter()
            .filter(|on| **on)
            .count()
    }

    /// The difficulty this pattern represents, if exactly one channel is lit.
    pub fn difficulty(&self) -> Option<Difficulty> {
        match (self.easy, self.medium, self.hard) {
            (true, false, false) => Some(Difficulty::Easy),
            (false, true, false) => Some(Difficulty::Medium),
            (false, false, true) => Some(Difficulty::Hard),
            _ => None,
        }
    }
}

impl From<Difficulty> for IndicatorLights {
    fn from(value: Difficulty) -> Self {
        Self::only(value)
    }
}

// ── Sync origin ───────────────────────────────────────────────────────────────

/// Where a difficulty change came from.
///
/// Used solely for echo suppression: a change from the device is never sent
/// back to the device, and a change from the UI is not re-applied when the
/// device repeats it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOrigin {
    FromDevice,
    FromUi,
}

impl SyncOrigin {
    /// The other origin.
    pub fn opposite(self) -> SyncOrigin {
        match self {
            SyncOrigin::FromDevice => SyncOrigin::FromUi,
            SyncOrigin::FromUi => SyncOrigin::FromDevice,
        }
    }
}

impl fmt::Display for SyncOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOrigin::FromDevice => f.write_str("device"),
            SyncOrigin::FromUi => f.write_str("ui"),
        }
    }
}

// ── Connection state ──────────────────────────────────────────────────────────

/// Lifecycle of the device link.
///
/// ```text
/// Disconnected ──open──▶ Connecting ──ok──▶ Connected
///       ▲                    │                  │
///       └──────failure───────┘◀─────close/EOF───┘
/// ```
///
/// Reads and writes are only valid in `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        f.write_str(s)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
