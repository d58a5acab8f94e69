//! Recipe and cocktail records, and the requests that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::difficulty::Difficulty;

/// A finished recipe, ready to show and announce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    /// Estimated cost in local currency units.
    pub budget: u32,
    /// Estimated energy per serving in kcal.
    pub calories: u32,
    pub difficulty: Difficulty,
    /// Short labels derived from the text and the request (at most 6).
    pub tags: Vec<String>,
}

/// A finished cocktail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cocktail {
    pub name: String,
    pub ingredients: Vec<String>,
    pub steps: Vec<String>,
    pub style: String,
    pub alcohol_level: AlcoholLevel,
}

/// What the user asked for when requesting a recipe.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RecipeRequest {
    /// Ingredients the user has at hand.
    pub ingredients: Vec<String>,
    /// Free-form requirements such as "spicy" or "vegetarian".
    pub requirements: Vec<String>,
    pub budget: Option<u32>,
    pub calories: Option<u32>,
    pub difficulty: Difficulty,
    /// Ingredients the user picks often; used to nudge the prompt.
    #[serde(default)]
    pub favorites: Vec<String>,
}

/// What the user asked for when requesting a cocktail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CocktailRequest {
    pub alcohol_level: AlcoholLevel,
    pub style: Option<CocktailStyle>,
}

// ── Alcohol level ─────────────────────────────────────────────────────────────

/// Strength of a cocktail.  Cycles light → medium → strong → light.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlcoholLevel {
    Light,
    #[default]
    Medium,
    Strong,
}

impl AlcoholLevel {
    pub fn next(self) -> AlcoholLevel {
        match self {
            AlcoholLevel::Light => AlcoholLevel::Medium,
            AlcoholLevel::Medium => AlcoholLevel::Strong,
            AlcoholLevel::Strong => AlcoholLevel::Light,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            AlcoholLevel::Light => "light",
            AlcoholLevel::Medium => "medium",
            AlcoholLevel::Strong => "strong",
        }
    }

    /// Rough ABV range used in prompts.
    pub fn abv_hint(self) -> &'static str {
        match self {
            AlcoholLevel::Light => "below 5% ABV",
            AlcoholLevel::Medium => "around 8-12% ABV",
            AlcoholLevel::Strong => "above 15% ABV",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(name: &str) -> Option<AlcoholLevel> {
        match name.trim().to_ascii_lowercase().as_str() {
            "light" | "low" => Some(AlcoholLevel::Light),
            "medium" | "mid" => Some(AlcoholLevel::Medium),
            "strong" | "high" => Some(AlcoholLevel::Strong),
            _ => None,
        }
    }
}

impl fmt::Display for AlcoholLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Cocktail style ────────────────────────────────────────────────────────────

/// Requested flavour direction for a cocktail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CocktailStyle {
    /// Built only from what a convenience store sells.
    Convenience,
    Fruit,
    Classic,
    Creative,
}

impl CocktailStyle {
    /// Style line used when the generated text has none.
    pub fn description(self) -> &'static str {
        match self {
            CocktailStyle::Convenience => "Convenient and affordable",
            CocktailStyle::Fruit => "Fresh and fruity",
            CocktailStyle::Classic => "Classic cocktail",
            CocktailStyle::Creative => "Creative mixed style",
        }
    }

    pub fn from_name(name: &str) -> Option<CocktailStyle> {
        match name.trim().to_ascii_lowercase().as_str() {
            "convenience" | "store" => Some(CocktailStyle::Convenience),
            "fruit" | "fruity" => Some(CocktailStyle::Fruit),
            "classic" => Some(CocktailStyle::Classic),
            "creative" => Some(CocktailStyle::Creative),
            _ => None,
        }
    }
}
