//! Prompt builders for the text backend.
//!
//! Both prompts end with the response layout that [`crate::extract`] reads
//! best.  The backend does not always follow it, which is why extraction has
//! fallbacks, but asking for it keeps the labeled path the common one.

use std::fmt::Write as _;

use crate::domain::difficulty::Difficulty;
use crate::domain::dish::{CocktailRequest, RecipeRequest};

const RECIPE_LAYOUT: &str = "\
Reply using exactly this layout:

Name: [dish name]

Ingredients:
1. [ingredient] [amount]
2. [ingredient] [amount]
3. [ingredient] [amount]

Steps:
1. [detailed step]
2. [detailed step]
3. [detailed step]

Budget: [amount] NT$
Calories: [number] kcal";

const COCKTAIL_LAYOUT: &str = "\
Reply using exactly this layout:

Cocktail name: [creative name]

Ingredients:
- [alcohol] [exact amount, e.g. 30 ml]
- [mixer] [exact amount, e.g. 150 ml]
- [garnish] [to taste]

Steps:
1. [simple preparation step]
2. [mixing order and technique]
3. [garnish and serving]

Style: [taste, colour and aroma]";

const STORE_SHELF: &str = "\
Use only ready-made products a convenience store sells:
- Alcohol: lager, plum wine, yuzu liqueur, peach liqueur, shochu, whisky, vodka, brandy, sake, wine
- Mixers: cola, lemon-lime soda, soda water, ginger ale, cranberry juice, orange juice, apple juice, yogurt drink, green tea, coffee
- Garnish: lemon slices, lime slices, ice, salt, sugar, honey, mint";

fn difficulty_wording(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "easy (few steps, common tools, under 20 minutes)",
        Difficulty::Medium => "medium (a home cook's weeknight dish)",
        Difficulty::Hard => "hard (several techniques, worth the effort)",
    }
}

/// Builds the recipe prompt for `request`.  Empty request fields are left
/// out rather than sent blank.
pub fn build_recipe_prompt(request: &RecipeRequest) -> String {
    let mut prompt = String::from("Create one tasty home recipe for these conditions:\n\n");

    if !request.ingredients.is_empty() {
        let _ = writeln!(prompt, "Available ingredients: {}", request.ingredients.join(", "));
    }
    if !request.requirements.is_empty() {
        let _ = writeln!(prompt, "Requirements: {}", request.requirements.join(", "));
    }
    if let Some(budget) = request.budget {
        let _ = writeln!(prompt, "Budget limit: {budget} NT$");
    }
    if let Some(calories) = request.calories {
        let _ = writeln!(prompt, "Calorie limit: {calories} kcal");
    }
    let _ = writeln!(prompt, "Difficulty: {}", difficulty_wording(request.difficulty));
    if !request.favorites.is_empty() {
        let _ = writeln!(prompt, "Favourite ingredients: {}", request.favorites.join(", "));
    }

    prompt.push('\n');
    prompt.push_str(RECIPE_LAYOUT);
    prompt
}

/// Builds the convenience-store cocktail prompt for `request`.
pub fn build_cocktail_prompt(request: &CocktailRequest) -> String {
    let mut prompt = String::from("Design one convenience-store cocktail.\n\n");
    prompt.push_str(STORE_SHELF);
    prompt.push_str("\n\n");

    let level = request.alcohol_level;
    let _ = writeln!(prompt, "Alcohol strength: {level} ({})", level.abv_hint());
    if let Some(style) = request.style {
        let _ = writeln!(prompt, "Style: {}", style.description());
    }
    prompt.push_str("Keep the total cost between 100 and 200 NT$.\n\n");
    prompt.push_str(COCKTAIL_LAYOUT);
    prompt
}
