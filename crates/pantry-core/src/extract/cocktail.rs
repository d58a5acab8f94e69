//! Cocktail extraction.
//!
//! Same fallback chains as recipes, tuned for drinks: ingredient keywords are
//! bar measures and spirits, step keywords are mixing verbs, and steps may be
//! as short as "Shake well".

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::dish::{Cocktail, CocktailRequest, CocktailStyle};

use super::text::{
    clean_item, extract_list, extract_name, heading_pattern, labeled_block, lines, ListRules,
    COCKTAIL_INGREDIENT_LABELS, COCKTAIL_NAME_LABELS, COCKTAIL_STEP_LABELS, STYLE_LABELS,
};
use super::Field;

pub const NAME_PLACEHOLDER: &str = "Untitled cocktail";
pub const INGREDIENTS_PLACEHOLDER: &str = "See the description for what to buy";
pub const STEPS_PLACEHOLDER: &str = "Pour everything over ice and stir";

static NAME_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(COCKTAIL_NAME_LABELS));
static INGREDIENT_HEADING: Lazy<Regex> =
    Lazy::new(|| heading_pattern(COCKTAIL_INGREDIENT_LABELS));
static STEP_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(COCKTAIL_STEP_LABELS));
static STYLE_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(STYLE_LABELS));

static INGREDIENT_ENTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)所需材料|材料|配料|\b(?:ingredients|materials)\b")
        .expect("valid ingredient enter regex")
});
static INGREDIENT_EXIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)製作方法|製作步驟|做法|步驟|風格|特點|^\W*(?:steps|instructions|method|style)\b")
        .expect("valid ingredient exit regex")
});
static STEP_ENTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)製作方法|製作步驟|做法|步驟|\b(?:steps|instructions|method)\b")
        .expect("valid step enter regex")
});
static STEP_EXIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)風格|特點|特色|建議|^\W*(?:style|character|tips?|notes?)\b")
        .expect("valid step exit regex")
});

static DRINK_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d\s*(?:ml|cl|oz)\b|\b(?:ounces?|dash(?:es)?|drops?|splash|teaspoons?|tablespoons?|slices?|wedges?|cubes?|cups?|juice|syrup|soda|tonic|vodka|gin|rum|whiske?y|tequila|beer|wine|liqueur|lemon|lime)\b|毫升|茶匙|湯匙|滴|片|顆|杯|酒|汁|糖漿|檸檬|萊姆",
    )
    .expect("valid drink keyword regex")
});

static MIXING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:pour|add|shake|stir|mix|garnish|strain|top|fill|muddle|build|serve)\b|倒入|加入|搖晃|攪拌|混合|裝飾|過濾|搖盪|注入|調配",
    )
    .expect("valid mixing verb regex")
});

/// Every cocktail field with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CocktailFields {
    pub name: Field<String>,
    pub ingredients: Field<Vec<String>>,
    pub steps: Field<Vec<String>>,
    pub style: Field<String>,
}

/// Extracts every cocktail field from `text`.  Never fails.
pub fn extract_cocktail(text: &str, request: &CocktailRequest) -> CocktailFields {
    let lines = lines(text);

    let ingredient_rules = ListRules {
        heading: &INGREDIENT_HEADING,
        loose_enter: &INGREDIENT_ENTER,
        loose_exit: &INGREDIENT_EXIT,
        keyword: &DRINK_KEYWORD,
        min_chars: 1,
        keyword_min_chars: 2,
        numbered: false,
        placeholder: INGREDIENTS_PLACEHOLDER,
    };
    let step_rules = ListRules {
        heading: &STEP_HEADING,
        loose_enter: &STEP_ENTER,
        loose_exit: &STEP_EXIT,
        keyword: &MIXING_VERB,
        min_chars: 3,
        keyword_min_chars: 5,
        numbered: true,
        placeholder: STEPS_PLACEHOLDER,
    };

    CocktailFields {
        name: extract_name(&lines, &NAME_HEADING, NAME_PLACEHOLDER),
        ingredients: extract_list(&lines, &ingredient_rules),
        steps: extract_list(&lines, &step_rules),
        style: extract_style(&lines, request),
    }
}

fn extract_style(lines: &[&str], request: &CocktailRequest) -> Field<String> {
    if let Some(block) = labeled_block(lines, &STYLE_HEADING) {
        let joined = block
            .iter()
            .map(|line| clean_item(line))
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !joined.is_empty() {
            return Field::Labeled(joined);
        }
    }
    match request.style {
        Some(style) => Field::Requested(style.description().to_string()),
        None => Field::Placeholder(CocktailStyle::Creative.description().to_string()),
    }
}

/// Extracts a complete [`Cocktail`] from `text`.
pub fn parse_cocktail(text: &str, request: &CocktailRequest) -> Cocktail {
    let fields = extract_cocktail(text, request);
    Cocktail {
        name: fields.name.into_value(),
        ingredients: fields.ingredients.into_value(),
        steps: fields.steps.into_value(),
        style: fields.style.into_value(),
        alcohol_level: request.alcohol_level,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
