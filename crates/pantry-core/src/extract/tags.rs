//! Recipe tag generation.
//!
//! Tags come from four places, in this order:
//!
//! 1. the requirements the user typed ("vegetarian", "no peanuts");
//! 2. flavour, cuisine and dish-type words found in the generated text;
//! 3. ingredient families of the ingredients the user asked for;
//! 4. the difficulty level.
//!
//! The list is deduplicated in first-seen order and cut to [`MAX_TAGS`].

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::difficulty::Difficulty;
use crate::domain::dish::RecipeRequest;

use super::text::keyword_pattern;

/// Longest tag list a recipe carries.
pub const MAX_TAGS: usize = 6;

type TagRule = (&'static str, &'static [&'static str]);

const FLAVOUR_RULES: &[TagRule] = &[
    ("Spicy", &["spicy", "chili", "chilli", "辣", "辛辣", "麻辣", "香辣"]),
    ("Sweet", &["sweet", "dessert", "甜", "甜點"]),
    ("Sour", &["sour", "tangy", "酸"]),
    ("Savory", &["savory", "savoury", "salty", "鹹"]),
    ("Light", &["light", "refreshing", "清淡", "清爽", "輕食"]),
    ("Umami", &["umami", "鮮美", "鮮甜", "鮮香"]),
];

const CUISINE_RULES: &[TagRule] = &[
    ("Chinese", &["chinese", "中式", "中餐", "中國"]),
    ("Western", &["western", "american", "european", "西式", "西餐", "歐式", "美式"]),
    ("Japanese", &["japanese", "日式", "日本"]),
    ("Korean", &["korean", "韓式", "韓國"]),
    ("Thai", &["thai", "泰式", "泰國"]),
    ("Italian", &["italian", "義式", "義大利"]),
    ("French", &["french", "法式", "法國"]),
    ("Mexican", &["mexican", "墨西哥"]),
];

const DISH_TYPE_RULES: &[TagRule] = &[
    ("Stew", &["stew", "braise", "braised", "燉"]),
    ("Stir-fry", &["stir-fry", "stir-fried", "stir fry", "炒"]),
    ("Roast", &["roast", "roasted", "bake", "baked", "grill", "grilled", "烤"]),
    ("Pan-fried", &["pan-fry", "pan-fried", "deep-fry", "deep-fried", "煎", "炸"]),
    ("Soup", &["soup", "broth", "湯品", "濃湯", "清湯", "煲湯"]),
    ("Salad", &["salad", "沙拉", "生菜", "涼拌"]),
    ("Noodles", &["noodle", "noodles", "pasta", "ramen", "spaghetti", "udon", "麵"]),
    ("Rice", &["rice", "risotto", "飯"]),
    ("Vegetarian", &["vegetarian", "vegan", "素食", "蔬食"]),
    ("Seafood", &["seafood", "fish", "shrimp", "prawn", "crab", "海鮮", "魚", "蝦", "蟹"]),
    ("Meat", &["meat", "beef", "pork", "chicken", "lamb", "肉"]),
    ("Egg", &["egg", "eggs", "omelette", "蛋"]),
];

const FAMILY_RULES: &[TagRule] = &[
    ("Meat", &["meat", "beef", "pork", "chicken", "lamb", "肉", "牛", "豬", "雞", "羊"]),
    ("Seafood", &["seafood", "fish", "shrimp", "prawn", "crab", "clam", "salmon", "魚", "蝦", "蟹", "貝", "海鮮"]),
    ("Vegetables", &["vegetable", "vegetables", "spinach", "cabbage", "broccoli", "carrot", "celery", "greens", "蔬菜", "菠菜", "青菜", "芹菜", "花椰菜", "胡蘿蔔"]),
];

static TEXT_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FLAVOUR_RULES
        .iter()
        .chain(CUISINE_RULES)
        .chain(DISH_TYPE_RULES)
        .map(|(tag, words)| (*tag, keyword_pattern(words)))
        .collect()
});

static INGREDIENT_RULES: Lazy<Vec<(&'static str, Regex)>> = Lazy::new(|| {
    FAMILY_RULES
        .iter()
        .map(|(tag, words)| (*tag, keyword_pattern(words)))
        .collect()
});

fn difficulty_tag(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => "Quick & easy",
        Difficulty::Medium => "Home cooking",
        Difficulty::Hard => "Advanced",
    }
}

/// Derives up to [`MAX_TAGS`] tags for a recipe from its generated `text`
/// and the `request` that produced it.
pub fn generate_tags(text: &str, request: &RecipeRequest) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    let mut push = |tag: &str| {
        let tag = tag.trim();
        if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    };

    for requirement in &request.requirements {
        push(requirement);
    }

    for (tag, pattern) in TEXT_RULES.iter() {
        if pattern.is_match(text) {
            push(tag);
        }
    }

    let ingredients = request.ingredients.join(" ");
    if !ingredients.trim().is_empty() {
        for (tag, pattern) in INGREDIENT_RULES.iter() {
            if pattern.is_match(&ingredients) {
                push(tag);
            }
        }
    }

    push(difficulty_tag(request.difficulty));

    tags.truncate(MAX_TAGS);
    tags
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn request(difficulty: Difficulty) -> RecipeRequest {
        RecipeRequest {
            difficulty,
            ..RecipeRequest::default()
        }
    }

    #[test]
    fn test_requirements_come_first_then_text_then_difficulty() {
        // Arrange
        let req = RecipeRequest {
            requirements: vec!["No peanuts".to_string()],
            ..request(Difficulty::Hard)
        };

        // Act
        let tags = generate_tags("A spicy Korean noodle soup.", &req);

        // Assert
        assert_eq!(
            tags,
            vec!["No peanuts", "Spicy", "Korean", "Soup", "Noodles", "Advanced"]
        );
    }

    #[test]
    fn test_chinese_text_produces_english_tags() {
        let tags = generate_tags("番茄炒蛋，酸甜下飯", &request(Difficulty::Easy));
        assert!(tags.contains(&"Stir-fry".to_string()));
        assert!(tags.contains(&"Egg".to_string()));
        assert!(tags.len() <= MAX_TAGS);
    }

    #[test]
    fn test_ingredient_families_come_from_request_ingredients() {
        let req = RecipeRequest {
            ingredients: vec!["豬肉".to_string(), "spinach".to_string()],
            ..request(Difficulty::Medium)
        };

        let tags = generate_tags("Plain text with no hints.", &req);

        assert_eq!(tags, vec!["Meat", "Vegetables", "Home cooking"]);
    }

    #[test]
    fn test_tags_are_deduplicated() {
        let req = RecipeRequest {
            requirements: vec!["Spicy".to_string(), "Spicy".to_string()],
            ingredients: vec!["beef".to_string()],
            ..request(Difficulty::Easy)
        };

        let tags = generate_tags("Spicy beef.", &req);

        assert_eq!(tags, vec!["Spicy", "Meat", "Quick & easy"]);
    }

    #[test]
    fn test_tags_are_capped() {
        let text = "Spicy sweet sour Chinese Japanese stew soup with rice";
        let tags = generate_tags(text, &request(Difficulty::Easy));
        assert_eq!(tags.len(), MAX_TAGS);
        assert_eq!(tags[0], "Spicy");
    }

    #[test]
    fn test_words_inside_other_words_do_not_tag() {
        // "price" contains "rice", "湯匙" is a spoon, not soup
        let tags = generate_tags("Mind the price. Add 1 湯匙 of oil.", &request(Difficulty::Easy));
        assert_eq!(tags, vec!["Quick & easy"]);
    }
}
