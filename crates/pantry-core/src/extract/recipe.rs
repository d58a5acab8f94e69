//! Recipe extraction.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::dish::{Recipe, RecipeRequest};

use super::tags::generate_tags;
use super::text::{
    extract_list, extract_name, extract_number, heading_pattern, labeled_number_pattern, lines,
    ListRules, BUDGET_LABELS, CALORIE_LABELS, RECIPE_INGREDIENT_LABELS, RECIPE_NAME_LABELS,
    RECIPE_STEP_LABELS,
};
use super::Field;

pub const NAME_PLACEHOLDER: &str = "Untitled recipe";
pub const INGREDIENTS_PLACEHOLDER: &str = "See the recipe description for ingredients";
pub const STEPS_PLACEHOLDER: &str = "Prepare the ingredients and cook to taste";
pub const DEFAULT_BUDGET: u32 = 150;
pub const DEFAULT_CALORIES: u32 = 500;

static NAME_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(RECIPE_NAME_LABELS));
static INGREDIENT_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(RECIPE_INGREDIENT_LABELS));
static STEP_HEADING: Lazy<Regex> = Lazy::new(|| heading_pattern(RECIPE_STEP_LABELS));

static INGREDIENT_ENTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)所需食材|食材|材料|\bingredients\b").expect("valid ingredient enter regex")
});
static INGREDIENT_EXIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)步驟|做法|製作方法|預算|熱量|^\W*(?:steps|instructions|directions|method|budget|calories)\b")
        .expect("valid ingredient exit regex")
});
static STEP_ENTER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)烹飪步驟|製作步驟|步驟|做法|製作方法|\b(?:steps|instructions|directions|method)\b")
        .expect("valid step enter regex")
});
static STEP_EXIT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)預算|熱量|營養|建議|^\W*(?:budget|calories|nutrition|tips?|notes?)\b")
        .expect("valid step exit regex")
});

/// Quantities and units of measure.  Latin units need a digit or a word
/// boundary so that a bare "g" inside a word does not count.
static UNIT_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\d\s*(?:g|kg|ml|l|oz|lb|tbsp|tsp)\b|\b(?:grams?|kilograms?|cups?|tablespoons?|teaspoons?|pieces?|cloves?|slices?|pinch|ounces?|pounds?)\b|公克|公斤|克|湯匙|茶匙|顆|片|條|根|個|杯|毫升",
    )
    .expect("valid unit regex")
});

static COOKING_VERB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:add|stir|boil|fry|chop|cut|wash|pour|heat|simmer|season|bake|mix|cook|saute|slice|whisk|serve|drain|preheat|marinate)\b|加入|放入|煮|炒|切|洗|倒入|攪拌|加熱|煸炒|調味",
    )
    .expect("valid cooking verb regex")
});

static BUDGET_LABELED: Lazy<Regex> = Lazy::new(|| labeled_number_pattern(BUDGET_LABELS));
static BUDGET_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:NT\$|US\$|\$)\s*(\d+)|(\d+)\s*(?:元|塊|NTD|TWD|dollars?)")
        .expect("valid budget keyword regex")
});
static CALORIES_LABELED: Lazy<Regex> = Lazy::new(|| labeled_number_pattern(CALORIE_LABELS));
static CALORIES_KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:kcal|大卡|千卡|卡路里|calories)").expect("valid calorie keyword regex")
});

/// Every recipe field with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeFields {
    pub name: Field<String>,
    pub ingredients: Field<Vec<String>>,
    pub steps: Field<Vec<String>>,
    pub budget: Field<u32>,
    pub calories: Field<u32>,
}

impl RecipeFields {
    /// Names of the fields that fell back to a placeholder.
    pub fn placeholders(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_placeholder() {
            missing.push("name");
        }
        if self.ingredients.is_placeholder() {
            missing.push("ingredients");
        }
        if self.steps.is_placeholder() {
            missing.push("steps");
        }
        if self.budget.is_placeholder() {
            missing.push("budget");
        }
        if self.calories.is_placeholder() {
            missing.push("calories");
        }
        missing
    }
}

/// Extracts every recipe field from `text`.  Never fails.
pub fn extract_recipe(text: &str, request: &RecipeRequest) -> RecipeFields {
    let lines = lines(text);

    let ingredient_rules = ListRules {
        heading: &INGREDIENT_HEADING,
        loose_enter: &INGREDIENT_ENTER,
        loose_exit: &INGREDIENT_EXIT,
        keyword: &UNIT_KEYWORD,
        min_chars: 1,
        keyword_min_chars: 2,
        numbered: false,
        placeholder: INGREDIENTS_PLACEHOLDER,
    };
    let step_rules = ListRules {
        heading: &STEP_HEADING,
        loose_enter: &STEP_ENTER,
        loose_exit: &STEP_EXIT,
        keyword: &COOKING_VERB,
        min_chars: 5,
        keyword_min_chars: 8,
        numbered: true,
        placeholder: STEPS_PLACEHOLDER,
    };

    RecipeFields {
        name: extract_name(&lines, &NAME_HEADING, NAME_PLACEHOLDER),
        ingredients: extract_list(&lines, &ingredient_rules),
        steps: extract_list(&lines, &step_rules),
        budget: extract_number(
            text,
            &BUDGET_LABELED,
            request.budget,
            &BUDGET_KEYWORD,
            DEFAULT_BUDGET,
        ),
        calories: extract_number(
            text,
            &CALORIES_LABELED,
            request.calories,
            &CALORIES_KEYWORD,
            DEFAULT_CALORIES,
        ),
    }
}

/// Extracts a complete [`Recipe`] from `text`, tagged from the text and the
/// request.
pub fn parse_recipe(text: &str, request: &RecipeRequest) -> Recipe {
    let fields = extract_recipe(text, request);
    Recipe {
        name: fields.name.into_value(),
        ingredients: fields.ingredients.into_value(),
        steps: fields.steps.into_value(),
        budget: fields.budget.into_value(),
        calories: fields.calories.into_value(),
        difficulty: request.difficulty,
        tags: generate_tags(text, request),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::difficulty::Difficulty;

    const ENGLISH: &str = "\
Name: Garlic Butter Noodles

Ingredients:
- 200 g noodles
- 3 cloves garlic
- 2 tbsp butter

Steps:
1. Boil the noodles for 8 minutes.
2. Melt the butter and fry the garlic
   until golden.
3. Toss everything together and serve.

Budget: about NT$120
Calories: 520 kcal
";

    const CHINESE: &str = "\
食譜名稱：番茄炒蛋
所需食材：
1. 番茄 2顆
2. 雞蛋 3顆
3. 蔥 1根
烹飪步驟：
1. 番茄切塊，雞蛋打散備用。
2. 熱鍋下油，先炒蛋再加入番茄。
3. 加鹽調味後即可起鍋。
預算：約 80 元
熱量：350 大卡
";

    fn request() -> RecipeRequest {
        RecipeRequest {
            difficulty: Difficulty::Easy,
            ..RecipeRequest::default()
        }
    }

    #[test]
    fn test_extract_well_formed_english_recipe_uses_labels() {
        // Act
        let fields = extract_recipe(ENGLISH, &request());

        // Assert
        assert_eq!(fields.name, Field::Labeled("Garlic Butter Noodles".to_string()));
        assert_eq!(
            fields.ingredients,
            Field::Labeled(vec![
                "200 g noodles".to_string(),
                "3 cloves garlic".to_string(),
                "2 tbsp butter".to_string(),
            ])
        );
        assert_eq!(
            fields.steps,
            Field::Labeled(vec![
                "Boil the noodles for 8 minutes.".to_string(),
                "Melt the butter and fry the garlic until golden.".to_string(),
                "Toss everything together and serve.".to_string(),
            ])
        );
        assert_eq!(fields.budget, Field::Labeled(120));
        assert_eq!(fields.calories, Field::Labeled(520));
        assert!(fields.placeholders().is_empty());
    }

    #[test]
    fn test_extract_chinese_recipe_uses_labels() {
        let fields = extract_recipe(CHINESE, &request());

        assert_eq!(fields.name, Field::Labeled("番茄炒蛋".to_string()));
        assert_eq!(
            fields.ingredients.value(),
            &vec!["番茄 2顆".to_string(), "雞蛋 3顆".to_string(), "蔥 1根".to_string()]
        );
        assert_eq!(fields.steps.source(), crate::extract::FieldSource::Labeled);
        assert_eq!(fields.steps.value().len(), 3);
        assert_eq!(fields.budget, Field::Labeled(80));
        assert_eq!(fields.calories, Field::Labeled(350));
    }

    #[test]
    fn test_missing_ingredient_section_yields_non_empty_placeholder() {
        // Arrange: no heading, no "ingredients" mention, no units
        let text = "Quick Toast\nToast the bread and enjoy it warm.";

        // Act
        let fields = extract_recipe(text, &request());

        // Assert
        assert!(fields.ingredients.is_placeholder());
        assert_eq!(fields.ingredients.value(), &vec![INGREDIENTS_PLACEHOLDER.to_string()]);
        assert!(!fields.ingredients.value().is_empty());
        // Other fields are still extracted independently
        assert_eq!(fields.name, Field::Positional("Quick Toast".to_string()));
    }

    #[test]
    fn test_unit_lines_are_ingredients_when_no_section_exists() {
        let text = "Omelette\nYou need 3 eggs and 20 g butter.\nA pinch of salt helps too.";

        let fields = extract_recipe(text, &request());

        assert_eq!(
            fields.ingredients,
            Field::Keyword(vec![
                "You need 3 eggs and 20 g butter.".to_string(),
                "A pinch of salt helps too.".to_string(),
            ])
        );
    }

    #[test]
    fn test_loose_section_after_prose_mention() {
        // Arrange: "ingredients" appears in prose, not as a heading
        let text = "\
Here is a dish you will love. You'll need these ingredients for two:
- rice
- kimchi
- egg
Steps are simple.";

        // Act
        let fields = extract_recipe(text, &request());

        // Assert
        assert_eq!(
            fields.ingredients,
            Field::Positional(vec![
                "rice".to_string(),
                "kimchi".to_string(),
                "egg".to_string()
            ])
        );
    }

    #[test]
    fn test_cooking_verb_lines_are_steps_when_no_section_exists() {
        let text = "Soup\nHeat the stock in a pot.\nAdd tofu and simmer gently.\nok";

        let fields = extract_recipe(text, &request());

        assert_eq!(
            fields.steps,
            Field::Keyword(vec![
                "Heat the stock in a pot.".to_string(),
                "Add tofu and simmer gently.".to_string(),
            ])
        );
    }

    #[test]
    fn test_numbers_fall_back_to_request_then_default() {
        let text = "Plain rice\nRinse and cook.";
        let with_request = RecipeRequest {
            budget: Some(90),
            ..request()
        };

        let fields = extract_recipe(text, &with_request);

        assert_eq!(fields.budget, Field::Requested(90));
        assert_eq!(fields.calories, Field::Placeholder(DEFAULT_CALORIES));
    }

    #[test]
    fn test_zero_budget_is_not_accepted() {
        let fields = extract_recipe("Budget: 0\nCalories: 0", &request());
        assert_eq!(fields.budget, Field::Placeholder(DEFAULT_BUDGET));
        assert_eq!(fields.calories, Field::Placeholder(DEFAULT_CALORIES));
    }

    #[test]
    fn test_parse_recipe_builds_complete_record() {
        let recipe = parse_recipe(ENGLISH, &request());
        assert_eq!(recipe.name, "Garlic Butter Noodles");
        assert_eq!(recipe.difficulty, Difficulty::Easy);
        assert!(recipe.tags.len() <= 6);
        assert!(recipe.tags.contains(&"Noodles".to_string()));
    }

    #[test]
    fn test_empty_text_still_returns_complete_record() {
        let recipe = parse_recipe("", &request());
        assert_eq!(recipe.name, NAME_PLACEHOLDER);
        assert!(!recipe.ingredients.is_empty());
        assert!(!recipe.steps.is_empty());
        assert_eq!(recipe.budget, DEFAULT_BUDGET);
        assert_eq!(recipe.calories, DEFAULT_CALORIES);
    }
}
