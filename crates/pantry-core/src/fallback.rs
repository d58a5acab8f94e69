//! Canned dishes used when no text backend answers.
//!
//! Each dish is stored as text in the same layout the backend is asked for
//! and goes through the normal extractor, so an offline dish and a generated
//! one take exactly the same path to the UI.

use crate::domain::difficulty::Difficulty;
use crate::domain::dish::AlcoholLevel;

const EASY_RECIPE: &str = "\
Name: Vegetable Egg Fried Rice

Ingredients:
1. Cooked rice 2 cups
2. Eggs 2
3. Carrot 1 small, diced
4. Green peas 1/4 cup
5. Sweet corn 1/4 cup
6. Soy sauce 1 tbsp
7. Salt and pepper to taste

Steps:
1. Beat the eggs with a pinch of salt.
2. Heat oil in a wok and scramble the eggs until just set.
3. Add the carrot and stir-fry for one minute.
4. Add the peas and corn and keep stirring.
5. Add the rice and break up any lumps.
6. Season with soy sauce, salt and pepper and serve.

Budget: 80 NT$
Calories: 420 kcal";

const MEDIUM_RECIPE: &str = "\
Name: Chicken and Egg Rice Bowl

Ingredients:
1. Chicken thigh 200 g
2. Onion 1/2
3. Eggs 3
4. Dashi stock 150 ml
5. Soy sauce 2 tbsp
6. Mirin 1 tbsp
7. Cooked rice 2 bowls

Steps:
1. Slice the onion and cut the chicken into bite-size pieces.
2. Simmer the stock, soy sauce and mirin in a small pan.
3. Add the onion and chicken and cook for 6 minutes.
4. Pour in the beaten eggs and cover until half set.
5. Slide everything over the hot rice and serve.

Budget: 150 NT$
Calories: 580 kcal";

const HARD_RECIPE: &str = "\
Name: Braised Beef Noodle Soup

Ingredients:
1. Beef shank 500 g
2. Wheat noodles 300 g
3. Tomato 2
4. Ginger 3 slices
5. Spring onion 2 stalks
6. Chili bean paste 2 tbsp
7. Soy sauce 3 tbsp
8. Star anise 2 pieces

Steps:
1. Blanch the beef for 5 minutes, rinse and cut into chunks.
2. Fry the ginger, spring onion and bean paste until fragrant.
3. Add the beef, tomato, soy sauce, star anise and water.
4. Braise on low heat for 90 minutes until the beef is tender.
5. Boil the noodles separately and drain.
6. Serve the noodles in the broth topped with beef.

Budget: 280 NT$
Calories: 750 kcal";

const LIGHT_COCKTAIL: &str = "\
Cocktail name: Yogurt Drink Shochu Fizz

Ingredients:
- Shochu 20 ml
- Yogurt drink 1 bottle (100 ml)
- Soda water 100 ml
- Ice cubes

Steps:
1. Fill a tall glass with ice.
2. Pour in the shochu and the yogurt drink and stir.
3. Top with soda water.

Style: Sweet, creamy and gentle, easy to sip";

const MEDIUM_COCKTAIL: &str = "\
Cocktail name: Plum Wine Sparkler

Ingredients:
- Plum wine 90 ml
- Soda water 120 ml
- Lemon slice 1
- Ice cubes

Steps:
1. Fill a glass with ice.
2. Pour in the plum wine.
3. Top with soda water and stir once.
4. Garnish with the lemon slice.

Style: Fruity and bright with a gentle fizz";

const STRONG_COCKTAIL: &str = "\
Cocktail name: Whisky Cola Highball

Ingredients:
- Whisky 60 ml
- Cola 120 ml
- Lemon wedge 1
- Ice cubes

Steps:
1. Fill a highball glass with ice.
2. Pour in the whisky.
3. Top with cola and stir gently.
4. Squeeze the lemon wedge over the top.

Style: Bold and warming with caramel sweetness";

/// Offline recipe text for `difficulty`.
pub fn fallback_recipe_text(difficulty: Difficulty) -> &'static str {
    match difficulty {
        Difficulty::Easy => EASY_RECIPE,
        Difficulty::Medium => MEDIUM_RECIPE,
        Difficulty::Hard => HARD_RECIPE,
    }
}

/// Offline cocktail text for `level`.
pub fn fallback_cocktail_text(level: AlcoholLevel) -> &'static str {
    match level {
        AlcoholLevel::Light => LIGHT_COCKTAIL,
        AlcoholLevel::Medium => MEDIUM_COCKTAIL,
        AlcoholLevel::Strong => STRONG_COCKTAIL,
    }
}
