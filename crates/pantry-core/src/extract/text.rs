//! Line-level helpers shared by the recipe and cocktail extractors.
//!
//! Headings are recognised in English and Traditional Chinese, with or
//! without Markdown decoration and list numbering:
//!
//! ```text
//! Ingredients:            ## Steps           2. 所需食材：
//! **Name:** Highball      食材                Budget: about NT$150
//! ```
//!
//! A heading counts only when it is followed by a colon or stands alone on
//! its line, so prose such as "Name your price" is never taken for one.

use once_cell::sync::Lazy;
use regex::Regex;

use super::Field;

// ── Labels ────────────────────────────────────────────────────────────────────

pub(super) const RECIPE_NAME_LABELS: &[&str] = &[
    "食譜名稱", "名稱", "食譜", "Recipe name", "Dish name", "Recipe", "Name", "Title",
];
pub(super) const COCKTAIL_NAME_LABELS: &[&str] = &[
    "調酒名稱", "名稱", "調酒", "Cocktail name", "Drink name", "Cocktail", "Name", "Title",
];
pub(super) const RECIPE_INGREDIENT_LABELS: &[&str] = &[
    "材料及份量", "所需食材", "所需材料", "食材", "材料", "Ingredients",
];
pub(super) const COCKTAIL_INGREDIENT_LABELS: &[&str] =
    &["所需材料", "材料", "配料", "Ingredients", "Materials"];
pub(super) const RECIPE_STEP_LABELS: &[&str] = &[
    "烹飪步驟", "製作步驟", "製作方法", "步驟", "做法", "Steps", "Instructions", "Directions",
    "Method",
];
pub(super) const COCKTAIL_STEP_LABELS: &[&str] =
    &["製作方法", "製作步驟", "步驟", "做法", "Steps", "Instructions", "Method"];
pub(super) const BUDGET_LABELS: &[&str] = &[
    "估計預算", "所需預算", "預算", "價格", "Estimated budget", "Budget", "Cost", "Price",
];
pub(super) const CALORIE_LABELS: &[&str] = &["卡路里", "熱量", "Calories", "Energy"];
pub(super) const STYLE_LABELS: &[&str] =
    &["風格特點", "風格", "特點", "特色", "Style", "Character"];

const ALL_LABELS: &[&[&str]] = &[
    RECIPE_NAME_LABELS,
    COCKTAIL_NAME_LABELS,
    RECIPE_INGREDIENT_LABELS,
    COCKTAIL_INGREDIENT_LABELS,
    RECIPE_STEP_LABELS,
    COCKTAIL_STEP_LABELS,
    BUDGET_LABELS,
    CALORIE_LABELS,
    STYLE_LABELS,
];

// ── Shared patterns ───────────────────────────────────────────────────────────

/// Any known heading.  A line matching this ends the section above it.
static ANY_HEADING: Lazy<Regex> = Lazy::new(|| {
    let labels: Vec<&str> = ALL_LABELS.iter().flat_map(|set| set.iter().copied()).collect();
    heading_pattern(&labels)
});

/// Leading list decoration: `1.`, `2、`, `3)`, `-`, `•`, `*`, `一、`.
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(?:\d+\s*[.、)）]|[-•·*+]|[一二三四五六七八九十]+\s*[.、)）])\s*")
        .expect("valid list marker regex")
});

/// A numbered line; group 1 is the text after the number.
static NUMBERED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s*[.、)）]\s*(.*)$").expect("valid numbered line regex")
});

static NUMERIC_ONLY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9.\s]*$").expect("valid numeric line regex"));

/// Builds a heading matcher for `labels`.  Capture group `rest` holds the
/// text after the colon, if any.
pub(super) fn heading_pattern(labels: &[&str]) -> Regex {
    // Longest first: regex alternation is leftmost-first, and "食譜" must not
    // win over "食譜名稱".
    let mut sorted: Vec<&str> = labels.to_vec();
    sorted.sort_by_key(|label| std::cmp::Reverse(label.chars().count()));
    sorted.dedup();
    let alternation = sorted
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");

    let pattern = format!(
        r"(?i)^\s*(?:#{{1,6}}\s*)?(?:[*_]{{1,2}})?\s*(?:\d+\s*[.、)）]\s*)?(?:[*_]{{1,2}})?\s*(?:{alternation})\s*(?:[*_]{{1,2}})?\s*(?:[(（][^)）]*[)）])?\s*(?:[:：]\s*(?:[*_]{{1,2}})?\s*(?P<rest>.*?)\s*)?$"
    );
    Regex::new(&pattern).expect("valid heading regex")
}

/// Builds a case-insensitive "contains any of" matcher.  ASCII words only
/// match whole words, so "rice" does not fire on "price"; CJK words match
/// anywhere.
pub(super) fn keyword_pattern(words: &[&str]) -> Regex {
    let alternation = words
        .iter()
        .map(|word| {
            let escaped = regex::escape(word);
            if word.is_ascii() {
                format!(r"\b{escaped}\b")
            } else {
                escaped
            }
        })
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!("(?i){alternation}")).expect("valid keyword regex")
}

// ── Line helpers ──────────────────────────────────────────────────────────────

pub(super) fn lines(text: &str) -> Vec<&str> {
    text.lines().map(str::trim).collect()
}

pub(super) fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Removes Markdown emphasis and heading hashes around `s`.
pub(super) fn strip_emphasis(s: &str) -> &str {
    s.trim()
        .trim_matches(|c: char| c == '*' || c == '_' || c == '#' || c.is_whitespace())
}

/// Removes a leading list marker and emphasis.
///
/// `2.5 cups flour` keeps its number: a `.` directly followed by a digit is a
/// decimal point, not a marker.
pub(super) fn clean_item(line: &str) -> String {
    let body = match LIST_MARKER.find(line) {
        Some(m) if !is_decimal_point(line, m.end()) => &line[m.end()..],
        _ => line,
    };
    strip_emphasis(body).to_string()
}

fn is_decimal_point(line: &str, marker_end: usize) -> bool {
    line[..marker_end].ends_with('.')
        && line[marker_end..].starts_with(|c: char| c.is_ascii_digit())
}

pub(super) fn is_heading(line: &str) -> bool {
    ANY_HEADING.is_match(line)
}

/// Finds the first line matching `heading`; returns its index and the text
/// after the colon (empty when the heading stands alone).
pub(super) fn find_heading<'a>(lines: &[&'a str], heading: &Regex) -> Option<(usize, &'a str)> {
    lines.iter().enumerate().find_map(|(index, line)| {
        heading.captures(line).map(|caps| {
            let rest = caps.name("rest").map_or("", |m| m.as_str());
            (index, rest)
        })
    })
}

/// The block under `heading`: the text after its colon, then following lines
/// up to the next heading or a blank line.
///
/// Blank lines right after the heading are skipped.  A blank line between
/// list items does not end the block when the next line is another item.
pub(super) fn labeled_block(lines: &[&str], heading: &Regex) -> Option<Vec<String>> {
    let (start, rest) = find_heading(lines, heading)?;
    let mut block = Vec::new();
    if !rest.is_empty() {
        block.push(rest.to_string());
    }

    for (offset, line) in lines[start + 1..].iter().enumerate() {
        if line.is_empty() {
            if block.is_empty() {
                continue;
            }
            let next = lines[start + 1 + offset..]
                .iter()
                .find(|l| !l.is_empty());
            match next {
                Some(next) if LIST_MARKER.is_match(next) && !is_heading(next) => continue,
                _ => break,
            }
        }
        if is_heading(line) {
            break;
        }
        block.push(line.to_string());
    }

    Some(block)
}

/// Lines after the first line containing `enter`, up to a line containing
/// `exit`.  Blank lines are skipped rather than ending the scan.
pub(super) fn loose_block(lines: &[&str], enter: &Regex, exit: &Regex) -> Vec<String> {
    let mut in_section = false;
    let mut block = Vec::new();
    for line in lines {
        if !in_section {
            in_section = enter.is_match(line);
            continue;
        }
        if exit.is_match(line) {
            break;
        }
        if !line.is_empty() {
            block.push(line.to_string());
        }
    }
    block
}

/// Cleans list items and drops blanks, bare numbers, and items of
/// `min_chars` characters or fewer.
pub(super) fn tidy_items(block: &[String], min_chars: usize) -> Vec<String> {
    block
        .iter()
        .map(|line| clean_item(line))
        .filter(|item| {
            !item.is_empty() && !NUMERIC_ONLY.is_match(item) && char_len(item) > min_chars
        })
        .collect()
}

/// Groups a block into numbered items.  Unnumbered lines continue the item
/// above them; lines before the first number are dropped.  `None` when no
/// line is numbered.
pub(super) fn split_numbered(block: &[String]) -> Option<Vec<String>> {
    if !block.iter().any(|line| NUMBERED.is_match(line)) {
        return None;
    }
    let mut items: Vec<String> = Vec::new();
    for line in block {
        if let Some(caps) = NUMBERED.captures(line) {
            let text = caps.get(1).map_or("", |m| m.as_str());
            items.push(strip_emphasis(text).to_string());
        } else if let Some(last) = items.last_mut() {
            let continuation = clean_item(line);
            if !continuation.is_empty() {
                last.push(' ');
                last.push_str(&continuation);
            }
        }
    }
    Some(items)
}

/// Parses the first participating capture group of the first match of
/// `pattern` that holds a positive integer.
pub(super) fn first_positive(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let digits = caps.iter().skip(1).flatten().next()?;
            digits.as_str().parse::<u32>().ok()
        })
        .find(|n| *n > 0)
}

/// Builds a matcher for `<label>: <number>` with optional "about" and
/// currency decorations.  Group 1 is the number.
pub(super) fn labeled_number_pattern(labels: &[&str]) -> Regex {
    let alternation = labels
        .iter()
        .map(|label| regex::escape(label))
        .collect::<Vec<_>>()
        .join("|");
    let pattern = format!(
        r"(?i)(?:{alternation})\s*(?:[*_]{{1,2}})?\s*(?:[(（][^)）]*[)）])?\s*[:：]?\s*(?:[*_]{{1,2}})?\s*(?:約|大約|about|approximately|approx\.?|around|~)?\s*(?:NT\$|NTD|NT|TWD|台幣|US\$|\$)?\s*(\d+)"
    );
    Regex::new(&pattern).expect("valid labeled number regex")
}

// ── Field strategies ──────────────────────────────────────────────────────────

/// Patterns and thresholds for one list-valued field.
pub(super) struct ListRules<'a> {
    pub heading: &'a Regex,
    pub loose_enter: &'a Regex,
    pub loose_exit: &'a Regex,
    pub keyword: &'a Regex,
    /// Items must be longer than this many characters.
    pub min_chars: usize,
    /// Keyword-matched lines must be longer than this many characters.
    pub keyword_min_chars: usize,
    /// Split the block on `1.` / `2.` numbering before tidying.
    pub numbered: bool,
    pub placeholder: &'static str,
}

impl ListRules<'_> {
    fn items(&self, block: &[String]) -> Vec<String> {
        if self.numbered {
            if let Some(items) = split_numbered(block) {
                let items: Vec<String> = items
                    .into_iter()
                    .filter(|item| char_len(item) > self.min_chars)
                    .collect();
                if !items.is_empty() {
                    return items;
                }
            }
        }
        tidy_items(block, self.min_chars)
    }
}

/// Runs the labeled → positional → keyword → placeholder chain for a list.
pub(super) fn extract_list(lines: &[&str], rules: &ListRules<'_>) -> Field<Vec<String>> {
    if let Some(block) = labeled_block(lines, rules.heading) {
        let items = rules.items(&block);
        if !items.is_empty() {
            return Field::Labeled(items);
        }
    }

    let loose = loose_block(lines, rules.loose_enter, rules.loose_exit);
    let items = rules.items(&loose);
    if !items.is_empty() {
        return Field::Positional(items);
    }

    let matched: Vec<String> = lines
        .iter()
        .filter(|line| !line.is_empty() && !is_heading(line) && rules.keyword.is_match(line))
        .map(|line| clean_item(line))
        .filter(|item| char_len(item) > rules.keyword_min_chars)
        .collect();
    if !matched.is_empty() {
        return Field::Keyword(matched);
    }

    Field::Placeholder(vec![rules.placeholder.to_string()])
}

/// Runs the labeled → requested → keyword → placeholder chain for a number.
pub(super) fn extract_number(
    text: &str,
    labeled: &Regex,
    requested: Option<u32>,
    keyword: &Regex,
    placeholder: u32,
) -> Field<u32> {
    if let Some(n) = first_positive(labeled, text) {
        return Field::Labeled(n);
    }
    if let Some(n) = requested.filter(|n| *n > 0) {
        return Field::Requested(n);
    }
    if let Some(n) = first_positive(keyword, text) {
        return Field::Keyword(n);
    }
    Field::Placeholder(placeholder)
}

/// Longest first line still accepted as a name.
const MAX_POSITIONAL_NAME_CHARS: usize = 30;

/// Runs the labeled → first-line → placeholder chain for a name.
pub(super) fn extract_name(lines: &[&str], heading: &Regex, placeholder: &str) -> Field<String> {
    if let Some((index, rest)) = find_heading(lines, heading) {
        let candidate = if rest.is_empty() {
            lines[index + 1..]
                .iter()
                .find(|l| !l.is_empty())
                .map(|l| clean_item(l))
                .unwrap_or_default()
        } else {
            strip_emphasis(rest).to_string()
        };
        if !candidate.is_empty() && !is_heading(&candidate) {
            return Field::Labeled(candidate);
        }
    }

    if let Some(first) = lines.iter().find(|l| !l.is_empty()) {
        let candidate = strip_emphasis(first);
        let len = char_len(candidate);
        if len > 0 && len < MAX_POSITIONAL_NAME_CHARS && !is_heading(first) {
            return Field::Positional(candidate.to_string());
        }
    }

    Field::Placeholder(placeholder.to_string())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn rest_of<'a>(re: &Regex, line: &'a str) -> Option<String> {
        re.captures(line)
            .map(|c| c.name("rest").map_or("", |m| m.as_str()).to_string())
    }

    #[test]
    fn test_heading_matches_plain_markdown_and_numbered_forms() {
        let re = heading_pattern(RECIPE_INGREDIENT_LABELS);
        assert_eq!(rest_of(&re, "Ingredients:"), Some(String::new()));
        assert_eq!(rest_of(&re, "## Ingredients"), Some(String::new()));
        assert_eq!(rest_of(&re, "**Ingredients:** eggs"), Some("eggs".to_string()));
        assert_eq!(rest_of(&re, "2. 所需食材："), Some(String::new()));
        assert_eq!(
            rest_of(&re, "Ingredients (2 servings): rice"),
            Some("rice".to_string())
        );
    }

    #[test]
    fn test_heading_requires_colon_or_bare_line() {
        let re = heading_pattern(RECIPE_NAME_LABELS);
        assert_eq!(rest_of(&re, "Name your price"), None);
        assert_eq!(rest_of(&re, "Name: Tomato Egg"), Some("Tomato Egg".to_string()));
    }

    #[test]
    fn test_heading_prefers_longest_label() {
        let re = heading_pattern(RECIPE_NAME_LABELS);
        assert_eq!(rest_of(&re, "食譜名稱：番茄炒蛋"), Some("番茄炒蛋".to_string()));
    }

    #[test]
    fn test_clean_item_strips_markers() {
        assert_eq!(clean_item("1. Two eggs"), "Two eggs");
        assert_eq!(clean_item("3、番茄 2顆"), "番茄 2顆");
        assert_eq!(clean_item("- **Rice**"), "Rice");
        assert_eq!(clean_item("二、切絲"), "切絲");
        assert_eq!(clean_item("• salt"), "salt");
    }

    #[test]
    fn test_clean_item_keeps_decimal_quantities() {
        assert_eq!(clean_item("2.5 cups flour"), "2.5 cups flour");
        assert_eq!(clean_item("1. 5 eggs"), "5 eggs");
    }

    #[test]
    fn test_labeled_block_stops_at_next_heading() {
        let text = "Ingredients:\n- egg\n- rice\nSteps:\n1. cook";
        let ls = lines(text);
        let block = labeled_block(&ls, &heading_pattern(RECIPE_INGREDIENT_LABELS)).unwrap();
        assert_eq!(block, vec!["- egg", "- rice"]);
    }

    #[test]
    fn test_labeled_block_skips_blank_lines_between_items() {
        let text = "Steps:\n\n1. Boil water\n\n2. Add noodles\n\nEnjoy your meal";
        let ls = lines(text);
        let block = labeled_block(&ls, &heading_pattern(RECIPE_STEP_LABELS)).unwrap();
        assert_eq!(block, vec!["1. Boil water", "2. Add noodles"]);
    }

    #[test]
    fn test_split_numbered_joins_continuation_lines() {
        let block = vec![
            "intro".to_string(),
            "1. Heat the pan".to_string(),
            "until it smokes".to_string(),
            "2) Add the oil".to_string(),
        ];
        assert_eq!(
            split_numbered(&block).unwrap(),
            vec!["Heat the pan until it smokes", "Add the oil"]
        );
        assert_eq!(split_numbered(&["no numbers".to_string()]), None);
    }

    #[test]
    fn test_extract_name_positional_respects_length_limit() {
        let short = lines("Garlic Noodles\nmore text");
        let long = lines("This is a very long opening sentence that is not a name");
        let re = heading_pattern(RECIPE_NAME_LABELS);
        assert_eq!(
            extract_name(&short, &re, "Untitled"),
            Field::Positional("Garlic Noodles".to_string())
        );
        assert_eq!(
            extract_name(&long, &re, "Untitled"),
            Field::Placeholder("Untitled".to_string())
        );
    }

    #[test]
    fn test_extract_name_from_heading_on_its_own_line() {
        let ls = lines("## Name\n**Miso Soup**\n");
        let re = heading_pattern(RECIPE_NAME_LABELS);
        assert_eq!(
            extract_name(&ls, &re, "Untitled"),
            Field::Labeled("Miso Soup".to_string())
        );
    }

    #[test]
    fn test_keyword_pattern_matches_ascii_whole_words_only() {
        let re = keyword_pattern(&["rice", "飯"]);
        assert!(re.is_match("Fried RICE"));
        assert!(re.is_match("炒飯"));
        assert!(!re.is_match("a fair price"));
    }

    #[test]
    fn test_first_positive_skips_zero() {
        let re = Regex::new(r"(\d+)").unwrap();
        assert_eq!(first_positive(&re, "0 then 42"), Some(42));
        assert_eq!(first_positive(&re, "none"), None);
    }
}
