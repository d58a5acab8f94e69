//! Bounded history of recipe requests and what the user tends to ask for.

use std::collections::{HashMap, VecDeque};

use serde::Serialize;

use pantry_core::{Difficulty, RecipeRequest};

/// How many requests are remembered.
pub const HISTORY_CAPACITY: usize = 10;

/// How many favourites of each kind are reported.
pub const TOP_N: usize = 5;

/// The user's habits, derived from recent requests.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct PreferenceSummary {
    pub favorite_ingredients: Vec<String>,
    pub favorite_requirements: Vec<String>,
    pub preferred_difficulty: Option<Difficulty>,
}

/// The most recent recipe requests, oldest first.
#[derive(Debug, Default)]
pub struct PreferenceHistory {
    entries: VecDeque<RecipeRequest>,
}

impl PreferenceHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remembers `request`, evicting the oldest entry when full.
    pub fn record(&mut self, request: &RecipeRequest) {
        if self.entries.len() == HISTORY_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(request.clone());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn summary(&self) -> PreferenceSummary {
        PreferenceSummary {
            favorite_ingredients: top_by_frequency(
                self.entries.iter().flat_map(|r| r.ingredients.iter()),
            ),
            favorite_requirements: top_by_frequency(
                self.entries.iter().flat_map(|r| r.requirements.iter()),
            ),
            preferred_difficulty: most_used_difficulty(self.entries.iter().map(|r| r.difficulty)),
        }
    }
}

/// Top [`TOP_N`] distinct values; ties go to the value seen first.
/// Values are compared after trimming and case folding; the first spelling
/// seen is the one reported.
fn top_by_frequency<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    // key → (count, first index, display spelling)
    let mut counts: HashMap<String, (usize, usize, String)> = HashMap::new();
    for (index, value) in values.enumerate() {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            continue;
        }
        counts
            .entry(trimmed.to_lowercase())
            .or_insert_with(|| (0, index, trimmed.to_string()))
            .0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_values().collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
    ranked.into_iter().take(TOP_N).map(|(_, _, v)| v).collect()
}

fn most_used_difficulty(values: impl Iterator<Item = Difficulty>) -> Option<Difficulty> {
    let mut counts: Vec<(Difficulty, usize, usize)> = Vec::new();
    for (index, value) in values.enumerate() {
        match counts.iter_mut().find(|(d, _, _)| *d == value) {
            Some(entry) => entry.1 += 1,
            None => counts.push((value, 1, index)),
        }
    }
    counts
        .into_iter()
        .min_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)))
        .map(|(d, _, _)| d)
}
