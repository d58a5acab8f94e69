//! Best-effort field extraction from generated recipe and cocktail text.
//!
//! Generated text follows the layout requested by [`crate::prompt`] most of
//! the time, and ignores it some of the time.  Every field therefore walks
//! its own fallback chain and stops at the first strategy that yields a
//! usable value:
//!
//! 1. **Labeled** – a heading such as `Ingredients:` / `食材：` and the block
//!    under it.
//! 2. **Positional** – a looser reading of the layout, e.g. "the first short
//!    line is the name", or "the lines after any mention of ingredients".
//! 3. **Keyword** – individual lines that look like the field, e.g. lines
//!    with units of measure are ingredients, lines with cooking verbs are
//!    steps.
//! 4. **Placeholder** – a fixed, non-empty value that tells the reader the
//!    field could not be found.
//!
//! Numeric fields and the cocktail style may also take the value the user
//! asked for ([`Field::Requested`]) before settling for a placeholder.
//!
//! Fields are independent: a miss on one never affects another, and
//! extraction always returns a complete record.

pub mod cocktail;
pub mod recipe;
pub mod tags;
mod text;

use serde::Serialize;

pub use cocktail::{extract_cocktail, parse_cocktail, CocktailFields};
pub use recipe::{extract_recipe, parse_recipe, RecipeFields};
pub use tags::generate_tags;

/// An extracted value tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "value")]
pub enum Field<T> {
    /// Found under an explicit heading.
    Labeled(T),
    /// Inferred from position or a loose section scan.
    Positional(T),
    /// Assembled from lines that contain field-specific keywords.
    Keyword(T),
    /// Taken from the user's request because the text had nothing usable.
    Requested(T),
    /// Extraction failed; a fixed stand-in value.
    Placeholder(T),
}

/// Which strategy produced a [`Field`], without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldSource {
    Labeled,
    Positional,
    Keyword,
    Requested,
    Placeholder,
}

impl<T> Field<T> {
    pub fn value(&self) -> &T {
        match self {
            Field::Labeled(v)
            | Field::Positional(v)
            | Field::Keyword(v)
            | Field::Requested(v)
            | Field::Placeholder(v) => v,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Field::Labeled(v)
            | Field::Positional(v)
            | Field::Keyword(v)
            | Field::Requested(v)
            | Field::Placeholder(v) => v,
        }
    }

    pub fn source(&self) -> FieldSource {
        match self {
            Field::Labeled(_) => FieldSource::Labeled,
            Field::Positional(_) => FieldSource::Positional,
            Field::Keyword(_) => FieldSource::Keyword,
            Field::Requested(_) => FieldSource::Requested,
            Field::Placeholder(_) => FieldSource::Placeholder,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, Field::Placeholder(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_accessors_agree_with_variant() {
        let f = Field::Keyword(vec!["2 eggs".to_string()]);
        assert_eq!(f.source(), FieldSource::Keyword);
        assert_eq!(f.value().len(), 1);
        assert!(!f.is_placeholder());
        assert_eq!(f.into_value(), vec!["2 eggs".to_string()]);
    }

    #[test]
    fn test_placeholder_is_flagged() {
        assert!(Field::Placeholder(0u32).is_placeholder());
        assert_eq!(Field::Requested(150u32).source(), FieldSource::Requested);
    }
}
