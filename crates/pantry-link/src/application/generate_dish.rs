//! DishService: prompt → text backend → extractor, with an offline fallback.
//!
//! ```text
//! RecipeRequest ──build_recipe_prompt──▶ TextGenerator::generate (bounded)
//!                                              │ ok            │ err / timeout / empty
//!                                              ▼               ▼
//!                                       generated text   fallback_recipe_text(difficulty)
//!                                              └──────┬────────┘
//!                                                     ▼
//!                                               parse_recipe → Recipe
//! ```
//!
//! Generation never fails from the caller's point of view: a failure only
//! changes where the text came from, and [`Generated`] says which.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use pantry_core::extract::{parse_cocktail, parse_recipe};
use pantry_core::fallback::{fallback_cocktail_text, fallback_recipe_text};
use pantry_core::prompt::{build_cocktail_prompt, build_recipe_prompt};
use pantry_core::{AlcoholLevel, Cocktail, CocktailRequest, Recipe, RecipeRequest};

use super::preferences::{PreferenceHistory, PreferenceSummary};

/// Why the text backend produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerateError {
    #[error("network error: {0}")]
    Network(String),

    #[error("backend rejected the credentials: {0}")]
    Auth(String),

    #[error("backend quota exhausted: {0}")]
    Quota(String),

    #[error("no answer within {0:?}")]
    Timeout(Duration),

    /// No backend is configured, or it could not be started.
    #[error("text backend unavailable: {0}")]
    Unavailable(String),

    #[error("backend error: {0}")]
    Backend(String),
}

/// Anything that turns a prompt into text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GenerateError>;
}

/// A dish plus where its text came from.
#[derive(Debug, Clone, PartialEq)]
pub struct Generated<T> {
    pub dish: T,
    /// True when the offline fallback text was used.
    pub offline: bool,
    /// The backend failure that caused the fallback, if any.
    pub failure: Option<GenerateError>,
}

pub struct DishService {
    generator: Option<Arc<dyn TextGenerator>>,
    timeout: Duration,
    alcohol_level: Mutex<AlcoholLevel>,
    history: Mutex<PreferenceHistory>,
}

impl DishService {
    /// `generator` is `None` when no backend is configured; every dish is
    /// then served offline.
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, timeout: Duration) -> Self {
        Self {
            generator,
            timeout,
            alcohol_level: Mutex::new(AlcoholLevel::default()),
            history: Mutex::new(PreferenceHistory::new()),
        }
    }

    pub fn has_backend(&self) -> bool {
        self.generator.is_some()
    }

    /// Generates a recipe.  When the request names no favourites, the
    /// user's usual ingredients from the history are added to the prompt.
    /// The request is remembered afterwards.
    pub async fn generate_recipe(&self, mut request: RecipeRequest) -> Generated<Recipe> {
        if request.favorites.is_empty() {
            request.favorites = self.preferences().favorite_ingredients;
        }

        let prompt = build_recipe_prompt(&request);
        let (text, failure) = match self.ask(&prompt).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("recipe generation failed, serving the offline dish: {e}");
                (fallback_recipe_text(request.difficulty).to_string(), Some(e))
            }
        };

        let recipe = parse_recipe(&text, &request);
        info!("recipe ready: {} ({})", recipe.name, recipe.difficulty);
        self.lock_history().record(&request);

        Generated {
            dish: recipe,
            offline: failure.is_some(),
            failure,
        }
    }

    pub async fn generate_cocktail(&self, request: CocktailRequest) -> Generated<Cocktail> {
        let prompt = build_cocktail_prompt(&request);
        let (text, failure) = match self.ask(&prompt).await {
            Ok(text) => (text, None),
            Err(e) => {
                warn!("cocktail generation failed, serving the offline drink: {e}");
                (fallback_cocktail_text(request.alcohol_level).to_string(), Some(e))
            }
        };

        let cocktail = parse_cocktail(&text, &request);
        info!("cocktail ready: {} ({})", cocktail.name, cocktail.alcohol_level);

        Generated {
            dish: cocktail,
            offline: failure.is_some(),
            failure,
        }
    }

    /// The alcohol level used when a cocktail request does not name one.
    pub fn alcohol_level(&self) -> AlcoholLevel {
        *self.alcohol_level.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// light → medium → strong → light.  Returns the new level.
    pub fn cycle_alcohol_level(&self) -> AlcoholLevel {
        let mut level = self.alcohol_level.lock().unwrap_or_else(PoisonError::into_inner);
        *level = level.next();
        *level
    }

    pub fn preferences(&self) -> PreferenceSummary {
        self.lock_history().summary()
    }

    async fn ask(&self, prompt: &str) -> Result<String, GenerateError> {
        let generator = self
            .generator
            .as_ref()
            .ok_or_else(|| GenerateError::Unavailable("no text backend configured".to_string()))?;

        debug!("prompt ({} chars) sent to the text backend", prompt.chars().count());
        let text = timeout(self.timeout, generator.generate(prompt))
            .await
            .map_err(|_| GenerateError::Timeout(self.timeout))??;

        if text.trim().is_empty() {
            return Err(GenerateError::Backend("empty response".to_string()));
        }
        Ok(text)
    }

    fn lock_history(&self) -> MutexGuard<'_, PreferenceHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
