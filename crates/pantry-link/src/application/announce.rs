//! Device feedback after a dish is generated, and the LED self-test.
//!
//! Every sequence ends by restoring the lights of the current difficulty, so
//! the LEDs always return to mirroring the coordinator.  Nothing is sent
//! while the link is down.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use pantry_core::{Cocktail, DeviceCommand, Difficulty, IndicatorLights, Recipe};

use super::device_link::{DeviceLink, TransportError};
use super::difficulty_sync::DifficultySync;

const BLINK_COUNT: usize = 3;

/// Pauses between LED steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectTimings {
    /// Delay between the on and off halves of a cocktail blink.
    pub blink_interval: Duration,
    /// How long each level stays lit during the light test.
    pub light_test_step: Duration,
}

impl Default for EffectTimings {
    fn default() -> Self {
        Self {
            blink_interval: Duration::from_millis(200),
            light_test_step: Duration::from_millis(500),
        }
    }
}

impl EffectTimings {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            blink_interval: Duration::ZERO,
            light_test_step: Duration::ZERO,
        }
    }
}

pub struct DeviceAnnouncer {
    link: Arc<dyn DeviceLink>,
    sync: Arc<DifficultySync>,
    timings: EffectTimings,
}

impl DeviceAnnouncer {
    pub fn new(link: Arc<dyn DeviceLink>, sync: Arc<DifficultySync>, timings: EffectTimings) -> Self {
        Self { link, sync, timings }
    }

    /// `RECIPE_GENERATED:<name>`, the current lights, then the stats line.
    /// Returns false when the device is not connected.
    pub async fn announce_recipe(&self, recipe: &Recipe) -> Result<bool, TransportError> {
        if !self.link.is_connected() {
            debug!("device offline; recipe not announced");
            return Ok(false);
        }
        self.send(DeviceCommand::RecipeGenerated {
            name: recipe.name.clone(),
        })
        .await?;
        self.restore_lights().await?;
        self.send(DeviceCommand::Stats {
            budget: recipe.budget,
            calories: recipe.calories,
        })
        .await?;
        info!("recipe announced to device: {}", recipe.name);
        Ok(true)
    }

    /// `COCKTAIL_GENERATED:<name>`, three all-on/all-off blinks, then the
    /// current lights.
    pub async fn announce_cocktail(&self, cocktail: &Cocktail) -> Result<bool, TransportError> {
        if !self.link.is_connected() {
            debug!("device offline; cocktail not announced");
            return Ok(false);
        }
        self.send(DeviceCommand::CocktailGenerated {
            name: cocktail.name.clone(),
        })
        .await?;
        for _ in 0..BLINK_COUNT {
            self.send(DeviceCommand::Lights(IndicatorLights::all_on())).await?;
            pause(self.timings.blink_interval).await;
            self.send(DeviceCommand::Lights(IndicatorLights::all_off())).await?;
            pause(self.timings.blink_interval).await;
        }
        self.restore_lights().await?;
        info!("cocktail announced to device: {}", cocktail.name);
        Ok(true)
    }

    /// Lights Easy, Medium and Hard in turn, then all off, then restores the
    /// current difficulty.
    pub async fn light_test(&self) -> Result<bool, TransportError> {
        if !self.link.is_connected() {
            return Ok(false);
        }
        for level in Difficulty::ALL {
            self.send(DeviceCommand::Lights(level.lights())).await?;
            pause(self.timings.light_test_step).await;
        }
        self.send(DeviceCommand::Lights(IndicatorLights::all_off())).await?;
        pause(self.timings.light_test_step).await;
        self.restore_lights().await?;
        info!("LED light test finished");
        Ok(true)
    }

    async fn restore_lights(&self) -> Result<(), TransportError> {
        self.send(DeviceCommand::Lights(self.sync.indicator())).await
    }

    async fn send(&self, command: DeviceCommand) -> Result<(), TransportError> {
        self.link.send_command(&command).await
    }
}

async fn pause(duration: Duration) {
    if !duration.is_zero() {
        tokio::time::sleep(duration).await;
    }
}
