//=========================================================================
// Game Configuration
//=========================================================================
//
// Timing and budget constants for the core.
//
// Every field has a default, so a partial JSON document (or none at
// all) yields a usable configuration. The builder exposes the common
// knobs as fluent setters.
//
//=========================================================================

//=== External Dependencies ===============================================

use std::path::Path;

use serde::{Deserialize, Serialize};

//=== Internal Dependencies ===============================================

use crate::core::error::{ContentError, GameError, GameResult};

//=== LayerDepths =========================================================

/// Fixed depth budget per presentation layer.
///
/// Popups stack upwards from `popup`, one depth per open popup, so the
/// strict order primary < companion < popups always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerDepths {
    pub primary: i32,
    pub companion: i32,
    pub popup: i32,
}

impl Default for LayerDepths {
    fn default() -> Self {
        Self {
            primary: 0,
            companion: 100,
            popup: 119,
        }
    }
}

//=== GameConfig ==========================================================

/// Core configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    /// Logic ticks per second for [`crate::Game::run`].
    pub tps: f64,
    /// Capacity of the presentation → core event channel.
    pub channel_capacity: usize,

    pub dialogue_start_delay_ms: u64,
    pub dialogue_close_delay_ms: u64,

    pub drag_follow_up_delay_ms: u64,
    pub special_step_delay_ms: u64,
    pub title_fade_in_ms: u64,
    pub title_hold_ms: u64,
    pub title_fade_out_ms: u64,
    pub snap_back_ms: u64,
    pub reward_stagger_ms: u64,
    pub end_hold_ms: u64,

    /// Hints available per activity session.
    pub hint_budget: u32,
    pub hint_display_ms: u64,
    /// Language shown in hint overlays when a step has no explicit hint.
    pub hint_language: String,

    /// Refund deducted requirements when a session is abandoned.
    pub refund_on_abandon: bool,

    /// Name of the persisted player record.
    pub storage_key: String,
    pub default_language: String,
    /// Languages the settings toggle cycles through.
    pub languages: Vec<String>,

    pub depths: LayerDepths,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            tps: 60.0,
            channel_capacity: 128,
            dialogue_start_delay_ms: 2000,
            dialogue_close_delay_ms: 4000,
            drag_follow_up_delay_ms: 1000,
            special_step_delay_ms: 2000,
            title_fade_in_ms: 500,
            title_hold_ms: 1500,
            title_fade_out_ms: 500,
            snap_back_ms: 300,
            reward_stagger_ms: 250,
            end_hold_ms: 2000,
            hint_budget: 3,
            hint_display_ms: 5000,
            hint_language: "en".to_string(),
            refund_on_abandon: false,
            storage_key: "playerData".to_string(),
            default_language: "en".to_string(),
            languages: vec!["en".to_string(), "hur".to_string()],
            depths: LayerDepths::default(),
        }
    }
}

impl GameConfig {
    /// Parses a (possibly partial) JSON configuration.
    pub fn from_json_str(json: &str) -> GameResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(|source| ContentError::Parse {
            path: "<config>".into(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> GameResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ContentError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|source| ContentError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the tick loop cannot run with: a non-positive or
    /// non-finite `tps`, and a zero-capacity event channel.
    pub fn validate(&self) -> GameResult<()> {
        if !self.tps.is_finite() || self.tps <= 0.0 {
            return Err(GameError::configuration(format!(
                "tps must be a positive number, got {}",
                self.tps
            )));
        }
        if self.channel_capacity == 0 {
            return Err(GameError::configuration("channelCapacity must be positive"));
        }
        Ok(())
    }

    /// Total length of the title card (fade in + hold + fade out).
    pub fn title_duration_ms(&self) -> u64 {
        self.title_fade_in_ms + self.title_hold_ms + self.title_fade_out_ms
    }
}

//=========================================================================
// Unit Tests
//=========================================================================
