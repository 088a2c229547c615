// Tunable game parameters.
//
// `GameConfig` is loaded from JSON at relay startup (`--config <path>`) or
// built with `GameConfig::default()`. Every field has a default, so a partial
// JSON object overrides only what it names. The session and the scorer read
// these values; nothing in the round logic hard-codes them.
//
// See also: `session.rs` (round duration, canvas bounds), `scoring.rs`
// (proximity tolerance), and the relay's `RelayConfig`, which carries one
// `GameConfig` shared by every area it hosts.

use crate::error::ConfigError;
use crate::scoring::PROXIMITY_TOLERANCE;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Length of one round in seconds, counted down by `tick`.
    pub round_duration_secs: f64,
    /// Max distance (canvas pixels) at which a drawn pixel covers a
    /// reference pixel.
    pub proximity_tolerance: f64,
    /// Canvas width in pixels. Moves with pixels outside are rejected.
    pub canvas_width: f64,
    /// Canvas height in pixels.
    pub canvas_height: f64,
    /// Most pixels one move may carry. Two full traces plus the reference
    /// shape must still fit in a single relay frame.
    pub max_trace_pixels: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            round_duration_secs: 60.0,
            proximity_tolerance: PROXIMITY_TOLERANCE,
            canvas_width: 400.0,
            canvas_height: 400.0,
            max_trace_pixels: 5_000,
        }
    }
}

impl GameConfig {
    /// Parse and validate a JSON config. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !(self.round_duration_secs.is_finite() && self.round_duration_secs > 0.0) {
            return Err(ConfigError::Invalid(
                "round_duration_secs must be positive".into(),
            ));
        }
        if !(self.proximity_tolerance.is_finite() && self.proximity_tolerance >= 0.0) {
            return Err(ConfigError::Invalid(
                "proximity_tolerance must be non-negative".into(),
            ));
        }
        if !(self.canvas_width > 0.0 && self.canvas_height > 0.0) {
            return Err(ConfigError::Invalid("canvas must have a positive size".into()));
        }
        if self.max_trace_pixels == 0 {
            return Err(ConfigError::Invalid(
                "max_trace_pixels must be positive".into(),
            ));
        }
        Ok(())
    }
}
