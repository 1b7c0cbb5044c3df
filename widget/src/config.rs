//! Everything about the board's behavior a host can configure

use core::time::Duration;

use board::{Color, Dimensions};
use serde::{Deserialize, Serialize};

use crate::animation::Easing;

/// Configuration of a board
///
/// Every field has a default, so a partial description (in JSON, say) is enough.
///
/// ```
/// let config = widget::Config::from_json(r#"{ "premove": { "multi": true } }"#).unwrap();
/// assert!(config.premove.multi);
/// assert!(config.allow_premoves);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Whether moves for the side not to move are queued instead of refused
    pub allow_premoves: bool,
    pub premove: PremoveConfig,
    pub promotion: PromotionConfig,
    /// Whether state changes are animated at all
    pub show_animations: bool,
    pub animation: AnimationConfig,
    /// Which side is drawn at the bottom
    pub orientation: Color,
    /// Edge length of a square in pixels
    pub square_size: f32,
    pub dimensions: Dimensions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PremoveConfig {
    /// Keep a queue of premoves per side, rather than a single slot
    pub multi: bool,
    pub white: bool,
    pub black: bool,
    /// How long a premove waits after being validated before it's played
    pub delay_ms: u64,
    /// How long after a move's animation the premove queue is checked
    pub replay_buffer_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PromotionConfig {
    /// Always promote into a queen without asking
    pub auto_queen: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    pub duration_ms: u64,
    pub easing: Easing,
}

impl Config {
    /// Read a configuration from JSON, taking defaults for anything left out
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write this configuration as JSON
    pub fn to_json(&self) -> crate::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// How long a move takes to animate, which is zero with animations off
    pub fn animation_window(&self) -> Duration {
        if self.show_animations {
            Duration::from_millis(self.animation.duration_ms)
        } else {
            Duration::ZERO
        }
    }
}

impl PremoveConfig {
    /// Whether premoves are switched on for the given side
    pub const fn enabled_for(&self, color: Color) -> bool {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn replay_buffer(&self) -> Duration {
        Duration::from_millis(self.replay_buffer_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            allow_premoves: true,
            premove: PremoveConfig::default(),
            promotion: PromotionConfig::default(),
            show_animations: true,
            animation: AnimationConfig::default(),
            orientation: Color::White,
            square_size: 64.0,
            dimensions: Dimensions::STANDARD,
        }
    }
}

impl Default for PremoveConfig {
    fn default() -> Self {
        Self {
            multi: false,
            white: true,
            black: true,
            delay_ms: 150,
            replay_buffer_ms: 50,
        }
    }
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            duration_ms: 200,
            easing: Easing::default(),
        }
    }
}
