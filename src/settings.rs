//! Animation Settings
//!
//! Tunables for the playback engine. All fields have sensible defaults, so
//! most callers never construct this explicitly:
//!
//! ```rust,ignore
//! use myth_locomotion::{Animation, AnimationSettings};
//!
//! let settings = AnimationSettings {
//!     sound_volume: 0.5,
//!     ..Default::default()
//! };
//! let anim = Animation::with_settings(actor, Box::new(sounds), settings);
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Velocity (units per second) above which an action counts as "moving".
pub const DEFAULT_MOVING_VELOCITY: f32 = 1.0;

/// Playback configuration shared by all layers of one character.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnimationSettings {
    /// Estimated root velocity an action must exceed before `play` reports it
    /// as moving and `set_speed` time-scales it.
    pub moving_velocity_threshold: f32,

    /// Volume passed with every `sound: ` text key.
    pub sound_volume: f32,

    /// Pitch passed with every `sound: ` text key.
    pub sound_pitch: f32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            moving_velocity_threshold: DEFAULT_MOVING_VELOCITY,
            sound_volume: 1.0,
            sound_pitch: 1.0,
        }
    }
}
