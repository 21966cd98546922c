//! Error Types
//!
//! This module defines the error types used throughout the animation layer.
//!
//! # Overview
//!
//! [`MotionError`] describes every expected failure of the playback engine:
//! - Asset lookups that find nothing usable
//! - Timelines that do not contain the requested action markers
//! - Operations that need a bound skeleton
//!
//! None of these are fatal. The public [`Animation`](crate::animation::Animation)
//! surface reports them as `false` / `None` and logs the error, so callers
//! simply see "no visible change". Internals use [`Result<T>`] and `?`.
//!
//! ```rust,ignore
//! use myth_locomotion::errors::{MotionError, Result};
//!
//! fn find_action() -> Result<()> {
//!     Err(MotionError::ActionNotFound("walkforward".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for animation playback.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MotionError {
    // ========================================================================
    // Asset Errors
    // ========================================================================
    /// The asset collaborator has no resource with this name.
    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    /// The keyframe asset carries no text keys.
    #[error("Keyframe asset has no text keys: {0}")]
    EmptyTimeline(String),

    /// The keyframe asset carries no node controllers.
    #[error("Keyframe asset has no controllers: {0}")]
    NoControllers(String),

    /// A curve's keyframe times and values do not line up.
    #[error("Invalid keyframe track: {0}")]
    InvalidTrack(String),

    /// The object root has no skeleton to animate.
    #[error("Object has no skeleton")]
    NoSkeleton,

    // ========================================================================
    // Timeline Errors
    // ========================================================================
    /// No attached source defines the requested action.
    #[error("Failed to find animation {0}")]
    ActionNotFound(String),

    /// A timeline lacks the requested marker.
    #[error("Missing text key \"{0}\"")]
    MissingMarker(String),

    /// Start and stop resolve to the same marker.
    #[error("Start and stop markers collapse for {group} ({start} -> {stop})")]
    CollapsedMarkers {
        /// Action name
        group: String,
        /// Requested start phase
        start: String,
        /// Requested stop phase
        stop: String,
    },

    // ========================================================================
    // Layer Errors
    // ========================================================================
    /// Layer index outside the fixed layer array.
    #[error("Layer index out of bounds: {0}")]
    InvalidLayer(usize),
}

/// Alias for `Result<T, MotionError>`.
pub type Result<T> = std::result::Result<T, MotionError>;
