//! Animation layers
//!
//! Each character owns [`MAX_LAYERS`] independent playback clocks. A layer is
//! active while it has an action name; its marker cursors index into the
//! [`TextKeyMap`] of the source it was bound to.
//!
//! ```text
//! Inactive --play--> Playing --stop marker--> Stopped
//!                       ^                        |
//!                       +------ loop restart ----+
//! ```

use crate::animation::source::SourceId;
use crate::animation::text_keys::{KeyId, TextKeyMap, marker_label, phase_of};
use crate::errors::{MotionError, Result};

/// Number of layers per character. Layer 0 drives root motion.
pub const MAX_LAYERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayerState {
    /// No action bound.
    Inactive,
    /// The clock advances and markers fire.
    Playing,
    /// The stop marker was reached with no loops left. Stays bound until
    /// `disable` or the next `play`.
    Stopped,
}

/// Snapshot returned by `Animation::info`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerInfo {
    /// Progress between the start and stop markers, `0.0..=1.0`.
    pub complete: f32,
    pub group: String,
    /// Phase of the bound start marker (`"start"` when `"loop start"` fell back).
    pub start: String,
    pub stop: String,
}

#[derive(Debug, Clone, Default)]
pub struct AnimationLayer {
    pub(crate) group: String,
    pub(crate) source: Option<SourceId>,
    pub(crate) time: f32,

    pub(crate) start_key: KeyId,
    pub(crate) loop_start_key: KeyId,
    pub(crate) stop_key: KeyId,
    pub(crate) next_key: KeyId,

    pub(crate) loop_count: usize,
    pub(crate) playing: bool,
}

impl AnimationLayer {
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.group.is_empty()
    }

    #[must_use]
    pub fn state(&self) -> LayerState {
        match (self.is_active(), self.playing) {
            (false, _) => LayerState::Inactive,
            (true, true) => LayerState::Playing,
            (true, false) => LayerState::Stopped,
        }
    }

    #[inline]
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    #[inline]
    #[must_use]
    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    #[inline]
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Loop restarts still available.
    #[inline]
    #[must_use]
    pub fn loop_count(&self) -> usize {
        self.loop_count
    }

    #[inline]
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.playing
    }

    /// Marker the next `loop stop`/`stop` rewinds to.
    #[inline]
    #[must_use]
    pub fn loop_start_key(&self) -> KeyId {
        self.loop_start_key
    }

    /// Returns the layer to the inactive state.
    pub fn clear(&mut self) {
        self.group.clear();
        self.source = None;
        self.time = 0.0;
        self.loop_count = 0;
        self.playing = false;
    }

    /// Binds the `group: start` .. `group: stop` span of `keys` and seeks to
    /// `start_point` (a fraction of the span, clamped to `0..=1`).
    ///
    /// Only the markers and the clock are set; the caller attaches the group
    /// name and source once a source has been accepted.
    pub(crate) fn reset(
        &mut self,
        keys: &TextKeyMap,
        group: &str,
        start: &str,
        stop: &str,
        start_point: f32,
    ) -> Result<()> {
        let start_key = keys
            .find_from(0, &marker_label(group, start))
            .or_else(|| {
                (start == "loop start")
                    .then(|| keys.find_from(0, &marker_label(group, "start")))
                    .flatten()
            })
            .ok_or_else(|| MotionError::MissingMarker(marker_label(group, start)))?;

        let stop_key = keys
            .find_from(start_key, &marker_label(group, stop))
            .ok_or_else(|| MotionError::MissingMarker(marker_label(group, stop)))?;

        if start_key == stop_key {
            return Err(MotionError::CollapsedMarkers {
                group: group.to_string(),
                start: start.to_string(),
                stop: stop.to_string(),
            });
        }

        let start_time = keys.time(start_key);
        let span = keys.time(stop_key) - start_time;

        self.start_key = start_key;
        self.loop_start_key = start_key;
        self.stop_key = stop_key;
        self.next_key = start_key;
        self.time = start_time + span * start_point.clamp(0.0, 1.0);

        // Skip the markers already behind the clock, picking up the loop
        // restart point among them.
        let loop_start = marker_label(group, "loop start");
        while self.next_key != self.stop_key && keys.time(self.next_key) <= self.time {
            if keys.get(self.next_key).is_some_and(|k| k.label == loop_start) {
                self.loop_start_key = self.next_key;
            }
            self.next_key += 1;
        }

        Ok(())
    }

    pub(crate) fn bind(&mut self, group: &str, source: SourceId, loops: usize) {
        self.group = group.to_string();
        self.source = Some(source);
        self.loop_count = loops;
        self.playing = true;
    }

    /// Rewinds to the loop restart point if loops remain.
    pub(crate) fn do_loop(&mut self, keys: &TextKeyMap) -> bool {
        if self.loop_count == 0 {
            return false;
        }
        self.loop_count -= 1;

        self.time = keys.time(self.loop_start_key);
        self.next_key = self.loop_start_key + 1;
        self.playing = true;
        true
    }

    /// Progress and bound phases. `None` while inactive.
    pub(crate) fn info(&self, keys: &TextKeyMap) -> Option<LayerInfo> {
        if !self.is_active() {
            return None;
        }

        let start_time = keys.time(self.start_key);
        let stop_time = keys.time(self.stop_key);
        let phase = |id: KeyId| {
            keys.get(id)
                .and_then(|k| phase_of(&k.label, &self.group))
                .unwrap_or_default()
                .to_string()
        };

        Some(LayerInfo {
            complete: (self.time - start_time) / (stop_time - start_time),
            group: self.group.clone(),
            start: phase(self.start_key),
            stop: phase(self.stop_key),
        })
    }
}

/// Clock read by controllers bound to layer `index`: that layer's time when
/// active, otherwise the nearest active layer below it, otherwise 0.
#[must_use]
pub fn resolve_time(layers: &[AnimationLayer], index: usize) -> f32 {
    let upper = index.min(layers.len().saturating_sub(1));
    layers
        .get(..=upper)
        .and_then(|below| below.iter().rev().find(|l| l.is_active()))
        .map_or(0.0, |layer| layer.time)
}
