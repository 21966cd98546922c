//! Node controllers
//!
//! A [`NodeController`] is the set of keyframe tracks that animate one bone.
//! It does not own a clock: its [`TimeSource`] names the layer it reads the
//! time from, and the tick driver resamples it once per frame.

use glam::{Quat, Vec3};

use crate::animation::layer::{AnimationLayer, resolve_time};
use crate::animation::tracks::{KeyframeCursor, KeyframeTrack};
use crate::scene::{BoneHandle, Skeleton};

/// Where a controller reads its sampling time from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSource {
    /// Not driven; resampling skips it.
    #[default]
    Unbound,
    /// Time of this layer, or of the nearest active layer below it.
    Layer(usize),
}

impl TimeSource {
    /// Current time for this source, `None` when unbound.
    #[must_use]
    pub fn resolve(self, layers: &[AnimationLayer]) -> Option<f32> {
        match self {
            Self::Unbound => None,
            Self::Layer(index) => Some(resolve_time(layers, index)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct NodeController {
    target: BoneHandle,
    time_source: TimeSource,

    translation: Option<KeyframeTrack<Vec3>>,
    rotation: Option<KeyframeTrack<Quat>>,
    scale: Option<KeyframeTrack<Vec3>>,

    // [translation, rotation, scale]
    cursors: [KeyframeCursor; 3],
}

impl NodeController {
    #[must_use]
    pub fn new(target: BoneHandle) -> Self {
        Self {
            target,
            time_source: TimeSource::Unbound,
            translation: None,
            rotation: None,
            scale: None,
            cursors: [KeyframeCursor::default(); 3],
        }
    }

    #[must_use]
    pub fn with_translation(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.translation = Some(track);
        self
    }

    #[must_use]
    pub fn with_rotation(mut self, track: KeyframeTrack<Quat>) -> Self {
        self.rotation = Some(track);
        self
    }

    #[must_use]
    pub fn with_scale(mut self, track: KeyframeTrack<Vec3>) -> Self {
        self.scale = Some(track);
        self
    }

    /// Bone this controller writes to.
    #[inline]
    #[must_use]
    pub fn target(&self) -> BoneHandle {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn time_source(&self) -> TimeSource {
        self.time_source
    }

    #[inline]
    #[must_use]
    pub fn is_bound(&self) -> bool {
        self.time_source != TimeSource::Unbound
    }

    pub fn bind(&mut self, source: TimeSource) {
        self.time_source = source;
    }

    /// Translation of the target at `time`. Zero when the controller has no
    /// translation track.
    #[must_use]
    pub fn sample_translation(&self, time: f32) -> Vec3 {
        self.translation
            .as_ref()
            .map_or(Vec3::ZERO, |track| track.sample(time))
    }

    /// Writes the sampled pose at `time` into the target bone.
    ///
    /// Only channels that have a track are touched. Returns false when the
    /// target is not part of `skeleton`.
    pub fn apply(&mut self, time: f32, skeleton: &mut Skeleton) -> bool {
        let Some(bone) = skeleton.bone_mut(self.target) else {
            return false;
        };
        let [t_cursor, r_cursor, s_cursor] = &mut self.cursors;

        if let Some(track) = &self.translation {
            bone.transform.position = track.sample_with_cursor(time, t_cursor);
        }
        if let Some(track) = &self.rotation {
            bone.transform.rotation = track.sample_with_cursor(time, r_cursor);
        }
        if let Some(track) = &self.scale {
            bone.transform.scale = track.sample_with_cursor(time, s_cursor);
        }
        bone.transform.mark_dirty();
        true
    }
}
