//! Keyframe tracks
//!
//! A [`KeyframeTrack`] is one channel of a bone curve (translation, rotation
//! or scale). Sampling goes through a [`KeyframeCursor`] so that a clock that
//! moves forward a little each tick finds its keyframe in O(1); loop rewinds
//! and scrubbing fall back to a binary search.

use crate::animation::values::Interpolatable;
use crate::errors::{MotionError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpolationMode {
    Linear,
    Step,
    /// Values are stored as `[in_tangent, value, out_tangent]` triples.
    CubicSpline,
}

const MAX_SCAN_OFFSET: usize = 3;

/// Remembers the keyframe interval found by the previous sample.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeyframeCursor {
    pub last_index: usize,
}

#[derive(Debug, Clone)]
pub struct KeyframeTrack<T: Interpolatable> {
    times: Vec<f32>,
    values: Vec<T>,
    interpolation: InterpolationMode,
}

impl<T: Interpolatable> KeyframeTrack<T> {
    /// Builds a track, rejecting empty input and value counts that do not
    /// match the interpolation mode.
    pub fn new(times: Vec<f32>, values: Vec<T>, interpolation: InterpolationMode) -> Result<Self> {
        let expected = match interpolation {
            InterpolationMode::CubicSpline => times.len() * 3,
            _ => times.len(),
        };
        if times.is_empty() || values.len() != expected {
            return Err(MotionError::InvalidTrack(format!(
                "{} keyframes, {} values",
                times.len(),
                values.len()
            )));
        }
        Ok(Self {
            times,
            values,
            interpolation,
        })
    }

    /// Linear track from `(time, value)` pairs.
    pub fn linear(keys: &[(f32, T)]) -> Result<Self> {
        let (times, values) = keys.iter().copied().unzip();
        Self::new(times, values, InterpolationMode::Linear)
    }

    #[inline]
    #[must_use]
    pub fn times(&self) -> &[f32] {
        &self.times
    }

    #[inline]
    #[must_use]
    pub fn interpolation(&self) -> InterpolationMode {
        self.interpolation
    }

    /// Stateless sample; binary-searches the keyframe.
    #[must_use]
    pub fn sample(&self, time: f32) -> T {
        let next_idx = self.times.partition_point(|&t| t <= time);
        self.sample_at_frame(next_idx.saturating_sub(1), time)
    }

    /// Samples with a cursor, updating it to the interval that contains `time`.
    pub fn sample_with_cursor(&self, time: f32, cursor: &mut KeyframeCursor) -> T {
        let len = self.times.len();
        if len == 1 {
            return *self.value_at(0);
        }

        let i = cursor.last_index.min(len - 1);
        let t_curr = self.times[i];

        let found = if time >= t_curr {
            // Playing forward: the interval is usually at most a few keys ahead.
            let mut res = None;
            for idx in i..=(i + MAX_SCAN_OFFSET) {
                if idx >= len - 1 {
                    res = Some(len - 1);
                    break;
                }
                if time < self.times[idx + 1] {
                    res = Some(idx);
                    break;
                }
            }
            res
        } else {
            // Short rewind.
            (0..=MAX_SCAN_OFFSET)
                .take_while(|&offset| offset <= i)
                .map(|offset| i - offset)
                .find(|&idx| time >= self.times[idx])
        };

        let index = found.unwrap_or_else(|| {
            // Loop restart or scrubbing.
            self.times.partition_point(|&t| t <= time).saturating_sub(1)
        });
        cursor.last_index = index;

        self.sample_at_frame(index, time)
    }

    fn value_at(&self, index: usize) -> &T {
        match self.interpolation {
            InterpolationMode::CubicSpline => &self.values[index * 3 + 1],
            _ => &self.values[index],
        }
    }

    fn sample_at_frame(&self, index: usize, time: f32) -> T {
        let len = self.times.len();
        if index >= len - 1 {
            return *self.value_at(len - 1);
        }

        let next_idx = index + 1;
        let t0 = self.times[index];
        let t1 = self.times[next_idx];
        let dt = t1 - t0;

        let t = if dt > 1e-6 { (time - t0) / dt } else { 0.0 };
        let t = t.clamp(0.0, 1.0);

        match self.interpolation {
            InterpolationMode::Step => *self.value_at(index),
            InterpolationMode::Linear => {
                T::interpolate_linear(*self.value_at(index), *self.value_at(next_idx), t)
            }
            InterpolationMode::CubicSpline => {
                let i_prev = index * 3;
                let i_next = next_idx * 3;
                T::interpolate_cubic(
                    self.values[i_prev + 1],
                    self.values[i_prev + 2],
                    self.values[i_next],
                    self.values[i_next + 1],
                    t,
                    dt,
                )
            }
        }
    }
}
