use glam::Vec3;

use crate::animation::controller::NodeController;
use crate::animation::text_keys::{TextKeyMap, marker_label};

/// Average root speed of `group`, in units per second.
///
/// Walks the timeline forward, keeping the last `start`/`loop start` marker
/// seen before the first `loop stop`/`stop` marker, and divides the masked
/// distance the root travels between the two by the elapsed time. Returns 0
/// when no such forward span exists.
#[must_use]
pub fn calc_anim_velocity(
    keys: &TextKeyMap,
    controller: &NodeController,
    accumulate: Vec3,
    group: &str,
) -> f32 {
    let start = marker_label(group, "start");
    let loop_start = marker_label(group, "loop start");
    let loop_stop = marker_label(group, "loop stop");
    let stop = marker_label(group, "stop");

    let mut start_time = f32::MAX;
    let mut stop_time = 0.0;
    for key in keys.iter() {
        if key.label == start || key.label == loop_start {
            start_time = key.time;
        } else if key.label == loop_stop || key.label == stop {
            stop_time = key.time;
            break;
        }
    }

    if stop_time > start_time {
        let start_pos = controller.sample_translation(start_time) * accumulate;
        let end_pos = controller.sample_translation(stop_time) * accumulate;
        return start_pos.distance(end_pos) / (stop_time - start_time);
    }

    0.0
}
