//! Animation playback
//!
//! - [`TextKeyMap`]: marker timeline of an animation asset
//! - [`KeyframeTrack`] / [`NodeController`]: per-bone curves and their clock binding
//! - [`AnimationSource`]: one attached keyframe asset
//! - [`AnimationLayer`]: an independent playback clock
//! - [`Animation`]: per-character registry, layers, root motion and the tick driver

pub mod character;
pub mod controller;
pub mod events;
pub mod layer;
pub mod source;
pub mod text_keys;
pub mod tracks;
pub mod values;
pub mod velocity;

pub use character::{Animation, ObjectRoot};
pub use controller::{NodeController, TimeSource};
pub use events::{ActorRef, NullSoundManager, SoundManager};
pub use layer::{AnimationLayer, LayerInfo, LayerState, MAX_LAYERS};
pub use source::{AnimationSource, SourceId};
pub use text_keys::{KeyId, TextKey, TextKeyKind, TextKeyMap};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use values::Interpolatable;
pub use velocity::calc_anim_velocity;
