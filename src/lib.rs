#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod animation;
pub mod assets;
pub mod errors;
pub mod scene;
pub mod settings;

pub use animation::{
    ActorRef, Animation, AnimationLayer, AnimationSource, KeyframeTrack, LayerInfo, LayerState,
    MAX_LAYERS, NodeController, NullSoundManager, SoundManager, TextKeyMap,
};
pub use assets::{AssetLoader, KeyframeSet, MemoryAssets};
pub use errors::MotionError;
pub use scene::{BoneHandle, ObjectList, Skeleton, Transform, update_skeleton_instance};
pub use settings::AnimationSettings;
