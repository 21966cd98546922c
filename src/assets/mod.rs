//! Asset collaborator
//!
//! The playback engine does not read files. It asks an [`AssetLoader`] for
//! two things:
//!
//! - the object list of a model (skeleton, renderables, object controllers)
//! - the keyframe set of an animation asset, with its curves already bound
//!   to bones of a given skeleton
//!
//! [`MemoryAssets`] serves both from prototypes registered in memory. It is
//! what tests and tools use; an engine plugs its own loader in.

use glam::{Quat, Vec3};
use log::debug;
use rustc_hash::FxHashMap;

use crate::animation::controller::NodeController;
use crate::animation::text_keys::TextKeyMap;
use crate::animation::tracks::KeyframeTrack;
use crate::scene::{Entity, ObjectList, ParticleSystem, Skeleton};

/// Markers and bound controllers of one keyframe asset.
#[derive(Debug, Clone, Default)]
pub struct KeyframeSet {
    pub text_keys: TextKeyMap,
    pub controllers: Vec<NodeController>,
}

pub trait AssetLoader {
    /// Instantiates `model`. With `base_only` only the skeleton base is
    /// created. `None` when the model does not exist.
    fn create_objects(&self, model: &str, base_only: bool) -> Option<ObjectList>;

    /// Loads the keyframes of `model` and binds their curves to `skeleton`.
    /// `None` when the asset does not exist.
    fn create_kf_controllers(&self, skeleton: &Skeleton, model: &str) -> Option<KeyframeSet>;
}

/// Keyframe tracks of one bone, addressed by bone name.
#[derive(Debug, Clone, Default)]
pub struct BoneCurves {
    pub bone: String,
    pub translation: Option<KeyframeTrack<Vec3>>,
    pub rotation: Option<KeyframeTrack<Quat>>,
    pub scale: Option<KeyframeTrack<Vec3>>,
}

impl BoneCurves {
    #[must_use]
    pub fn new(bone: &str) -> Self {
        Self {
            bone: bone.to_string(),
            ..Default::default()
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

    /// Controller for the bone of the same name in `skeleton`, if it has one.
    fn bind(&self, skeleton: &Skeleton) -> Option<NodeController> {
        let Some(target) = skeleton.find_bone(&self.bone) else {
            debug!("Curve target '{}' not found in skeleton '{}'", self.bone, skeleton.name);
            return None;
        };

        let mut controller = NodeController::new(target);
        if let Some(track) = &self.translation {
            controller = controller.with_translation(track.clone());
        }
        if let Some(track) = &self.rotation {
            controller = controller.with_rotation(track.clone());
        }
        if let Some(track) = &self.scale {
            controller = controller.with_scale(track.clone());
        }
        Some(controller)
    }
}

/// Template a model is instantiated from.
#[derive(Debug, Clone, Default)]
pub struct ModelPrototype {
    pub skeleton: Option<Skeleton>,
    pub entities: Vec<Entity>,
    pub particles: Vec<ParticleSystem>,
    /// Object-level curves, bound against the model's own skeleton.
    pub curves: Vec<BoneCurves>,
}

#[derive(Debug, Clone, Default)]
pub struct KeyframePrototype {
    pub text_keys: TextKeyMap,
    /// Curve order is kept; the first curve of the first attached asset
    /// designates the root-motion bone.
    pub curves: Vec<BoneCurves>,
}

/// In-memory [`AssetLoader`].
#[derive(Debug, Clone, Default)]
pub struct MemoryAssets {
    models: FxHashMap<String, ModelPrototype>,
    keyframes: FxHashMap<String, KeyframePrototype>,
}

impl MemoryAssets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_model(&mut self, name: &str, model: ModelPrototype) {
        self.models.insert(name.to_string(), model);
    }

    pub fn add_keyframes(&mut self, name: &str, keyframes: KeyframePrototype) {
        self.keyframes.insert(name.to_string(), keyframes);
    }

    #[must_use]
    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    #[must_use]
    pub fn has_keyframes(&self, name: &str) -> bool {
        self.keyframes.contains_key(name)
    }
}

impl AssetLoader for MemoryAssets {
    fn create_objects(&self, model: &str, base_only: bool) -> Option<ObjectList> {
        let prototype = self.models.get(model)?;
        let skeleton = prototype.skeleton.clone();

        if base_only {
            return Some(ObjectList {
                skeleton,
                ..Default::default()
            });
        }

        let controllers = skeleton
            .as_ref()
            .map(|skel| prototype.curves.iter().filter_map(|c| c.bind(skel)).collect())
            .unwrap_or_default();

        Some(ObjectList {
            skeleton,
            entities: prototype.entities.clone(),
            particles: prototype.particles.clone(),
            controllers,
        })
    }

    fn create_kf_controllers(&self, skeleton: &Skeleton, model: &str) -> Option<KeyframeSet> {
        let prototype = self.keyframes.get(model)?;
        Some(KeyframeSet {
            text_keys: prototype.text_keys.clone(),
            controllers: prototype
                .curves
                .iter()
                .filter_map(|c| c.bind(skeleton))
                .collect(),
        })
    }
}
