use crate::animation::controller::NodeController;
use crate::animation::text_keys::TextKeyMap;
use crate::errors::{MotionError, Result};
use crate::scene::BoneHandle;

/// Index of a source in the character's registry. Sources are only ever
/// removed all at once, so ids stay valid until `clear_anim_sources`.
pub type SourceId = usize;

/// One attached keyframe asset: its marker timeline and the bone controllers
/// it drives.
#[derive(Debug, Clone)]
pub struct AnimationSource {
    name: String,
    text_keys: TextKeyMap,
    controllers: Vec<NodeController>,
}

impl AnimationSource {
    /// Rejects assets without markers or without controllers; neither can be
    /// played.
    pub fn new(name: &str, text_keys: TextKeyMap, controllers: Vec<NodeController>) -> Result<Self> {
        if text_keys.is_empty() {
            return Err(MotionError::EmptyTimeline(name.to_string()));
        }
        if controllers.is_empty() {
            return Err(MotionError::NoControllers(name.to_string()));
        }
        Ok(Self {
            name: name.to_string(),
            text_keys,
            controllers,
        })
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn text_keys(&self) -> &TextKeyMap {
        &self.text_keys
    }

    #[inline]
    #[must_use]
    pub fn controllers(&self) -> &[NodeController] {
        &self.controllers
    }

    #[inline]
    pub fn controllers_mut(&mut self) -> &mut [NodeController] {
        &mut self.controllers
    }

    /// Index of the first controller targeting `node`.
    #[must_use]
    pub fn find_controller(&self, node: BoneHandle) -> Option<usize> {
        self.controllers.iter().position(|c| c.target() == node)
    }

    /// Whether the timeline has any marker in `group`'s namespace.
    #[must_use]
    pub fn has_group(&self, group: &str) -> bool {
        self.text_keys.find_group_start(group).is_some()
    }
}
