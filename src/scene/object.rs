//! Object lists
//!
//! What the asset collaborator produces for one character model: the
//! skeleton, the renderable entities and particle systems, and any
//! object-level controllers (flickering lights, texture scrolls, ...) that
//! also run on the animation clock.
//!
//! Only visibility flags and draw-queue assignment are managed here; drawing
//! itself belongs to the renderer.

use crate::animation::controller::NodeController;
use crate::scene::Skeleton;

/// How a material blends with what is behind it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum AlphaMode {
    #[default]
    Opaque,
    /// Alpha-tested with the given cutoff; still drawn with solid geometry.
    Mask(f32),
    Blend,
}

impl AlphaMode {
    #[inline]
    #[must_use]
    pub fn is_transparent(self) -> bool {
        self == Self::Blend
    }
}

/// One material section of an [`Entity`].
#[derive(Debug, Clone, Default)]
pub struct SubEntity {
    pub alpha_mode: AlphaMode,
    pub render_queue: u8,
}

#[derive(Debug, Clone, Default)]
pub struct Entity {
    pub name: String,
    pub visibility_flags: u32,
    pub sub_entities: Vec<SubEntity>,
}

impl Entity {
    #[must_use]
    pub fn new(name: &str, sub_entities: Vec<SubEntity>) -> Self {
        Self {
            name: name.to_string(),
            visibility_flags: 0,
            sub_entities,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    pub name: String,
    pub visibility_flags: u32,
    pub render_queue: u8,
}

impl ParticleSystem {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

/// Everything instantiated for one model.
#[derive(Debug, Clone, Default)]
pub struct ObjectList {
    /// Present when the model is skinned.
    pub skeleton: Option<Skeleton>,
    pub entities: Vec<Entity>,
    pub particles: Vec<ParticleSystem>,
    pub controllers: Vec<NodeController>,
}

impl ObjectList {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.skeleton.is_none()
            && self.entities.is_empty()
            && self.particles.is_empty()
            && self.controllers.is_empty()
    }
}

/// Applies visibility flags and sorts every renderable into the solid or the
/// transparent draw queue.
///
/// `visibility_flags == 0` leaves the current flags alone. Particle systems
/// always go to the transparent queue.
pub fn set_render_properties(
    objects: &mut ObjectList,
    visibility_flags: u32,
    solid_queue: u8,
    transparent_queue: u8,
) {
    for entity in &mut objects.entities {
        if visibility_flags != 0 {
            entity.visibility_flags = visibility_flags;
        }
        for sub in &mut entity.sub_entities {
            sub.render_queue = if sub.alpha_mode.is_transparent() {
                transparent_queue
            } else {
                solid_queue
            };
        }
    }

    // TODO: inspect the particle material once emitters carry one.
    for particles in &mut objects.particles {
        if visibility_flags != 0 {
            particles.visibility_flags = visibility_flags;
        }
        particles.render_queue = transparent_queue;
    }
}
