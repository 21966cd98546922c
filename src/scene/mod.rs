//! Scene-side representation of an animated character
//!
//! - Transform: TRS component with a cached local matrix
//! - Skeleton: named bone hierarchy driven by the animation layer
//! - ObjectList: renderables, particle systems and object controllers of one model

pub mod object;
pub mod skeleton;
pub mod transform;

pub use object::{AlphaMode, Entity, ObjectList, ParticleSystem, SubEntity, set_render_properties};
pub use skeleton::{Bone, Skeleton, update_skeleton_instance};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    /// Stable identifier of a bone inside its [`Skeleton`].
    pub struct BoneHandle;
}
