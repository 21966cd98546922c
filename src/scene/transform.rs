use glam::{Affine3A, Quat, Vec3};

/// Transform component
///
/// A node's position, rotation and scale (TRS) plus a dirty flag raised
/// whenever a writer changes them. Bones and the accumulation root both
/// carry one.
#[derive(Debug, Clone)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,

    dirty: bool,
}

impl Transform {
    #[must_use]
    pub fn new() -> Self {
        Self::from_trs(Vec3::ZERO, Quat::IDENTITY, Vec3::ONE)
    }

    /// Fresh transforms start dirty so the first consumer picks them up.
    #[must_use]
    pub fn from_trs(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
            dirty: true,
        }
    }

    /// Current TRS as an affine matrix.
    #[inline]
    #[must_use]
    pub fn compose(&self) -> Affine3A {
        Affine3A::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }

    #[inline]
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Returns and clears the dirty flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new()
    }
}
