use glam::{Affine3A, Quat, Vec3};
use rustc_hash::FxHashMap;
use slotmap::SlotMap;
use smallvec::SmallVec;

use crate::scene::{BoneHandle, Transform};

/// A single named bone of a [`Skeleton`].
#[derive(Debug, Clone)]
pub struct Bone {
    pub(crate) name: String,
    pub(crate) parent: Option<BoneHandle>,
    pub(crate) children: SmallVec<[BoneHandle; 4]>,

    /// Local transform, relative to the parent bone.
    pub transform: Transform,

    /// Binding pose restored by [`Bone::reset_to_initial_state`].
    initial_position: Vec3,
    initial_rotation: Quat,
    initial_scale: Vec3,

    /// Set once the animation layer drives this bone instead of the
    /// skeleton's own animation states.
    pub(crate) manually_controlled: bool,
}

impl Bone {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<BoneHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[BoneHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn is_manually_controlled(&self) -> bool {
        self.manually_controlled
    }

    /// Restores the binding pose.
    pub fn reset_to_initial_state(&mut self) {
        self.transform.position = self.initial_position;
        self.transform.rotation = self.initial_rotation;
        self.transform.scale = self.initial_scale;
        self.transform.mark_dirty();
    }

    /// Captures the current local transform as the binding pose.
    pub fn set_initial_state(&mut self) {
        self.initial_position = self.transform.position;
        self.initial_rotation = self.transform.rotation;
        self.initial_scale = self.transform.scale;
    }
}

/// Bone hierarchy of one skinned object.
///
/// Bones live in a slot map and are addressed by [`BoneHandle`]; a name index
/// provides the lookup used by keyframe binding and `find_node`.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    pub name: String,

    bones: SlotMap<BoneHandle, Bone>,
    roots: Vec<BoneHandle>,
    by_name: FxHashMap<String, BoneHandle>,

    /// Set by the tick driver after controllers were resampled; consumers
    /// re-pose skinned meshes and clear it.
    pose_dirty: bool,
}

impl Skeleton {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    /// Adds a bone under `parent` (or as a root) with the given binding pose.
    ///
    /// The first bone registered under a name wins name lookups.
    pub fn add_bone(
        &mut self,
        name: &str,
        parent: Option<BoneHandle>,
        transform: Transform,
    ) -> BoneHandle {
        let parent = parent.filter(|p| self.bones.contains_key(*p));
        let bone = Bone {
            name: name.to_string(),
            parent,
            children: SmallVec::new(),
            initial_position: transform.position,
            initial_rotation: transform.rotation,
            initial_scale: transform.scale,
            transform,
            manually_controlled: false,
        };
        let handle = self.bones.insert(bone);

        match parent {
            Some(p) => self.bones[p].children.push(handle),
            None => self.roots.push(handle),
        }
        self.by_name.entry(name.to_string()).or_insert(handle);
        handle
    }

    #[inline]
    #[must_use]
    pub fn bone(&self, handle: BoneHandle) -> Option<&Bone> {
        self.bones.get(handle)
    }

    #[inline]
    pub fn bone_mut(&mut self, handle: BoneHandle) -> Option<&mut Bone> {
        self.bones.get_mut(handle)
    }

    #[inline]
    #[must_use]
    pub fn find_bone(&self, name: &str) -> Option<BoneHandle> {
        self.by_name.get(name).copied()
    }

    #[inline]
    #[must_use]
    pub fn has_bone(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    #[inline]
    #[must_use]
    pub fn bone_count(&self) -> usize {
        self.bones.len()
    }

    #[inline]
    #[must_use]
    pub fn roots(&self) -> &[BoneHandle] {
        &self.roots
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoneHandle, &Bone)> {
        self.bones.iter()
    }

    /// Flags every bone as driven manually by the animation layer.
    pub fn set_manually_controlled(&mut self, manual: bool) {
        for bone in self.bones.values_mut() {
            bone.manually_controlled = manual;
        }
    }

    /// Model-space matrix of a bone: the product of the local matrices from
    /// the root down to `handle`.
    #[must_use]
    pub fn derived_matrix(&self, handle: BoneHandle) -> Affine3A {
        let mut world = Affine3A::IDENTITY;
        let mut current = Some(handle);
        while let Some(h) = current {
            let Some(bone) = self.bones.get(h) else {
                break;
            };
            world = bone.transform.compose() * world;
            current = bone.parent;
        }
        world
    }

    /// Positions a bone so that its model-space rotation and translation
    /// match the given values, keeping its local scale.
    pub fn set_derived(&mut self, handle: BoneHandle, rotation: Quat, position: Vec3) {
        let Some(parent) = self.bones.get(handle).map(|b| b.parent) else {
            return;
        };
        let parent_world = parent.map_or(Affine3A::IDENTITY, |p| self.derived_matrix(p));
        let local = parent_world.inverse() * Affine3A::from_rotation_translation(rotation, position);
        let (_, local_rotation, local_position) = local.to_scale_rotation_translation();

        let bone = &mut self.bones[handle];
        bone.transform.rotation = local_rotation.normalize();
        bone.transform.position = local_position;
        bone.transform.mark_dirty();
    }

    /// Marks the pose as changed so skinned consumers re-evaluate it.
    #[inline]
    pub fn notify_dirty(&mut self) {
        self.pose_dirty = true;
    }

    #[inline]
    #[must_use]
    pub fn is_pose_dirty(&self) -> bool {
        self.pose_dirty
    }

    /// Bones whose local transform changed since the last
    /// [`take_pose_dirty`](Self::take_pose_dirty).
    pub fn dirty_bones(&self) -> impl Iterator<Item = BoneHandle> + '_ {
        self.bones
            .iter()
            .filter(|(_, bone)| bone.transform.is_dirty())
            .map(|(handle, _)| handle)
    }

    /// Returns and clears the pose dirty flag, along with every bone's
    /// transform flag.
    pub fn take_pose_dirty(&mut self) -> bool {
        for bone in self.bones.values_mut() {
            bone.transform.take_dirty();
        }
        std::mem::take(&mut self.pose_dirty)
    }
}

/// Copies the pose of `src` onto every bone of `dst` that has a namesake in
/// `src`.
///
/// Root bones (in either skeleton) copy the local transform; other bones copy
/// the model-space rotation and translation with unit scale. Bones without a
/// namesake return to their binding pose so they stay offset from their
/// parents.
pub fn update_skeleton_instance(src: &Skeleton, dst: &mut Skeleton) {
    let roots = dst.roots.clone();
    for root in roots {
        update_bone_tree(src, dst, root);
    }
    dst.notify_dirty();
}

fn update_bone_tree(src: &Skeleton, dst: &mut Skeleton, handle: BoneHandle) {
    let Some(bone) = dst.bones.get(handle) else {
        return;
    };
    let dst_is_root = bone.parent.is_none();
    let children = bone.children.clone();

    match src.find_bone(&bone.name).and_then(|h| src.bones.get(h).map(|b| (h, b))) {
        Some((src_handle, src_bone)) => {
            if src_bone.parent.is_none() || dst_is_root {
                let target = &mut dst.bones[handle].transform;
                target.rotation = src_bone.transform.rotation;
                target.position = src_bone.transform.position;
                target.scale = src_bone.transform.scale;
                target.mark_dirty();
            } else {
                let (_, rotation, position) = src
                    .derived_matrix(src_handle)
                    .to_scale_rotation_translation();
                dst.set_derived(handle, rotation, position);
                dst.bones[handle].transform.scale = Vec3::ONE;
            }
        }
        None => dst.bones[handle].reset_to_initial_state(),
    }

    for child in children {
        update_bone_tree(src, dst, child);
    }
}
