//! Scene-side tests
//!
//! Tests for:
//! - Transform dirty flag and matrix composition
//! - Skeleton hierarchy, name lookup and derived transforms
//! - Skeleton instance pose copy
//! - Render property assignment on object lists
//! - MemoryAssets instantiation

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use myth_locomotion::animation::{ActorRef, Animation, NullSoundManager};
use myth_locomotion::assets::{AssetLoader, BoneCurves, MemoryAssets, ModelPrototype};
use myth_locomotion::animation::tracks::KeyframeTrack;
use myth_locomotion::scene::{
    AlphaMode, Entity, ObjectList, ParticleSystem, Skeleton, SubEntity, Transform,
    set_render_properties, update_skeleton_instance,
};

// ============================================================================
// Helper
// ============================================================================

const EPSILON: f32 = 1e-5;

fn vec3_approx(a: Vec3, b: Vec3) -> bool {
    a.abs_diff_eq(b, EPSILON)
}

fn quat_approx(a: Quat, b: Quat) -> bool {
    // q and -q are the same rotation.
    a.abs_diff_eq(b, 1e-4) || a.abs_diff_eq(-b, 1e-4)
}

fn trs(position: Vec3, rotation: Quat, scale: Vec3) -> Transform {
    Transform::from_trs(position, rotation, scale)
}

fn at(position: Vec3) -> Transform {
    trs(position, Quat::IDENTITY, Vec3::ONE)
}

// ============================================================================
// Transform
// ============================================================================

#[test]
fn transform_default_is_identity() {
    let t = Transform::new();
    assert_eq!(t.position, Vec3::ZERO);
    assert_eq!(t.rotation, Quat::IDENTITY);
    assert_eq!(t.scale, Vec3::ONE);
}

#[test]
fn transform_dirty_flag_tracks_writers() {
    let mut t = Transform::new();

    // Fresh transforms start dirty.
    assert!(t.take_dirty());
    assert!(!t.is_dirty());
    assert!(!t.take_dirty());

    t.mark_dirty();
    assert!(t.is_dirty());
    assert!(t.take_dirty());
}

#[test]
fn transform_compose_round_trips_trs() {
    let rotation = Quat::from_rotation_y(FRAC_PI_2);
    let t = trs(Vec3::new(1.0, 0.0, -1.0), rotation, Vec3::splat(2.0));

    let (scale, r, position) = t.compose().to_scale_rotation_translation();
    assert!(vec3_approx(position, Vec3::new(1.0, 0.0, -1.0)));
    assert!(vec3_approx(scale, Vec3::splat(2.0)));
    assert!(quat_approx(r, rotation));
}

// ============================================================================
// Skeleton
// ============================================================================

#[test]
fn skeleton_hierarchy_and_lookup() {
    let mut skel = Skeleton::new("guard");
    let root = skel.add_bone("Bip01", None, Transform::new());
    let spine = skel.add_bone("Bip01 Spine", Some(root), Transform::new());
    let shadow = skel.add_bone("Bip01", Some(spine), Transform::new());

    assert_eq!(skel.bone_count(), 3);
    assert_eq!(skel.roots(), &[root]);
    assert_eq!(skel.bone(spine).unwrap().parent(), Some(root));
    assert_eq!(skel.bone(root).unwrap().children(), &[spine]);

    // First registration wins the name.
    assert_eq!(skel.find_bone("Bip01"), Some(root));
    assert_ne!(skel.find_bone("Bip01"), Some(shadow));
    assert!(skel.has_bone("Bip01 Spine"));
    assert!(!skel.has_bone("Bip01 Tail"));
}

#[test]
fn derived_matrix_composes_parents() {
    let mut skel = Skeleton::new("arm");
    let root = skel.add_bone(
        "root",
        None,
        trs(Vec3::new(1.0, 0.0, 0.0), Quat::from_rotation_z(FRAC_PI_2), Vec3::ONE),
    );
    let child = skel.add_bone("child", Some(root), at(Vec3::new(0.0, 2.0, 0.0)));

    let (_, _, position) = skel.derived_matrix(child).to_scale_rotation_translation();
    assert!(vec3_approx(position, Vec3::new(-1.0, 0.0, 0.0)), "got {position}");
}

#[test]
fn set_derived_solves_local_transform() {
    let mut skel = Skeleton::new("arm");
    let root = skel.add_bone("root", None, at(Vec3::new(0.0, 0.0, 1.0)));
    let child = skel.add_bone("child", Some(root), Transform::new());

    let rotation = Quat::from_rotation_x(FRAC_PI_2);
    skel.set_derived(child, rotation, Vec3::new(3.0, 0.0, 1.0));

    let bone = skel.bone(child).unwrap();
    assert!(vec3_approx(bone.transform.position, Vec3::new(3.0, 0.0, 0.0)));
    assert!(quat_approx(bone.transform.rotation, rotation));
}

#[test]
fn bones_reset_to_binding_pose() {
    let mut skel = Skeleton::new("s");
    let bone = skel.add_bone("b", None, at(Vec3::new(0.0, 1.0, 0.0)));

    let b = skel.bone_mut(bone).unwrap();
    b.transform.position = Vec3::splat(9.0);
    b.reset_to_initial_state();
    assert!(vec3_approx(b.transform.position, Vec3::new(0.0, 1.0, 0.0)));

    b.transform.position = Vec3::splat(4.0);
    b.set_initial_state();
    b.transform.position = Vec3::ZERO;
    b.reset_to_initial_state();
    assert!(vec3_approx(b.transform.position, Vec3::splat(4.0)));
}

#[test]
fn manual_control_and_pose_dirty_flags() {
    let mut skel = Skeleton::new("s");
    let a = skel.add_bone("a", None, Transform::new());
    let b = skel.add_bone("b", Some(a), Transform::new());

    skel.set_manually_controlled(true);
    assert!(skel.iter().all(|(_, bone)| bone.is_manually_controlled()));
    assert!(skel.bone(b).unwrap().is_manually_controlled());

    assert!(!skel.is_pose_dirty());
    skel.notify_dirty();
    assert!(skel.take_pose_dirty());
    assert!(!skel.is_pose_dirty());
    assert_eq!(skel.dirty_bones().count(), 0);

    skel.bone_mut(b).unwrap().reset_to_initial_state();
    assert_eq!(skel.dirty_bones().collect::<Vec<_>>(), vec![b]);
    skel.take_pose_dirty();
    assert_eq!(skel.dirty_bones().count(), 0);
}

// ============================================================================
// Skeleton instance sync
// ============================================================================

#[test]
fn skeleton_instance_copies_matching_bones() {
    let spine_rotation = Quat::from_rotation_y(FRAC_PI_2);

    let mut src = Skeleton::new("src");
    let src_root = src.add_bone("Bip01", None, at(Vec3::new(0.0, 0.0, 1.0)));
    src.add_bone(
        "Spine",
        Some(src_root),
        trs(Vec3::new(0.0, 1.0, 0.0), spine_rotation, Vec3::splat(2.0)),
    );

    let mut dst = Skeleton::new("dst");
    let dst_root = dst.add_bone("Bip01", None, at(Vec3::splat(5.0)));
    let dst_spine = dst.add_bone("Spine", Some(dst_root), Transform::new());
    let dst_tail = dst.add_bone("Tail", Some(dst_spine), at(Vec3::new(0.0, 0.0, -1.0)));
    dst.bone_mut(dst_tail).unwrap().transform.position = Vec3::splat(9.0);

    update_skeleton_instance(&src, &mut dst);

    // Roots copy the local transform.
    let root = dst.bone(dst_root).unwrap();
    assert!(vec3_approx(root.transform.position, Vec3::new(0.0, 0.0, 1.0)));

    // Children match the source's model-space pose, with unit scale.
    let spine = dst.bone(dst_spine).unwrap();
    assert!(vec3_approx(spine.transform.position, Vec3::new(0.0, 1.0, 0.0)));
    assert!(quat_approx(spine.transform.rotation, spine_rotation));
    assert!(vec3_approx(spine.transform.scale, Vec3::ONE));

    // Unmatched bones go back to their binding pose.
    let tail = dst.bone(dst_tail).unwrap();
    assert!(vec3_approx(tail.transform.position, Vec3::new(0.0, 0.0, -1.0)));

    assert!(dst.is_pose_dirty());
}

#[test]
fn skeleton_instance_root_in_source_copies_local() {
    let mut src = Skeleton::new("src");
    src.add_bone("Hand", None, at(Vec3::new(2.0, 0.0, 0.0)));

    let mut dst = Skeleton::new("dst");
    let arm = dst.add_bone("Arm", None, at(Vec3::new(0.0, 7.0, 0.0)));
    let hand = dst.add_bone("Hand", Some(arm), Transform::new());

    update_skeleton_instance(&src, &mut dst);

    let hand = dst.bone(hand).unwrap();
    assert!(vec3_approx(hand.transform.position, Vec3::new(2.0, 0.0, 0.0)));
}

// ============================================================================
// Render properties
// ============================================================================

fn object_list() -> ObjectList {
    ObjectList {
        entities: vec![Entity::new(
            "body",
            vec![
                SubEntity {
                    alpha_mode: AlphaMode::Opaque,
                    ..Default::default()
                },
                SubEntity {
                    alpha_mode: AlphaMode::Blend,
                    ..Default::default()
                },
                SubEntity {
                    alpha_mode: AlphaMode::Mask(0.5),
                    ..Default::default()
                },
            ],
        )],
        particles: vec![ParticleSystem::new("torch flame")],
        ..Default::default()
    }
}

#[test]
fn render_properties_bucket_by_transparency() {
    let mut objects = object_list();
    set_render_properties(&mut objects, 0x4, 10, 20);

    let body = &objects.entities[0];
    assert_eq!(body.visibility_flags, 0x4);
    let queues: Vec<u8> = body.sub_entities.iter().map(|s| s.render_queue).collect();
    assert_eq!(queues, [10, 20, 10]);

    let flame = &objects.particles[0];
    assert_eq!(flame.visibility_flags, 0x4);
    assert_eq!(flame.render_queue, 20);
}

#[test]
fn zero_visibility_flags_leave_flags_alone() {
    let mut objects = object_list();
    objects.entities[0].visibility_flags = 0x1;
    objects.particles[0].visibility_flags = 0x2;

    set_render_properties(&mut objects, 0, 3, 4);

    assert_eq!(objects.entities[0].visibility_flags, 0x1);
    assert_eq!(objects.particles[0].visibility_flags, 0x2);
    assert_eq!(objects.entities[0].sub_entities[1].render_queue, 4);
    assert_eq!(objects.particles[0].render_queue, 4);
}

#[test]
fn animation_applies_render_properties_to_object_root() {
    let mut assets = MemoryAssets::new();
    let list = object_list();
    assets.add_model(
        "meshes/torch.nif",
        ModelPrototype {
            entities: list.entities,
            particles: list.particles,
            ..Default::default()
        },
    );

    let mut anim = Animation::new(ActorRef(1), Box::new(NullSoundManager));
    anim.set_render_properties(0x8, 1, 2);
    anim.set_object_root(&assets, "meshes/torch.nif", false);
    anim.set_render_properties(0x8, 1, 2);

    let objects = &anim.object_root().unwrap().objects;
    assert_eq!(objects.entities[0].visibility_flags, 0x8);
    assert_eq!(objects.entities[0].sub_entities[1].render_queue, 2);
    assert_eq!(objects.particles[0].render_queue, 2);
}

// ============================================================================
// MemoryAssets
// ============================================================================

fn guard_prototype() -> ModelPrototype {
    let mut skel = Skeleton::new("guard");
    skel.add_bone("Bip01", None, Transform::new());

    ModelPrototype {
        skeleton: Some(skel),
        entities: object_list().entities,
        particles: Vec::new(),
        curves: vec![
            BoneCurves::new("Bip01")
                .with_translation(KeyframeTrack::linear(&[(0.0, Vec3::ZERO)]).unwrap()),
            BoneCurves::new("Missing")
                .with_translation(KeyframeTrack::linear(&[(0.0, Vec3::ZERO)]).unwrap()),
        ],
    }
}

#[test]
fn memory_assets_instantiate_models() {
    let mut assets = MemoryAssets::new();
    assets.add_model("guard.nif", guard_prototype());
    assert!(assets.has_model("guard.nif"));
    assert!(!assets.has_keyframes("guard.nif"));

    let full = assets.create_objects("guard.nif", false).unwrap();
    assert!(full.skeleton.is_some());
    assert_eq!(full.entities.len(), 1);
    // Curves naming unknown bones are dropped.
    assert_eq!(full.controllers.len(), 1);

    let base = assets.create_objects("guard.nif", true).unwrap();
    assert!(base.skeleton.is_some());
    assert!(base.entities.is_empty());
    assert!(base.controllers.is_empty());

    assert!(assets.create_objects("rat.nif", false).is_none());
}

#[test]
fn missing_model_yields_empty_object_root() {
    let assets = MemoryAssets::new();
    let mut anim = Animation::new(ActorRef(1), Box::new(NullSoundManager));
    anim.set_object_root(&assets, "nothing.nif", false);

    let root = anim.object_root().unwrap();
    assert!(root.objects.is_empty());
    assert!(anim.skeleton().is_none());
}
