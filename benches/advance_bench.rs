//! Tick driver benchmarks
//!
//! Measures `Animation::advance` on a looping locomotion cycle with a dense
//! marker track, which exercises marker dispatch, root-motion sampling and
//! controller resampling every frame.

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};
use glam::{Quat, Vec3};

use myth_locomotion::animation::tracks::KeyframeTrack;
use myth_locomotion::assets::{BoneCurves, KeyframePrototype, MemoryAssets, ModelPrototype};
use myth_locomotion::scene::{Skeleton, Transform};
use myth_locomotion::{ActorRef, Animation, NullSoundManager, TextKeyMap};

const BONES: usize = 40;
const CYCLE: f32 = 2.0;

fn build_assets() -> MemoryAssets {
    let mut skel = Skeleton::new("bench");
    let mut parent = skel.add_bone("Bip01 NonAccum", None, Transform::new());
    for i in 0..BONES {
        parent = skel.add_bone(&format!("Bone{i}"), Some(parent), Transform::new());
    }

    let keys: Vec<(f32, Vec3)> = (0..=20)
        .map(|i| {
            let t = i as f32 * CYCLE / 20.0;
            (t, Vec3::new(t * 2.0, (t * 3.0).sin() * 0.1, 0.0))
        })
        .collect();
    let rotations: Vec<(f32, Quat)> = (0..=20)
        .map(|i| {
            let t = i as f32 * CYCLE / 20.0;
            (t, Quat::from_rotation_x(t.sin() * 0.5))
        })
        .collect();

    let mut curves = vec![BoneCurves::new("Bip01 NonAccum").with_translation(
        KeyframeTrack::linear(&keys).expect("root track"),
    )];
    for i in 0..BONES {
        curves.push(
            BoneCurves::new(&format!("Bone{i}"))
                .with_rotation(KeyframeTrack::linear(&rotations).expect("bone track")),
        );
    }

    let mut markers = vec![
        (0.0, "walk: start".to_string()),
        (0.0, "walk: loop start".to_string()),
    ];
    for i in 1..8 {
        markers.push((i as f32 * CYCLE / 8.0, format!("sound: Foot{}", i % 2)));
    }
    markers.push((CYCLE, "walk: loop stop".to_string()));
    markers.push((CYCLE, "walk: stop".to_string()));

    let mut assets = MemoryAssets::new();
    assets.add_model(
        "bench.nif",
        ModelPrototype {
            skeleton: Some(skel),
            ..Default::default()
        },
    );
    assets.add_keyframes(
        "bench.kf",
        KeyframePrototype {
            text_keys: TextKeyMap::new(markers),
            curves,
        },
    );
    assets
}

fn bench_advance(c: &mut Criterion) {
    let assets = build_assets();

    let mut anim = Animation::new(ActorRef(1), Box::new(NullSoundManager));
    anim.set_object_root(&assets, "bench.nif", false);
    anim.add_anim_source(&assets, "bench.kf");
    anim.set_accumulation(Vec3::new(1.0, 1.0, 0.0));
    anim.play("walk", "loop start", "loop stop", 0.0, usize::MAX);

    c.bench_function("advance_60hz_walk_cycle", |b| {
        b.iter(|| black_box(anim.advance(black_box(1.0 / 60.0))));
    });

    c.bench_function("play_and_probe_velocity", |b| {
        b.iter(|| black_box(anim.play("walk", "start", "stop", black_box(0.25), 0)));
    });
}

criterion_group!(benches, bench_advance);
criterion_main!(benches);
