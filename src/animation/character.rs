//! Character animation
//!
//! [`Animation`] owns everything needed to play keyframed actions on one
//! character: the object root produced by the asset loader, the registry of
//! attached [`AnimationSource`]s and the fixed array of playback layers.
//!
//! Once per frame the caller runs [`Animation::advance`]. It moves every
//! active layer's clock, fires the markers crossed on the way, extracts the
//! root bone's motion into a world displacement and resamples the bone
//! controllers:
//!
//! ```rust,ignore
//! let mut anim = Animation::new(actor, Box::new(NullSoundManager));
//! anim.set_object_root(&assets, "meshes/guard.nif", false);
//! anim.add_anim_source(&assets, "meshes/xbase_anim.kf");
//! anim.set_accumulation(Vec3::new(1.0, 1.0, 0.0));
//!
//! if anim.play("walkforward", "start", "stop", 0.0, usize::MAX) {
//!     anim.set_speed(desired_speed);
//! }
//! let displacement = anim.advance(dt);
//! ```
//!
//! # Root motion
//!
//! The first controller of the first attached source names the
//! non-accumulating root bone. While layer 0 plays, its translation (masked
//! by the accumulation mask) is reported as displacement, and the object
//! root's insert transform is moved back by the same amount so the skeleton
//! does not drift away from the character's world position.

use glam::Vec3;
use log::{debug, trace, warn};
use smallvec::SmallVec;

use crate::animation::controller::TimeSource;
use crate::animation::events::{ActorRef, SoundManager};
use crate::animation::layer::{AnimationLayer, LayerInfo, MAX_LAYERS};
use crate::animation::source::{AnimationSource, SourceId};
use crate::animation::text_keys::{KeyId, TextKeyKind, classify};
use crate::animation::velocity::calc_anim_velocity;
use crate::assets::AssetLoader;
use crate::errors::{MotionError, Result};
use crate::scene::{self, BoneHandle, ObjectList, Skeleton, Transform};
use crate::settings::AnimationSettings;

/// Instantiated model plus the node it is attached under.
#[derive(Debug, Clone, Default)]
pub struct ObjectRoot {
    /// Node the model hangs from. Doubles as the accumulation root.
    pub insert: Transform,
    /// Skeleton, renderables and object-level controllers of the model.
    pub objects: ObjectList,
}

/// Layered animation playback for one character.
pub struct Animation {
    actor: ActorRef,
    sounds: Box<dyn SoundManager>,
    settings: AnimationSettings,

    object_root: Option<ObjectRoot>,
    sources: Vec<AnimationSource>,
    layers: [AnimationLayer; MAX_LAYERS],

    // === Root motion ===
    /// Set once the insert node has been designated the accumulation root.
    has_accum_root: bool,
    non_accum_root: Option<BoneHandle>,
    /// Controller of layer 0's source that targets the non-accumulating root.
    non_accum_ctrl: Option<(SourceId, usize)>,
    accumulate: Vec3,
    last_position: Vec3,

    // === Speed ===
    anim_velocity: f32,
    speed_multiplier: f32,
}

impl std::fmt::Debug for Animation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Animation")
            .field("actor", &self.actor)
            .field("sources", &self.sources.len())
            .field("layers", &self.layers)
            .field("non_accum_root", &self.non_accum_root)
            .field("accumulate", &self.accumulate)
            .field("last_position", &self.last_position)
            .field("anim_velocity", &self.anim_velocity)
            .field("speed_multiplier", &self.speed_multiplier)
            .finish_non_exhaustive()
    }
}

impl Animation {
    #[must_use]
    pub fn new(actor: ActorRef, sounds: Box<dyn SoundManager>) -> Self {
        Self::with_settings(actor, sounds, AnimationSettings::default())
    }

    #[must_use]
    pub fn with_settings(
        actor: ActorRef,
        sounds: Box<dyn SoundManager>,
        settings: AnimationSettings,
    ) -> Self {
        Self {
            actor,
            sounds,
            settings,
            object_root: None,
            sources: Vec::new(),
            layers: Default::default(),
            has_accum_root: false,
            non_accum_root: None,
            non_accum_ctrl: None,
            accumulate: Vec3::ZERO,
            last_position: Vec3::ZERO,
            anim_velocity: 0.0,
            speed_multiplier: 1.0,
        }
    }

    // ========================================================================
    // Object root
    // ========================================================================

    /// Instantiates `model` as this character's object root.
    ///
    /// Bones are flagged as manually controlled and object controllers that
    /// have no clock yet are bound to layer 0. A model the loader does not
    /// know yields an empty object list.
    ///
    /// # Panics
    ///
    /// If the character already has an object root.
    pub fn set_object_root(&mut self, assets: &dyn AssetLoader, model: &str, base_only: bool) {
        assert!(self.object_root.is_none(), "Object already has a root!");

        let mut objects = assets.create_objects(model, base_only).unwrap_or_else(|| {
            debug!("{}", MotionError::AssetNotFound(model.to_string()));
            ObjectList::default()
        });

        if let Some(skeleton) = objects.skeleton.as_mut() {
            skeleton.set_manually_controlled(true);
        }
        for controller in &mut objects.controllers {
            if !controller.is_bound() {
                controller.bind(TimeSource::Layer(0));
            }
        }

        self.object_root = Some(ObjectRoot {
            insert: Transform::new(),
            objects,
        });
    }

    /// Visibility flags and draw queues for every renderable of the object
    /// root. No-op without an object root.
    pub fn set_render_properties(&mut self, visibility_flags: u32, solid_queue: u8, transparent_queue: u8) {
        if let Some(root) = self.object_root.as_mut() {
            scene::set_render_properties(&mut root.objects, visibility_flags, solid_queue, transparent_queue);
        }
    }

    /// Rebinds the actor handle passed to event sinks.
    pub fn update_ptr(&mut self, actor: ActorRef) {
        self.actor = actor;
    }

    // ========================================================================
    // Source registry
    // ========================================================================

    /// Attaches the keyframe asset `model`. Later sources take priority when
    /// several define the same action.
    ///
    /// Returns false, leaving everything untouched, when there is no skeleton
    /// or the asset is missing, has no markers or has no controllers.
    ///
    /// # Panics
    ///
    /// If no object root has been set.
    pub fn add_anim_source(&mut self, assets: &dyn AssetLoader, model: &str) -> bool {
        assert!(self.object_root.is_some(), "Object is missing a root!");

        match self.try_add_anim_source(assets, model) {
            Ok(()) => true,
            Err(err) => {
                debug!("Animation source '{model}' rejected: {err}");
                false
            }
        }
    }

    fn try_add_anim_source(&mut self, assets: &dyn AssetLoader, model: &str) -> Result<()> {
        let skeleton = self.skeleton().ok_or(MotionError::NoSkeleton)?;
        let set = assets
            .create_kf_controllers(skeleton, model)
            .ok_or_else(|| MotionError::AssetNotFound(model.to_string()))?;
        let mut source = AnimationSource::new(model, set.text_keys, set.controllers)?;

        for (i, controller) in source.controllers_mut().iter_mut().enumerate() {
            if i == 0 && !self.has_accum_root {
                self.has_accum_root = true;
                self.non_accum_root = Some(controller.target());
            }
            controller.bind(TimeSource::Layer(0));
        }

        self.sources.push(source);
        Ok(())
    }

    /// Drops every source and stops all layers. Root-motion state starts over
    /// with the next attached source.
    pub fn clear_anim_sources(&mut self) {
        for layer in &mut self.layers {
            layer.clear();
        }
        self.non_accum_ctrl = None;
        self.anim_velocity = 0.0;

        self.last_position = Vec3::ZERO;
        self.has_accum_root = false;
        self.non_accum_root = None;

        self.sources.clear();
    }

    /// Whether any attached source has markers for `group`.
    #[must_use]
    pub fn has_animation(&self, group: &str) -> bool {
        self.sources.iter().any(|s| s.has_group(group))
    }

    /// Bone named `name` in the bound skeleton.
    #[must_use]
    pub fn find_node(&self, name: &str) -> Option<BoneHandle> {
        self.skeleton()?.find_bone(name)
    }

    // ========================================================================
    // Playback control
    // ========================================================================

    /// Plays `group` on layer 0. See [`play_layer`](Self::play_layer).
    pub fn play(&mut self, group: &str, start: &str, stop: &str, start_point: f32, loops: usize) -> bool {
        self.play_layer(0, group, start, stop, start_point, loops)
    }

    /// Plays the `start`..`stop` span of `group` on `layer`, beginning at
    /// `start_point` (fraction of the span) and restarting `loops` times.
    ///
    /// Sources are searched newest first. `"loop start"` falls back to
    /// `"start"` when a timeline has no explicit loop start. On layer 0 the
    /// remaining sources sharing the root bone are probed for the action's
    /// root velocity; the return value tells whether the action moves the
    /// character.
    pub fn play_layer(
        &mut self,
        layer: usize,
        group: &str,
        start: &str,
        stop: &str,
        start_point: f32,
        loops: usize,
    ) -> bool {
        if layer >= MAX_LAYERS {
            debug!("{}", MotionError::InvalidLayer(layer));
            return false;
        }
        if self.skeleton().is_none() {
            return false;
        }

        self.layers[layer].clear();
        if group.is_empty() {
            return false;
        }

        let mut moving = false;
        let mut found = false;

        for source_id in (0..self.sources.len()).rev() {
            let source = &self.sources[source_id];
            let non_accum_ctrl = if layer == 0 {
                self.non_accum_root.and_then(|root| source.find_controller(root))
            } else {
                None
            };

            if !found {
                if let Err(err) =
                    self.layers[layer].reset(source.text_keys(), group, start, stop, start_point)
                {
                    debug!("{}: {err}", source.name());
                    continue;
                }
                self.layers[layer].bind(group, source_id, loops);

                if layer == 0 {
                    self.non_accum_ctrl = non_accum_ctrl.map(|ctrl| (source_id, ctrl));
                    self.anim_velocity = 0.0;
                    self.rebaseline();
                }

                found = true;
                if self.accumulate == Vec3::ZERO {
                    break;
                }
            }

            let Some(ctrl) = non_accum_ctrl else {
                break;
            };

            let source = &self.sources[source_id];
            self.anim_velocity = calc_anim_velocity(
                source.text_keys(),
                &source.controllers()[ctrl],
                self.accumulate,
                group,
            );
            if self.anim_velocity > self.settings.moving_velocity_threshold {
                moving = self.non_accum_ctrl == Some((source_id, ctrl));
                break;
            }
        }

        if !found {
            warn!("{}", MotionError::ActionNotFound(group.to_string()));
        }

        moving
    }

    /// Stops `layer`. Idempotent; out-of-range layers are ignored.
    pub fn disable(&mut self, layer: usize) {
        if let Some(layer) = self.layers.get_mut(layer)
            && layer.is_active()
        {
            layer.clear();
        }
    }

    /// Progress of `layer`, `None` when it is inactive or out of range.
    #[must_use]
    pub fn info(&self, layer: usize) -> Option<LayerInfo> {
        let layer = self.layers.get(layer)?;
        let source = self.sources.get(layer.source?)?;
        layer.info(source.text_keys())
    }

    /// Per-axis root-motion mask (components 0 or 1).
    pub fn set_accumulation(&mut self, accumulate: Vec3) {
        self.accumulate = accumulate;
    }

    /// Time-scales a moving action so its root travels at `speed`. Actions
    /// whose estimated velocity is at or below the moving threshold keep
    /// their natural speed.
    pub fn set_speed(&mut self, speed: f32) {
        self.speed_multiplier = 1.0;
        if self.anim_velocity > self.settings.moving_velocity_threshold && speed > 0.0 {
            self.speed_multiplier = speed / self.anim_velocity;
        }
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// Advances every active layer by `duration` seconds (times the speed
    /// multiplier) and returns the world displacement extracted from the root
    /// bone.
    ///
    /// Every marker crossed is dispatched in timeline order, and root motion
    /// is sampled at each of them so fast markers do not lose distance.
    pub fn advance(&mut self, duration: f32) -> Vec3 {
        let mut movement = Vec3::ZERO;
        let duration = duration * self.speed_multiplier;

        for index in 0..MAX_LAYERS {
            let Some(source_id) = self.layers[index].source else {
                continue;
            };
            let drives_root = index == 0 && self.non_accum_ctrl.is_some();

            let mut time_passed = duration;
            while self.layers[index].playing {
                let layer = &self.layers[index];
                let target_time = layer.time + time_passed;
                let next_key = layer.next_key;
                let next_time = self.sources[source_id].text_keys().time(next_key);

                if next_time > target_time {
                    self.layers[index].time = target_time;
                    if drives_root {
                        self.update_position(&mut movement);
                    }
                    break;
                }

                let layer = &mut self.layers[index];
                layer.next_key += 1;
                layer.time = next_time;
                layer.playing = next_key != layer.stop_key;
                if drives_root {
                    self.update_position(&mut movement);
                }
                time_passed = target_time - self.layers[index].time;

                if !self.handle_text_key(index, next_key) {
                    break;
                }
            }
        }

        self.resample();
        movement
    }

    /// Reacts to marker `key` crossed by layer `index`. Returns false when
    /// the layer must not process more markers this frame.
    fn handle_text_key(&mut self, index: usize, key: KeyId) -> bool {
        let Some(source_id) = self.layers[index].source else {
            return true;
        };
        let Some(text_key) = self.sources[source_id].text_keys().get(key) else {
            return true;
        };
        let key_time = text_key.time;

        match classify(&text_key.label, &self.layers[index].group) {
            TextKeyKind::Sound(id) => {
                self.sounds.play_sound_3d(
                    self.actor,
                    &id,
                    self.settings.sound_volume,
                    self.settings.sound_pitch,
                );
                true
            }
            // TODO: resolve the generator entry for the actor's creature type.
            TextKeyKind::SoundGen(_) | TextKeyKind::Foreign => true,
            TextKeyKind::LoopStart => {
                self.layers[index].loop_start_key = key;
                true
            }
            TextKeyKind::LoopStop => {
                // A restart that lands at or past this marker would spin
                // forever within one frame.
                !(self.do_loop(index) && self.layers[index].time >= key_time)
            }
            TextKeyKind::Unknown => {
                warn!("Unhandled animation textkey: {}", text_key.label);
                true
            }
        }
    }

    fn do_loop(&mut self, index: usize) -> bool {
        let Some(source_id) = self.layers[index].source else {
            return false;
        };
        if !self.layers[index].do_loop(self.sources[source_id].text_keys()) {
            return false;
        }

        trace!(
            "Layer {index} looping '{}', {} loops left",
            self.layers[index].group,
            self.layers[index].loop_count
        );
        if index == 0 {
            self.rebaseline();
        }
        true
    }

    /// Moves the root-motion baseline to layer 0's current time.
    fn rebaseline(&mut self) {
        if let Some(translation) = self.root_translation() {
            self.last_position = translation * self.accumulate;
        }
    }

    /// Non-accumulating root translation at layer 0's time.
    fn root_translation(&self) -> Option<Vec3> {
        let (source_id, ctrl) = self.non_accum_ctrl?;
        let controller = self.sources.get(source_id)?.controllers().get(ctrl)?;
        Some(controller.sample_translation(self.layers[0].time))
    }

    fn update_position(&mut self, movement: &mut Vec3) {
        let Some(translation) = self.root_translation() else {
            return;
        };

        let diff = (translation - self.last_position) * self.accumulate;
        *movement += diff;
        self.last_position += diff;

        if self.has_accum_root
            && let Some(root) = self.object_root.as_mut()
        {
            root.insert.position = -self.last_position;
            root.insert.mark_dirty();
        }
    }

    /// Samples every bound controller at its layer's time and flags the
    /// skeleton pose dirty.
    fn resample(&mut self) {
        let Some(root) = self.object_root.as_mut() else {
            return;
        };
        let Some(skeleton) = root.objects.skeleton.as_mut() else {
            return;
        };

        for controller in &mut root.objects.controllers {
            if let Some(time) = controller.time_source().resolve(&self.layers) {
                controller.apply(time, skeleton);
            }
        }

        let active: SmallVec<[SourceId; MAX_LAYERS]> =
            self.layers.iter().filter_map(|l| l.source).collect();
        for source_id in active {
            let Some(source) = self.sources.get_mut(source_id) else {
                continue;
            };
            for controller in source.controllers_mut() {
                if let Some(time) = controller.time_source().resolve(&self.layers) {
                    controller.apply(time, skeleton);
                }
            }
        }

        skeleton.notify_dirty();
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn actor(&self) -> ActorRef {
        self.actor
    }

    #[inline]
    #[must_use]
    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub fn object_root(&self) -> Option<&ObjectRoot> {
        self.object_root.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn skeleton(&self) -> Option<&Skeleton> {
        self.object_root.as_ref()?.objects.skeleton.as_ref()
    }

    #[inline]
    pub fn skeleton_mut(&mut self) -> Option<&mut Skeleton> {
        self.object_root.as_mut()?.objects.skeleton.as_mut()
    }

    /// Node compensating root motion, once a source has designated it.
    #[must_use]
    pub fn accumulation_root(&self) -> Option<&Transform> {
        if !self.has_accum_root {
            return None;
        }
        self.object_root.as_ref().map(|root| &root.insert)
    }

    #[inline]
    #[must_use]
    pub fn non_accum_root(&self) -> Option<BoneHandle> {
        self.non_accum_root
    }

    #[inline]
    #[must_use]
    pub fn sources(&self) -> &[AnimationSource] {
        &self.sources
    }

    #[inline]
    #[must_use]
    pub fn layers(&self) -> &[AnimationLayer; MAX_LAYERS] {
        &self.layers
    }

    #[inline]
    #[must_use]
    pub fn layer(&self, index: usize) -> Option<&AnimationLayer> {
        self.layers.get(index)
    }

    #[inline]
    #[must_use]
    pub fn accumulation(&self) -> Vec3 {
        self.accumulate
    }

    /// Root velocity measured by the last `play` on layer 0.
    #[inline]
    #[must_use]
    pub fn velocity(&self) -> f32 {
        self.anim_velocity
    }

    #[inline]
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.speed_multiplier
    }

    /// Compensated root offset accumulated so far.
    #[inline]
    #[must_use]
    pub fn last_position(&self) -> Vec3 {
        self.last_position
    }
}
