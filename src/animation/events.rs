//! Timeline events
//!
//! `sound: <id>` markers are forwarded to a [`SoundManager`] together with
//! the [`ActorRef`] of the animated character.

/// Opaque handle of the entity an [`Animation`](super::Animation) belongs to.
///
/// The engine never dereferences it; it is only handed back to event sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ActorRef(pub u64);

/// Audio collaborator. Fire-and-forget.
pub trait SoundManager {
    fn play_sound_3d(&mut self, actor: ActorRef, sound_id: &str, volume: f32, pitch: f32);
}

/// Discards every sound request.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSoundManager;

impl SoundManager for NullSoundManager {
    fn play_sound_3d(&mut self, _actor: ActorRef, _sound_id: &str, _volume: f32, _pitch: f32) {}
}
