//! Text keys
//!
//! Timeline markers embedded in a keyframe asset. Labels follow the
//! `"<action>: <phase>"` convention, plus the action-independent
//! `"sound: <id>"` and `"soundgen: <id>"` events.
//!
//! A [`TextKeyMap`] is immutable once built. Layers walk it with plain
//! indices ([`KeyId`]), so a cursor stays valid for as long as the owning
//! source is attached.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Index of a marker inside its [`TextKeyMap`].
pub type KeyId = usize;

pub const SOUND_PREFIX: &str = "sound: ";
pub const SOUNDGEN_PREFIX: &str = "soundgen: ";

/// Separator between an action name and its phase.
const GROUP_SEPARATOR: &str = ": ";

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TextKey {
    pub time: f32,
    pub label: String,
}

impl TextKey {
    #[must_use]
    pub fn new(time: f32, label: impl Into<String>) -> Self {
        Self {
            time,
            label: label.into(),
        }
    }
}

/// Time-ordered marker list of one animation source.
///
/// Several markers may share a time (two actions starting at 0.0, say); they
/// keep the order in which they were authored.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "Vec<TextKey>", into = "Vec<TextKey>"))]
pub struct TextKeyMap {
    keys: Vec<TextKey>,
}

impl TextKeyMap {
    #[must_use]
    pub fn new<S: Into<String>>(keys: impl IntoIterator<Item = (f32, S)>) -> Self {
        Self::from_keys(
            keys.into_iter()
                .map(|(time, label)| TextKey::new(time, label))
                .collect(),
        )
    }

    #[must_use]
    pub fn from_keys(mut keys: Vec<TextKey>) -> Self {
        // `sort_by` is stable.
        keys.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { keys }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: KeyId) -> Option<&TextKey> {
        self.keys.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TextKey> {
        self.keys.iter()
    }

    /// Time of marker `id`. Ids past the end read as `f32::INFINITY`, i.e.
    /// a marker that is never reached.
    #[inline]
    #[must_use]
    pub fn time(&self, id: KeyId) -> f32 {
        self.keys.get(id).map_or(f32::INFINITY, |k| k.time)
    }

    /// First marker at or after `from` whose label is exactly `label`.
    #[must_use]
    pub fn find_from(&self, from: KeyId, label: &str) -> Option<KeyId> {
        self.keys
            .get(from..)?
            .iter()
            .position(|k| k.label == label)
            .map(|offset| from + offset)
    }

    /// First marker in the namespace of `group`, if any.
    #[must_use]
    pub fn find_group_start(&self, group: &str) -> Option<KeyId> {
        self.keys
            .iter()
            .position(|k| phase_of(&k.label, group).is_some())
    }
}

impl From<Vec<TextKey>> for TextKeyMap {
    fn from(keys: Vec<TextKey>) -> Self {
        Self::from_keys(keys)
    }
}

impl From<TextKeyMap> for Vec<TextKey> {
    fn from(map: TextKeyMap) -> Self {
        map.keys
    }
}

impl FromIterator<TextKey> for TextKeyMap {
    fn from_iter<I: IntoIterator<Item = TextKey>>(iter: I) -> Self {
        Self::from_keys(iter.into_iter().collect())
    }
}

/// Builds the `"<group>: <phase>"` label.
#[must_use]
pub fn marker_label(group: &str, phase: &str) -> String {
    format!("{group}{GROUP_SEPARATOR}{phase}")
}

/// Phase part of `label` when it belongs to `group`'s namespace.
#[must_use]
pub fn phase_of<'a>(label: &'a str, group: &str) -> Option<&'a str> {
    label
        .strip_prefix(group)?
        .strip_prefix(GROUP_SEPARATOR)
}

/// What a marker means to a layer playing `group`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextKeyKind {
    /// Play the named sound at the actor.
    Sound(String),
    /// Sound-generator lookup. Not resolved yet; ignored.
    SoundGen(String),
    /// Belongs to another action on the same timeline.
    Foreign,
    /// `start` or `loop start`: a loop restart point.
    LoopStart,
    /// `loop stop` or `stop`.
    LoopStop,
    /// In our namespace with a phase we do not know.
    Unknown,
}

/// Classifies `label` for a layer playing `group`.
///
/// Sound events are checked first and apply to every action.
#[must_use]
pub fn classify(label: &str, group: &str) -> TextKeyKind {
    if let Some(id) = label.strip_prefix(SOUND_PREFIX) {
        return TextKeyKind::Sound(id.to_string());
    }
    if let Some(id) = label.strip_prefix(SOUNDGEN_PREFIX) {
        return TextKeyKind::SoundGen(id.to_string());
    }

    match phase_of(label, group) {
        None => TextKeyKind::Foreign,
        Some("start" | "loop start") => TextKeyKind::LoopStart,
        Some("loop stop" | "stop") => TextKeyKind::LoopStop,
        Some(_) => TextKeyKind::Unknown,
    }
}
