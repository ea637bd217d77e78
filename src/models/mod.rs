// Domain models module
// Contains core data structures used throughout the studio

pub mod media;
pub mod voice;

pub use media::{
    EditorMode, MediaItem, MediaKind, SelectedFile, TimelineItem, Transition, TRANSITIONS,
};
pub use voice::{Emotion, Gender, Voice, EMOTIONS, VOICES};
