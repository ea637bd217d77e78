//! Модуль для работы с медиа
//!
//! Запись аудио, метаданные загруженных файлов и отрисовка кадра превью.

pub mod frame;
pub mod probe;
pub mod recorder;

pub use frame::{FfmpegFrameRenderer, FrameRenderer, FrameSpec};
pub use probe::{FfprobeProbe, MediaProbe};
pub use recorder::{AudioClip, ChunkSink, RecordingSession, WAV_MIME};
