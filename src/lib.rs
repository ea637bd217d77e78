//! Студия озвучки и слайд-шоу
//!
//! Панель аудио превращает текст в речь и записывает результат, панель
//! видео собирает таймлайн из изображений и видео и рендерит превью.
//! Оболочка переключает вкладки и передаёт длительность аудио в панель видео.

pub mod config;
pub mod error;
pub mod events;
pub mod media;
pub mod models;
pub mod notification;
pub mod panels;
pub mod progress;
pub mod shell;
pub mod tts;
pub mod utils;

pub use config::StudioConfig;
pub use error::{Result, StudioError};
pub use events::{ShellEvent, Tab};
pub use media::recorder::AudioClip;
pub use panels::{AudioPanel, OperationState, RenderedPreview, VideoPanel};
pub use shell::Shell;
