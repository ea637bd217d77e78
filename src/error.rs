//! Модуль обработки ошибок studio-av
//!
//! Ошибки делятся на два вида: ошибки валидации (операция не запускается)
//! и операционные ошибки (перехватываются на верхнем уровне действия и
//! сворачиваются в одно общее сообщение для пользователя).

use thiserror::Error;

/// Ошибки studio-av
#[derive(Debug, Error)]
pub enum StudioError {
    /// Ошибка валидации входных данных
    #[error("Validation error: {0}")]
    Validation(String),

    /// Общая операционная ошибка, показанная пользователю
    #[error("Operation failed: {0}")]
    Operation(String),

    /// Ошибка ввода-вывода
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Ошибка сериализации/десериализации JSON
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Ошибка разбора WAV
    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    /// Ошибка синтеза речи
    #[error("Speech synthesis error: {0}")]
    Speech(String),

    /// Ошибка получения метаданных медиафайла
    #[error("Media probe error: {0}")]
    Probe(String),

    /// Ошибка отрисовки кадра
    #[error("Frame render error: {0}")]
    Render(String),

    /// Внешняя утилита не найдена
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Ошибка конфигурации
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StudioError {
    /// Ошибка валидации (операция не была запущена)
    pub fn is_validation(&self) -> bool {
        matches!(self, StudioError::Validation(_))
    }
}

/// Тип Result для studio-av
pub type Result<T> = std::result::Result<T, StudioError>;
