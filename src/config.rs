//! Модуль конфигурации studio-av
//!
//! Все константы панелей (лимиты, задержки таймеров, размеры холста) и пути
//! к внешним утилитам собраны здесь. Конфигурация читается из JSON.

use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, StudioError};

/// Настройки панели генерации аудио
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioPanelConfig {
    /// Максимальная длина текста в символах
    pub max_text_chars: usize,
    /// Минимальный множитель скорости
    pub min_speed: f32,
    /// Максимальный множитель скорости
    pub max_speed: f32,
    /// Минимальное смещение тона
    pub min_pitch: i32,
    /// Максимальное смещение тона
    pub max_pitch: i32,
    /// Интервал между шагами имитации прогресса
    pub progress_interval_ms: u64,
    /// Приращение прогресса за один шаг
    pub progress_step: u8,
    /// Потолок имитируемого прогресса до завершения
    pub progress_cap: u8,
    /// Задержка остановки записи после окончания речи
    pub stop_delay_ms: u64,
    /// Пауза перед возвратом в состояние Idle
    pub settle_ms: u64,
}

impl Default for AudioPanelConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 100_000,
            min_speed: 0.5,
            max_speed: 2.0,
            min_pitch: -10,
            max_pitch: 10,
            progress_interval_ms: 200,
            progress_step: 10,
            progress_cap: 90,
            stop_delay_ms: 100,
            settle_ms: 500,
        }
    }
}

impl AudioPanelConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn stop_delay(&self) -> Duration {
        Duration::from_millis(self.stop_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    /// Проверить диапазоны; перевёрнутый диапазон недопустим
    pub fn validate(&self) -> Result<()> {
        if self.max_text_chars == 0 {
            return Err(StudioError::Configuration(
                "max_text_chars must be positive".to_string(),
            ));
        }
        if !(self.min_speed > 0.0 && self.min_speed <= self.max_speed) {
            return Err(StudioError::Configuration(format!(
                "invalid speed range {}..{}",
                self.min_speed, self.max_speed
            )));
        }
        if self.min_pitch > self.max_pitch {
            return Err(StudioError::Configuration(format!(
                "invalid pitch range {}..{}",
                self.min_pitch, self.max_pitch
            )));
        }
        if self.progress_cap > 100 {
            return Err(StudioError::Configuration(
                "progress_cap must not exceed 100".to_string(),
            ));
        }
        Ok(())
    }
}

/// Настройки панели композиции видео
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoPanelConfig {
    /// Длительность изображения по умолчанию (секунды)
    pub image_duration_secs: f64,
    /// Длительность для простого режима, если длительность аудио неизвестна
    pub fallback_duration_secs: f64,
    /// Количество шагов имитации рендера
    pub render_frames: u32,
    /// Задержка одного шага рендера
    pub frame_delay_ms: u64,
    /// Пауза перед возвратом в состояние Idle
    pub settle_ms: u64,
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Подпись поверх кадра
    pub caption: String,
    pub caption_band_height: u32,
    pub caption_font_size: u32,
}

impl Default for VideoPanelConfig {
    fn default() -> Self {
        Self {
            image_duration_secs: 5.0,
            fallback_duration_secs: 10.0,
            render_frames: 100,
            frame_delay_ms: 50,
            settle_ms: 500,
            canvas_width: 1920,
            canvas_height: 1080,
            caption: "Video Preview".to_string(),
            caption_band_height: 100,
            caption_font_size: 48,
        }
    }
}

impl VideoPanelConfig {
    pub fn frame_delay(&self) -> Duration {
        Duration::from_millis(self.frame_delay_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.canvas_width == 0 || self.canvas_height == 0 {
            return Err(StudioError::Configuration(
                "canvas dimensions must be positive".to_string(),
            ));
        }
        // NaN тоже отклоняется
        if !(self.image_duration_secs > 0.0 && self.fallback_duration_secs > 0.0) {
            return Err(StudioError::Configuration(
                "default durations must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Пути к внешним утилитам. `None` означает поиск в PATH.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub espeak_path: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub ffprobe_path: Option<PathBuf>,
}

/// Конфигурация studio-av
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StudioConfig {
    pub audio: AudioPanelConfig,
    pub video: VideoPanelConfig,
    pub tools: ToolsConfig,
    /// Директория для скачиваемых файлов
    pub download_dir: Option<PathBuf>,
}

impl StudioConfig {
    /// Загрузить конфигурацию из JSON файла
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config: StudioConfig = serde_json::from_str(&content)?;
        config.validate()?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Загрузить конфигурацию, если файл существует, иначе взять значения по умолчанию
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::load(p),
            Some(p) => {
                warn!("Config file {} not found, using defaults", p.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Сохранить конфигурацию в JSON файл
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Директория для скачиваний (по умолчанию текущая)
    pub fn download_dir(&self) -> PathBuf {
        self.download_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn validate(&self) -> Result<()> {
        self.audio.validate()?;
        self.video.validate()
    }
}
