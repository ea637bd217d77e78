//! Панель генерации аудио
//!
//! Собирает текст и параметры голоса, запускает движок речи, параллельно
//! записывает поток и отдаёт готовый фрагмент для воспроизведения и
//! скачивания.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info};

use super::PanelState;
use crate::config::AudioPanelConfig;
use crate::error::{Result, StudioError};
use crate::media::recorder::{AudioClip, RecordingSession};
use crate::models::voice::{self, Emotion, Voice};
use crate::notification::UserNotifier;
use crate::progress::{ProcessStep, ProgressTicker, ProgressTracker};
use crate::tts::{SpeechEngine, SpeechRequest, match_system_voice, pitch_multiplier};
use crate::utils::temp::{TempFileManager, save_download};

pub const EMPTY_TEXT_MESSAGE: &str = "Please enter some text to convert.";
pub const GENERATION_FAILED_MESSAGE: &str = "Failed to generate audio. Please try again.";

/// Результат последней генерации
#[derive(Debug, Clone)]
pub struct GeneratedAudio {
    pub clip: AudioClip,
    /// Файл, пригодный для воспроизведения
    pub url: PathBuf,
}

pub struct AudioPanel {
    config: AudioPanelConfig,
    engine: Arc<dyn SpeechEngine>,
    notifier: Arc<dyn UserNotifier>,
    tracker: Arc<ProgressTracker>,
    artifacts: TempFileManager,
    state: PanelState,

    text: String,
    voice: &'static Voice,
    speed: f32,
    pitch: i32,
    emotion: &'static Emotion,
    generated: Option<GeneratedAudio>,
}

impl AudioPanel {
    pub fn new(
        config: AudioPanelConfig,
        engine: Arc<dyn SpeechEngine>,
        notifier: Arc<dyn UserNotifier>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            engine,
            notifier,
            tracker: Arc::new(ProgressTracker::new(ProcessStep::AudioGeneration)),
            artifacts: TempFileManager::new()?,
            state: PanelState::new(),
            text: String::new(),
            voice: voice::default_voice(),
            speed: 1.0,
            pitch: 0,
            emotion: voice::default_emotion(),
            generated: None,
        })
    }

    /// Установить текст; всё сверх лимита символов отбрасывается
    pub fn set_text(&mut self, text: &str) {
        self.text = match text.char_indices().nth(self.config.max_text_chars) {
            Some((cut, _)) => text[..cut].to_string(),
            None => text.to_string(),
        };
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn select_voice(&mut self, id: &str) -> Result<()> {
        self.voice = voice::find_voice(id)
            .ok_or_else(|| StudioError::Validation(format!("Unknown voice: {}", id)))?;
        Ok(())
    }

    pub fn voice(&self) -> &'static Voice {
        self.voice
    }

    /// Установить множитель скорости с ограничением диапазона
    pub fn set_speed(&mut self, speed: f32) {
        self.speed = if speed.is_nan() {
            1.0
        } else {
            speed.clamp(self.config.min_speed, self.config.max_speed)
        };
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Установить смещение тона с ограничением диапазона
    pub fn set_pitch(&mut self, pitch: i32) {
        self.pitch = pitch.clamp(self.config.min_pitch, self.config.max_pitch);
    }

    pub fn pitch(&self) -> i32 {
        self.pitch
    }

    pub fn select_emotion(&mut self, id: &str) -> Result<()> {
        self.emotion = voice::find_emotion(id)
            .ok_or_else(|| StudioError::Validation(format!("Unknown emotion: {}", id)))?;
        Ok(())
    }

    pub fn emotion(&self) -> &'static Emotion {
        self.emotion
    }

    pub fn state(&self) -> &PanelState {
        &self.state
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn progress(&self) -> u8 {
        self.tracker.percent()
    }

    pub fn tracker(&self) -> &Arc<ProgressTracker> {
        &self.tracker
    }

    /// Доступна ли кнопка генерации
    pub fn can_generate(&self) -> bool {
        !self.is_busy() && !self.text.trim().is_empty()
    }

    pub fn generated(&self) -> Option<&GeneratedAudio> {
        self.generated.as_ref()
    }

    /// Путь для воспроизведения последнего результата
    pub fn playable_url(&self) -> Option<&Path> {
        self.generated.as_ref().map(|g| g.url.as_path())
    }

    /// Подпись кнопки скачивания, совпадающая с реальным форматом файла
    pub fn download_label(&self) -> Option<String> {
        self.generated
            .as_ref()
            .map(|g| format!("Download {}", g.clip.format_label()))
    }

    /// Сгенерировать аудио
    ///
    /// Пустой текст отклоняется без обращения к движку. Любая ошибка после
    /// старта сообщается пользователю общим сообщением, панель возвращается
    /// в Idle сразу, без паузы.
    pub async fn generate(&mut self) -> Result<AudioClip> {
        if self.text.trim().is_empty() {
            self.notifier.alert(EMPTY_TEXT_MESSAGE);
            return Err(StudioError::Validation(EMPTY_TEXT_MESSAGE.to_string()));
        }

        self.state.set_busy(true);
        self.tracker.reset();
        let mut ticker = ProgressTicker::spawn(
            self.tracker.clone(),
            self.config.progress_interval(),
            self.config.progress_step,
            self.config.progress_cap,
        );

        let result = self.synthesize().await;
        ticker.stop();

        let stored = result.and_then(|clip| {
            let url = self.artifacts.store("audio", clip.extension(), clip.bytes())?;
            Ok(GeneratedAudio { clip, url })
        });

        match stored {
            Ok(generated) => {
                info!(
                    "Generated {} bytes of {} audio",
                    generated.clip.len(),
                    generated.clip.mime()
                );
                let clip = generated.clip.clone();
                self.generated = Some(generated);
                self.tracker.complete();
                tokio::time::sleep(self.config.settle_delay()).await;
                self.state.set_busy(false);
                Ok(clip)
            }
            Err(e) => {
                error!("Error generating audio: {}", e);
                self.notifier.alert(GENERATION_FAILED_MESSAGE);
                self.state.set_busy(false);
                Err(StudioError::Operation(GENERATION_FAILED_MESSAGE.to_string()))
            }
        }
    }

    async fn synthesize(&self) -> Result<AudioClip> {
        let voices = self.engine.voices().await?;
        let system_voice = match_system_voice(self.voice, &voices);
        debug!(
            "Preset {} mapped to {:?}; emotion {} is not applied",
            self.voice.id,
            system_voice.as_ref().map(|v| v.name.as_str()),
            self.emotion.id
        );

        let request = SpeechRequest {
            text: self.text.clone(),
            voice: system_voice,
            rate: self.speed,
            pitch: pitch_multiplier(self.pitch),
        };

        let session = RecordingSession::start(self.engine.output_mime());
        self.engine.speak(&request, session.sink()).await?;

        // Хвост потока успевает дойти до записи
        tokio::time::sleep(self.config.stop_delay()).await;
        let clip = session.stop().await?;

        if clip.is_empty() {
            return Err(StudioError::Speech("engine produced no audio".to_string()));
        }
        Ok(clip)
    }

    /// Сохранить последний результат в `dir`; `None`, если скачивать нечего
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(generated) = &self.generated else {
            return Ok(None);
        };
        let path = save_download(dir, "audio", generated.clip.extension(), generated.clip.bytes())?;
        Ok(Some(path))
    }
}
