//! Оболочка студии
//!
//! Две вкладки (аудио и видео). Последний сгенерированный аудиофрагмент
//! передаётся из панели аудио в панель видео, чтобы та знала целевую
//! длительность. Обратного потока данных нет.

use std::sync::Arc;

use log::info;
use tokio::sync::broadcast;

use crate::config::StudioConfig;
use crate::error::Result;
use crate::events::{EventBus, ShellEvent, Tab};
use crate::media::frame::FfmpegFrameRenderer;
use crate::media::probe::FfprobeProbe;
use crate::media::recorder::AudioClip;
use crate::notification::UserNotifier;
use crate::panels::{AudioPanel, RenderedPreview, VideoPanel};
use crate::progress::ProgressInfo;
use crate::tts::EspeakEngine;

const PROGRESS_CAPACITY: usize = 128;

pub struct Shell {
    active_tab: Tab,
    audio: AudioPanel,
    video: VideoPanel,
    audio_clip: Option<AudioClip>,
    events: EventBus,
    progress: broadcast::Sender<ProgressInfo>,
}

impl Shell {
    pub fn new(audio: AudioPanel, video: VideoPanel) -> Self {
        let (progress, _rx) = broadcast::channel(PROGRESS_CAPACITY);
        audio.tracker().publish_to(progress.clone());
        video.tracker().publish_to(progress.clone());
        Self {
            active_tab: Tab::default(),
            audio,
            video,
            audio_clip: None,
            events: EventBus::new(),
            progress,
        }
    }

    /// Собрать оболочку с системными движками (espeak-ng, ffprobe, ffmpeg)
    pub fn with_system_backends(config: &StudioConfig, notifier: Arc<dyn UserNotifier>) -> Result<Self> {
        config.validate()?;
        let engine = Arc::new(EspeakEngine::new(&config.tools)?);
        let probe = Arc::new(FfprobeProbe::new(&config.tools)?);
        let renderer = Arc::new(FfmpegFrameRenderer::new(&config.tools)?);

        let audio = AudioPanel::new(config.audio.clone(), engine, notifier.clone())?;
        let video = VideoPanel::new(config.video.clone(), probe, renderer, notifier)?;
        Ok(Self::new(audio, video))
    }

    pub fn active_tab(&self) -> Tab {
        self.active_tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        if self.active_tab != tab {
            info!("Switched to {:?} tab", tab);
            self.active_tab = tab;
            self.events.emit(ShellEvent::TabChanged { tab });
        }
    }

    pub fn audio(&self) -> &AudioPanel {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut AudioPanel {
        &mut self.audio
    }

    pub fn video(&self) -> &VideoPanel {
        &self.video
    }

    pub fn video_mut(&mut self) -> &mut VideoPanel {
        &mut self.video
    }

    /// Последний сгенерированный аудиофрагмент
    pub fn audio_clip(&self) -> Option<&AudioClip> {
        self.audio_clip.as_ref()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ShellEvent> {
        self.events.subscribe()
    }

    /// Прогресс обеих панелей в одном потоке
    pub fn subscribe_progress(&self) -> broadcast::Receiver<ProgressInfo> {
        self.progress.subscribe()
    }

    /// Сгенерировать аудио и передать результат панели видео
    pub async fn generate_audio(&mut self) -> Result<AudioClip> {
        let clip = self.audio.generate().await?;
        self.video.set_audio_clip(&clip);
        let duration = self.video.audio_duration();
        self.audio_clip = Some(clip.clone());
        self.events.emit(ShellEvent::AudioGenerated {
            bytes: clip.len(),
            duration_secs: (duration > 0.0).then_some(duration),
        });
        Ok(clip)
    }

    /// Отрендерить превью видео
    pub async fn render_video(&mut self) -> Result<RenderedPreview> {
        let preview = self.video.render().await?;
        self.events.emit(ShellEvent::PreviewRendered {
            path: preview.url.clone(),
        });
        Ok(preview)
    }
}
