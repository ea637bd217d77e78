//! Панель композиции видео
//!
//! Медиатека загруженных изображений и видео, таймлайн из выбранных
//! элементов и рендер превью. Рендер не кодирует видео: после имитации
//! прогресса рисуется только первый элемент таймлайна с подписью, и
//! результат сохраняется как одно JPEG-изображение.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, error, info, warn};

use super::PanelState;
use crate::config::VideoPanelConfig;
use crate::error::{Result, StudioError};
use crate::media::frame::{FrameRenderer, FrameSpec, JPEG_MIME};
use crate::media::probe::MediaProbe;
use crate::media::recorder::AudioClip;
use crate::models::media::{self, DEFAULT_TRANSITION, generate_media_id};
use crate::models::{EditorMode, MediaItem, MediaKind, SelectedFile, TimelineItem, Transition};
use crate::notification::UserNotifier;
use crate::progress::{ProcessStep, ProgressTracker};
use crate::utils::temp::{TempFileManager, save_download};

pub const EMPTY_LIBRARY_MESSAGE: &str = "Please add at least one image.";
pub const EMPTY_TIMELINE_MESSAGE: &str = "Add media to the timeline before rendering.";
pub const RENDER_FAILED_MESSAGE: &str = "Failed to render video.";

/// Готовое превью
#[derive(Debug, Clone)]
pub struct RenderedPreview {
    pub bytes: Vec<u8>,
    pub mime: &'static str,
    pub url: PathBuf,
}

impl RenderedPreview {
    pub fn extension(&self) -> &'static str {
        if self.mime == JPEG_MIME { "jpg" } else { "png" }
    }
}

pub struct VideoPanel {
    config: VideoPanelConfig,
    probe: Arc<dyn MediaProbe>,
    renderer: Arc<dyn FrameRenderer>,
    notifier: Arc<dyn UserNotifier>,
    tracker: Arc<ProgressTracker>,
    artifacts: TempFileManager,
    state: PanelState,

    mode: EditorMode,
    library: Vec<MediaItem>,
    timeline: Vec<TimelineItem>,
    transition: &'static Transition,
    audio_duration: f64,
    preview: Option<RenderedPreview>,
}

impl VideoPanel {
    pub fn new(
        config: VideoPanelConfig,
        probe: Arc<dyn MediaProbe>,
        renderer: Arc<dyn FrameRenderer>,
        notifier: Arc<dyn UserNotifier>,
    ) -> Result<Self> {
        config.validate()?;
        let transition = media::find_transition(DEFAULT_TRANSITION)
            .ok_or_else(|| StudioError::Configuration("default transition missing".to_string()))?;
        Ok(Self {
            config,
            probe,
            renderer,
            notifier,
            tracker: Arc::new(ProgressTracker::new(ProcessStep::VideoRender)),
            artifacts: TempFileManager::new()?,
            state: PanelState::new(),
            mode: EditorMode::default(),
            library: Vec::new(),
            timeline: Vec::new(),
            transition,
            audio_duration: 0.0,
            preview: None,
        })
    }

    pub fn mode(&self) -> EditorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: EditorMode) {
        self.mode = mode;
    }

    pub fn library(&self) -> &[MediaItem] {
        &self.library
    }

    pub fn timeline(&self) -> &[TimelineItem] {
        &self.timeline
    }

    pub fn find_media(&self, id: &str) -> Option<&MediaItem> {
        self.library.iter().find(|m| m.id == id)
    }

    /// Суммарная длительность таймлайна
    pub fn total_duration(&self) -> f64 {
        self.timeline.iter().map(|item| item.duration).sum()
    }

    /// Длительность последнего сгенерированного аудио (0, если неизвестна)
    pub fn audio_duration(&self) -> f64 {
        self.audio_duration
    }

    /// Узнать длительность аудио из переданного фрагмента
    pub fn set_audio_clip(&mut self, clip: &AudioClip) {
        match clip.duration_secs() {
            Ok(duration) => {
                debug!("Audio duration: {:.2}s", duration);
                self.audio_duration = duration;
            }
            Err(e) => {
                warn!("Could not read audio duration: {}", e);
                self.audio_duration = 0.0;
            }
        }
    }

    pub fn transition(&self) -> &'static Transition {
        self.transition
    }

    pub fn select_transition(&mut self, id: &str) -> Result<()> {
        self.transition = media::find_transition(id)
            .ok_or_else(|| StudioError::Validation(format!("Unknown transition: {}", id)))?;
        Ok(())
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

    pub fn can_render(&self) -> bool {
        !self.is_busy() && !self.timeline.is_empty()
    }

    pub fn preview(&self) -> Option<&RenderedPreview> {
        self.preview.as_ref()
    }

    /// Загрузить файлы в медиатеку, возвращает идентификаторы добавленных
    ///
    /// Файлы обрабатываются по очереди, в порядке выбора. Всё, что не
    /// изображение и не видео, молча пропускается.
    pub async fn upload(&mut self, files: impl IntoIterator<Item = SelectedFile>) -> Vec<String> {
        let mut added = Vec::new();

        for file in files {
            let Some(kind) = MediaKind::from_mime(&file.mime) else {
                debug!("Skipping {} ({:?})", file.name, file.mime);
                continue;
            };

            let duration = match kind {
                MediaKind::Image => self.config.image_duration_secs,
                MediaKind::Video => match self.probe.video_duration(&file.path).await {
                    Ok(duration) => duration,
                    Err(e) => {
                        warn!("Failed to probe {}: {}, using default duration", file.name, e);
                        self.config.image_duration_secs
                    }
                },
            };

            let id = self.unique_media_id();
            let item = MediaItem {
                id: id.clone(),
                kind,
                source: file.path.clone(),
                thumbnail: Some(file.path.clone()),
                duration: Some(duration),
                file,
            };
            info!("Added {:?} {} ({:.1}s)", item.kind, item.file.name, duration);
            self.library.push(item);
            added.push(id);
        }

        added
    }

    fn unique_media_id(&self) -> String {
        loop {
            let id = generate_media_id();
            if self.find_media(&id).is_none() {
                return id;
            }
        }
    }

    /// Удалить элемент медиатеки; таймлайн не затрагивается
    pub fn remove_from_library(&mut self, id: &str) -> bool {
        let before = self.library.len();
        self.library.retain(|m| m.id != id);
        before != self.library.len()
    }

    /// Удалить элементы таймлайна с этим идентификатором; медиатека не затрагивается
    pub fn remove_from_timeline(&mut self, id: &str) -> usize {
        let before = self.timeline.len();
        self.timeline.retain(|item| item.id != id);
        before - self.timeline.len()
    }

    /// Простой режим: первый элемент медиатеки на всю длину аудио
    pub fn apply_simple_mode(&mut self) -> Result<()> {
        if self.mode != EditorMode::Simple {
            return Err(StudioError::Validation("Not in simple mode".to_string()));
        }
        let Some(first) = self.library.first() else {
            self.notifier.alert(EMPTY_LIBRARY_MESSAGE);
            return Err(StudioError::Validation(EMPTY_LIBRARY_MESSAGE.to_string()));
        };

        let duration = if self.audio_duration > 0.0 {
            self.audio_duration
        } else {
            self.config.fallback_duration_secs
        };
        self.timeline = vec![TimelineItem::from_media(first, 0.0, duration)];
        Ok(())
    }

    /// Расширенный режим: добавить элемент медиатеки в конец таймлайна
    pub fn add_to_timeline(&mut self, media_id: &str) -> Result<&TimelineItem> {
        if self.mode != EditorMode::Advanced {
            return Err(StudioError::Validation("Not in advanced mode".to_string()));
        }
        let media = self
            .find_media(media_id)
            .ok_or_else(|| StudioError::Validation(format!("Unknown media: {}", media_id)))?;

        let start_time = self.timeline.last().map_or(0.0, TimelineItem::end_time);
        let duration = media
            .duration
            .filter(|d| *d > 0.0)
            .unwrap_or(self.config.image_duration_secs);
        let item = TimelineItem::from_media(media, start_time, duration);

        self.timeline.push(item);
        Ok(&self.timeline[self.timeline.len() - 1])
    }

    /// Изменить длительность элемента; последующие элементы сдвигаются
    pub fn set_item_duration(&mut self, index: usize, duration: f64) -> Result<()> {
        if !duration.is_finite() || duration <= 0.0 {
            return Err(StudioError::Validation(format!("Invalid duration: {}", duration)));
        }
        let Some(item) = self.timeline.get_mut(index) else {
            return Err(StudioError::Validation(format!("No timeline item at {}", index)));
        };
        item.duration = duration;

        for i in index + 1..self.timeline.len() {
            self.timeline[i].start_time = self.timeline[i - 1].end_time();
        }
        Ok(())
    }

    /// Отрендерить превью
    pub async fn render(&mut self) -> Result<RenderedPreview> {
        if self.timeline.is_empty() {
            self.notifier.alert(EMPTY_TIMELINE_MESSAGE);
            return Err(StudioError::Validation(EMPTY_TIMELINE_MESSAGE.to_string()));
        }

        self.state.set_busy(true);
        self.tracker.reset();
        info!(
            "Rendering timeline of {} items ({:.1}s, transition {})",
            self.timeline.len(),
            self.total_duration(),
            self.transition.id
        );

        let mime = self.renderer.mime();
        let result = self.render_frame().await.and_then(|bytes| {
            let preview = RenderedPreview {
                url: PathBuf::new(),
                bytes,
                mime,
            };
            let url = self.artifacts.store("video", preview.extension(), &preview.bytes)?;
            Ok(RenderedPreview { url, ..preview })
        });

        match result {
            Ok(preview) => {
                self.preview = Some(preview.clone());
                self.tracker.complete();
                tokio::time::sleep(self.config.settle_delay()).await;
                self.state.set_busy(false);
                Ok(preview)
            }
            Err(e) => {
                error!("Error rendering video: {}", e);
                self.notifier.alert(RENDER_FAILED_MESSAGE);
                self.state.set_busy(false);
                Err(StudioError::Operation(RENDER_FAILED_MESSAGE.to_string()))
            }
        }
    }

    async fn render_frame(&self) -> Result<Vec<u8>> {
        let frames = self.config.render_frames;
        for i in 0..frames {
            let percent = (i as f64 / frames as f64 * 100.0).round() as u8;
            self.tracker.set(percent, None);
            tokio::time::sleep(self.config.frame_delay()).await;
        }

        let first = self
            .timeline
            .first()
            .ok_or_else(|| StudioError::Render("timeline is empty".to_string()))?;
        let spec = FrameSpec::from_config(&self.config);
        self.renderer.render_still(&first.source, first.kind, &spec).await
    }

    /// Сохранить превью в `dir`; `None`, если скачивать нечего
    pub fn download(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let Some(preview) = &self.preview else {
            return Ok(None);
        };
        let path = save_download(dir, "video", preview.extension(), &preview.bytes)?;
        Ok(Some(path))
    }
}
