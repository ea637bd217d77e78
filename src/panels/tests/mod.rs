use std::collections::VecDeque;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio_test::{assert_err, assert_ok};

use super::audio::{EMPTY_TEXT_MESSAGE, GENERATION_FAILED_MESSAGE};
use super::video::{EMPTY_LIBRARY_MESSAGE, EMPTY_TIMELINE_MESSAGE, RENDER_FAILED_MESSAGE};
use super::*;
use crate::config::{AudioPanelConfig, VideoPanelConfig};
use crate::error::{Result, StudioError};
use crate::media::frame::{FrameRenderer, FrameSpec};
use crate::media::probe::MediaProbe;
use crate::media::recorder::{AudioClip, ChunkSink, WAV_MIME};
use crate::models::{EditorMode, MediaKind, SelectedFile};
use crate::notification::MemoryNotifier;
use crate::tts::{SpeechEngine, SpeechRequest, SystemVoice};

pub(crate) fn wav(samples: usize, sample_rate: u32) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for _ in 0..samples {
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

/// Задерживает двойника внутри вызова, пока тест не откроет его
#[derive(Default)]
pub(crate) struct Gate {
    entered: Notify,
    release: Notify,
}

impl Gate {
    async fn pass(&self) {
        self.entered.notify_one();
        self.release.notified().await;
    }

    pub(crate) async fn wait_entered(&self) {
        self.entered.notified().await;
    }

    pub(crate) fn open(&self) {
        self.release.notify_one();
    }
}

pub(crate) struct ScriptedEngine {
    voices: Vec<SystemVoice>,
    audio: Vec<u8>,
    fail: bool,
    gate: Option<Arc<Gate>>,
    requests: Mutex<Vec<SpeechRequest>>,
    calls: AtomicUsize,
}

impl ScriptedEngine {
    pub(crate) fn new(audio: Vec<u8>) -> Self {
        Self {
            voices: vec![
                SystemVoice {
                    id: "f".to_string(),
                    name: "Test Female".to_string(),
                    language: "en".to_string(),
                },
                SystemVoice {
                    id: "m".to_string(),
                    name: "Test Male".to_string(),
                    language: "en".to_string(),
                },
            ],
            audio,
            fail: false,
            gate: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }

    fn gated(audio: Vec<u8>, gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(audio)
        }
    }
}

#[async_trait]
impl SpeechEngine for ScriptedEngine {
    async fn voices(&self) -> Result<Vec<SystemVoice>> {
        Ok(self.voices.clone())
    }

    async fn speak(&self, request: &SpeechRequest, sink: ChunkSink) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        if self.fail {
            return Err(StudioError::Speech("no audio device".to_string()));
        }
        for chunk in self.audio.chunks(512) {
            sink.send(Bytes::copy_from_slice(chunk))
                .await
                .map_err(|_| StudioError::Speech("sink closed".to_string()))?;
        }
        Ok(())
    }
}

pub(crate) struct QueueProbe {
    durations: Mutex<VecDeque<Result<f64>>>,
}

impl QueueProbe {
    pub(crate) fn new(durations: Vec<Result<f64>>) -> Self {
        Self {
            durations: Mutex::new(durations.into()),
        }
    }
}

#[async_trait]
impl MediaProbe for QueueProbe {
    async fn video_duration(&self, _path: &Path) -> Result<f64> {
        self.durations
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(StudioError::Probe("no metadata".to_string())))
    }
}

#[derive(Default)]
pub(crate) struct StubRenderer {
    fail: bool,
    gate: Option<Arc<Gate>>,
    calls: Mutex<Vec<(PathBuf, MediaKind, FrameSpec)>>,
}

#[async_trait]
impl FrameRenderer for StubRenderer {
    async fn render_still(&self, source: &Path, kind: MediaKind, spec: &FrameSpec) -> Result<Vec<u8>> {
        self.calls.lock().push((source.to_path_buf(), kind, spec.clone()));
        if let Some(gate) = &self.gate {
            gate.pass().await;
        }
        if self.fail {
            return Err(StudioError::Render("decoder error".to_string()));
        }
        Ok(vec![0xFF, 0xD8, 0xFF, 0xD9])
    }
}

pub(crate) fn instant_audio_config() -> AudioPanelConfig {
    AudioPanelConfig {
        progress_interval_ms: 0,
        stop_delay_ms: 0,
        settle_ms: 0,
        ..AudioPanelConfig::default()
    }
}

pub(crate) fn instant_video_config() -> VideoPanelConfig {
    VideoPanelConfig {
        render_frames: 4,
        frame_delay_ms: 0,
        settle_ms: 0,
        ..VideoPanelConfig::default()
    }
}

fn audio_panel(engine: Arc<ScriptedEngine>) -> (AudioPanel, MemoryNotifier) {
    let notifier = MemoryNotifier::new();
    let panel = AudioPanel::new(instant_audio_config(), engine, Arc::new(notifier.clone())).unwrap();
    (panel, notifier)
}

fn video_panel(probe: QueueProbe, renderer: Arc<StubRenderer>) -> (VideoPanel, MemoryNotifier) {
    let notifier = MemoryNotifier::new();
    let panel = VideoPanel::new(
        instant_video_config(),
        Arc::new(probe),
        renderer,
        Arc::new(notifier.clone()),
    )
    .unwrap();
    (panel, notifier)
}

// ---- Audio panel ----

#[tokio::test]
async fn test_generate_refuses_blank_text() {
    let engine = Arc::new(ScriptedEngine::new(wav(800, 8000)));
    let (mut panel, notifier) = audio_panel(engine.clone());

    for text in ["", "   \n\t "] {
        panel.set_text(text);
        assert!(!panel.can_generate());
        let err = assert_err!(panel.generate().await);
        assert!(err.is_validation());
        assert!(!panel.is_busy());
    }

    assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    assert_eq!(notifier.messages(), vec![EMPTY_TEXT_MESSAGE, EMPTY_TEXT_MESSAGE]);
}

#[test]
fn test_text_truncated_by_characters() {
    let engine = Arc::new(ScriptedEngine::new(Vec::new()));
    let notifier = MemoryNotifier::new();
    let mut panel = AudioPanel::new(AudioPanelConfig::default(), engine, Arc::new(notifier)).unwrap();

    panel.set_text(&"é".repeat(100_005));
    assert_eq!(panel.char_count(), 100_000);

    panel.set_text("short");
    assert_eq!(panel.text(), "short");
}

#[test]
fn test_speed_and_pitch_clamped() {
    let (mut panel, _) = audio_panel(Arc::new(ScriptedEngine::new(Vec::new())));

    panel.set_speed(3.5);
    assert_eq!(panel.speed(), 2.0);
    panel.set_speed(0.1);
    assert_eq!(panel.speed(), 0.5);
    panel.set_speed(f32::NAN);
    assert_eq!(panel.speed(), 1.0);
    panel.set_speed(1.3);
    assert_eq!(panel.speed(), 1.3);

    panel.set_pitch(42);
    assert_eq!(panel.pitch(), 10);
    panel.set_pitch(-42);
    assert_eq!(panel.pitch(), -10);
}

#[test]
fn test_unknown_voice_and_emotion_rejected() {
    let (mut panel, _) = audio_panel(Arc::new(ScriptedEngine::new(Vec::new())));
    assert!(panel.select_voice("robot").unwrap_err().is_validation());
    assert!(panel.select_emotion("bored").unwrap_err().is_validation());
    assert_eq!(panel.voice().id, "male-deep");
    assert_eq!(panel.emotion().id, "neutral");
}

#[tokio::test]
async fn test_generate_records_audio() {
    let audio = wav(8000, 8000);
    let engine = Arc::new(ScriptedEngine::new(audio.clone()));
    let (mut panel, notifier) = audio_panel(engine.clone());

    panel.set_text("Hello studio");
    assert_ok!(panel.select_voice("female-dramatic"));
    assert_ok!(panel.select_emotion("epic"));
    panel.set_speed(1.5);
    panel.set_pitch(5);

    let clip = assert_ok!(panel.generate().await);
    assert_eq!(clip.bytes(), audio.as_slice());
    assert_eq!(clip.mime(), WAV_MIME);
    assert!(!panel.is_busy());
    assert_eq!(panel.progress(), 100);
    assert!(notifier.messages().is_empty());

    let requests = engine.requests.lock();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].text, "Hello studio");
    assert_eq!(requests[0].voice.as_ref().map(|v| v.id.as_str()), Some("f"));
    assert_eq!(requests[0].rate, 1.5);
    assert!((requests[0].pitch - 1.5).abs() < f32::EPSILON);
    drop(requests);

    let url = panel.playable_url().unwrap().to_path_buf();
    assert_eq!(std::fs::read(&url).unwrap(), audio);
    assert_eq!(panel.download_label().as_deref(), Some("Download WAV"));

    let dir = tempfile::tempdir().unwrap();
    let saved = panel.download(dir.path()).unwrap().unwrap();
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("audio-") && name.ends_with(".wav"));
}

#[tokio::test]
async fn test_generate_failure_resets_busy() {
    let engine = Arc::new(ScriptedEngine::failing());
    let (mut panel, notifier) = audio_panel(engine.clone());
    panel.set_text("anything");

    let err = assert_err!(panel.generate().await);
    assert!(matches!(err, StudioError::Operation(_)));
    assert!(!panel.is_busy());
    assert!(panel.generated().is_none());
    assert_eq!(notifier.messages(), vec![GENERATION_FAILED_MESSAGE]);
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_generate_rejects_silent_engine() {
    let (mut panel, notifier) = audio_panel(Arc::new(ScriptedEngine::new(Vec::new())));
    panel.set_text("silence");

    assert!(matches!(panel.generate().await, Err(StudioError::Operation(_))));
    assert_eq!(notifier.messages(), vec![GENERATION_FAILED_MESSAGE]);
}

#[test]
fn test_inverted_ranges_rejected_at_construction() {
    let inverted = [
        AudioPanelConfig {
            min_speed: 2.0,
            max_speed: 0.5,
            ..AudioPanelConfig::default()
        },
        AudioPanelConfig {
            min_pitch: 10,
            max_pitch: -10,
            ..AudioPanelConfig::default()
        },
    ];
    for config in inverted {
        let engine = Arc::new(ScriptedEngine::new(Vec::new()));
        let err = AudioPanel::new(config, engine, Arc::new(MemoryNotifier::new())).err();
        assert!(matches!(err, Some(StudioError::Configuration(_))));
    }

    let config = VideoPanelConfig {
        image_duration_secs: -1.0,
        ..VideoPanelConfig::default()
    };
    let err = VideoPanel::new(
        config,
        Arc::new(QueueProbe::new(vec![])),
        Arc::new(StubRenderer::default()),
        Arc::new(MemoryNotifier::new()),
    )
    .err();
    assert!(matches!(err, Some(StudioError::Configuration(_))));
}

#[tokio::test(start_paused = true)]
async fn test_generate_busy_while_speaking() {
    let gate = Arc::new(Gate::default());
    let engine = Arc::new(ScriptedEngine::gated(wav(800, 8000), gate.clone()));
    let config = AudioPanelConfig {
        stop_delay_ms: 0,
        settle_ms: 0,
        ..AudioPanelConfig::default()
    };
    let mut panel = AudioPanel::new(config, engine, Arc::new(MemoryNotifier::new())).unwrap();
    panel.set_text("Hold on");

    let mut state = panel.state().subscribe();
    let tracker = panel.tracker().clone();
    let observe = async {
        gate.wait_entered().await;
        assert_eq!(*state.borrow_and_update(), OperationState::Busy);
        // Тикер доходит до потолка и останавливается
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(tracker.percent(), 90);
        gate.open();
    };

    let (result, ()) = tokio::join!(panel.generate(), observe);
    assert_ok!(result);
    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow_and_update(), OperationState::Idle);
    assert_eq!(tracker.percent(), 100);
}

#[test]
fn test_download_without_audio() {
    let (panel, _) = audio_panel(Arc::new(ScriptedEngine::new(Vec::new())));
    let dir = tempfile::tempdir().unwrap();
    assert!(panel.download(dir.path()).unwrap().is_none());
    assert!(panel.download_label().is_none());
}

// ---- Video panel ----

pub(crate) fn image(name: &str) -> SelectedFile {
    SelectedFile::new(format!("/media/{}", name), "image/png")
}

fn video(name: &str) -> SelectedFile {
    SelectedFile::new(format!("/media/{}", name), "video/mp4")
}

#[tokio::test]
async fn test_single_image_simple_mode_fallback() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));

    let ids = panel.upload(vec![image("cover.png")]).await;
    assert_eq!(ids.len(), 1);
    assert_eq!(panel.library().len(), 1);
    assert_eq!(panel.library()[0].duration, Some(5.0));
    assert_eq!(panel.library()[0].kind, MediaKind::Image);
    assert_eq!(panel.library()[0].thumbnail, Some(PathBuf::from("/media/cover.png")));

    assert_ok!(panel.apply_simple_mode());
    assert_eq!(panel.timeline().len(), 1);
    assert_eq!(panel.timeline()[0].start_time, 0.0);
    assert_eq!(panel.timeline()[0].duration, 10.0);
    assert_eq!(panel.total_duration(), 10.0);
}

#[tokio::test]
async fn test_simple_mode_follows_audio_duration() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    panel.upload(vec![image("a.png"), image("b.png")]).await;

    panel.set_audio_clip(&AudioClip::new(wav(24_000, 8000), WAV_MIME));
    assert!((panel.audio_duration() - 3.0).abs() < 1e-9);

    assert_ok!(panel.apply_simple_mode());
    assert_eq!(panel.timeline().len(), 1);
    assert_eq!(panel.timeline()[0].id, panel.library()[0].id);
    assert!((panel.timeline()[0].duration - 3.0).abs() < 1e-9);

    // Повторное применение заменяет таймлайн
    assert_ok!(panel.apply_simple_mode());
    assert_eq!(panel.timeline().len(), 1);
}

#[tokio::test]
async fn test_simple_mode_empty_library() {
    let (mut panel, notifier) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    assert!(panel.apply_simple_mode().unwrap_err().is_validation());
    assert!(panel.timeline().is_empty());
    assert_eq!(notifier.messages(), vec![EMPTY_LIBRARY_MESSAGE]);
}

#[tokio::test]
async fn test_append_lays_out_sequentially() {
    let probe = QueueProbe::new(vec![Ok(3.0), Ok(5.0), Ok(2.0)]);
    let (mut panel, _) = video_panel(probe, Arc::new(StubRenderer::default()));
    let ids = panel.upload(vec![video("a.mp4"), video("b.mp4"), video("c.mp4")]).await;
    panel.set_mode(EditorMode::Advanced);

    for id in &ids {
        assert_ok!(panel.add_to_timeline(id));
    }

    let starts: Vec<f64> = panel.timeline().iter().map(|i| i.start_time).collect();
    assert_eq!(starts, vec![0.0, 3.0, 8.0]);
    assert_eq!(panel.total_duration(), 10.0);
}

#[tokio::test]
async fn test_append_requires_advanced_mode() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    let ids = panel.upload(vec![image("a.png")]).await;

    assert!(panel.add_to_timeline(&ids[0]).unwrap_err().is_validation());
    panel.set_mode(EditorMode::Advanced);
    assert!(panel.add_to_timeline("missing").unwrap_err().is_validation());
    assert!(panel.apply_simple_mode().unwrap_err().is_validation());
    assert!(panel.timeline().is_empty());
}

#[tokio::test]
async fn test_upload_skips_unsupported_and_keeps_order() {
    let probe = QueueProbe::new(vec![Err(StudioError::Probe("corrupt".to_string()))]);
    let (mut panel, _) = video_panel(probe, Arc::new(StubRenderer::default()));

    let files = vec![
        image("one.png"),
        SelectedFile::new("/media/notes.txt", "text/plain"),
        video("broken.mp4"),
        SelectedFile::new("/media/unknown", ""),
        image("two.png"),
    ];
    let ids = panel.upload(files).await;

    assert_eq!(ids.len(), 3);
    let names: Vec<&str> = panel.library().iter().map(|m| m.file.name.as_str()).collect();
    assert_eq!(names, vec!["one.png", "broken.mp4", "two.png"]);
    // Видео без метаданных получает длительность по умолчанию
    assert_eq!(panel.library()[1].duration, Some(5.0));
    assert_eq!(panel.library()[1].kind, MediaKind::Video);
}

#[tokio::test]
async fn test_removals_are_independent() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    let ids = panel.upload(vec![image("a.png"), image("b.png")]).await;
    panel.set_mode(EditorMode::Advanced);
    assert_ok!(panel.add_to_timeline(&ids[0]));
    assert_ok!(panel.add_to_timeline(&ids[1]));

    assert!(panel.remove_from_library(&ids[0]));
    assert_eq!(panel.library().len(), 1);
    assert_eq!(panel.timeline().len(), 2);

    assert_eq!(panel.remove_from_timeline(&ids[1]), 1);
    assert_eq!(panel.timeline().len(), 1);
    assert_eq!(panel.library().len(), 1);
    assert_eq!(panel.library()[0].id, ids[1]);

    assert!(!panel.remove_from_library("missing"));
    assert_eq!(panel.remove_from_timeline("missing"), 0);
}

#[tokio::test]
async fn test_set_item_duration_ripples() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    let ids = panel.upload(vec![image("a.png"), image("b.png"), image("c.png")]).await;
    panel.set_mode(EditorMode::Advanced);
    for id in &ids {
        assert_ok!(panel.add_to_timeline(id));
    }

    assert_ok!(panel.set_item_duration(0, 2.0));
    let starts: Vec<f64> = panel.timeline().iter().map(|i| i.start_time).collect();
    assert_eq!(starts, vec![0.0, 2.0, 7.0]);
    assert_eq!(panel.total_duration(), 12.0);

    assert!(panel.set_item_duration(0, 0.0).unwrap_err().is_validation());
    assert!(panel.set_item_duration(9, 1.0).unwrap_err().is_validation());
}

#[tokio::test]
async fn test_transition_selection() {
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), Arc::new(StubRenderer::default()));
    assert_eq!(panel.transition().id, "fade");
    assert_ok!(panel.select_transition("zoom"));
    assert_eq!(panel.transition().id, "zoom");
    assert!(panel.select_transition("wipe").unwrap_err().is_validation());
    assert_eq!(panel.transition().id, "zoom");
}

#[tokio::test]
async fn test_render_refuses_empty_timeline() {
    let renderer = Arc::new(StubRenderer::default());
    let (mut panel, notifier) = video_panel(QueueProbe::new(vec![]), renderer.clone());

    assert!(!panel.can_render());
    assert!(panel.render().await.unwrap_err().is_validation());
    assert!(!panel.is_busy());
    assert!(renderer.calls.lock().is_empty());
    assert_eq!(notifier.messages(), vec![EMPTY_TIMELINE_MESSAGE]);
}

#[tokio::test]
async fn test_render_draws_first_item_only() {
    let renderer = Arc::new(StubRenderer::default());
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), renderer.clone());
    let ids = panel.upload(vec![image("first.png"), image("second.png")]).await;
    panel.set_mode(EditorMode::Advanced);
    assert_ok!(panel.add_to_timeline(&ids[0]));
    assert_ok!(panel.add_to_timeline(&ids[1]));

    let preview = assert_ok!(panel.render().await);
    assert_eq!(preview.extension(), "jpg");
    assert_eq!(std::fs::read(&preview.url).unwrap(), preview.bytes);
    assert!(!panel.is_busy());
    assert_eq!(panel.progress(), 100);

    let calls = renderer.calls.lock();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, PathBuf::from("/media/first.png"));
    assert_eq!(calls[0].2.width, 1920);
    assert_eq!(calls[0].2.height, 1080);
    assert_eq!(calls[0].2.caption, "Video Preview");
    drop(calls);

    let dir = tempfile::tempdir().unwrap();
    let saved = panel.download(dir.path()).unwrap().unwrap();
    let name = saved.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("video-") && name.ends_with(".jpg"));
}

#[tokio::test]
async fn test_render_failure_resets_busy() {
    let renderer = Arc::new(StubRenderer {
        fail: true,
        ..StubRenderer::default()
    });
    let (mut panel, notifier) = video_panel(QueueProbe::new(vec![]), renderer);
    panel.upload(vec![image("a.png")]).await;
    assert_ok!(panel.apply_simple_mode());

    let err = assert_err!(panel.render().await);
    assert!(matches!(err, StudioError::Operation(_)));
    assert!(!panel.is_busy());
    assert!(panel.preview().is_none());
    assert_eq!(notifier.messages(), vec![RENDER_FAILED_MESSAGE]);
}

#[tokio::test]
async fn test_render_busy_while_drawing() {
    let gate = Arc::new(Gate::default());
    let renderer = Arc::new(StubRenderer {
        gate: Some(gate.clone()),
        ..StubRenderer::default()
    });
    let (mut panel, _) = video_panel(QueueProbe::new(vec![]), renderer);
    panel.upload(vec![image("a.png")]).await;
    assert_ok!(panel.apply_simple_mode());

    let mut state = panel.state().subscribe();
    let tracker = panel.tracker().clone();
    let observe = async {
        gate.wait_entered().await;
        assert_eq!(*state.borrow_and_update(), OperationState::Busy);
        // 4 шага: 0, 25, 50, 75
        assert_eq!(tracker.percent(), 75);
        gate.open();
    };

    let (result, ()) = tokio::join!(panel.render(), observe);
    assert_ok!(result);
    assert!(state.has_changed().unwrap());
    assert_eq!(*state.borrow_and_update(), OperationState::Idle);
    assert_eq!(tracker.percent(), 100);
}

#[test]
fn test_panel_state_transitions() {
    let state = PanelState::new();
    let rx = state.subscribe();
    assert_eq!(state.current(), OperationState::Idle);

    state.set_busy(true);
    assert!(state.is_busy());
    assert_eq!(*rx.borrow(), OperationState::Busy);

    state.set_busy(false);
    assert_eq!(*rx.borrow(), OperationState::Idle);
}
