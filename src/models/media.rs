use std::path::{Path, PathBuf};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Тип медиафайла в библиотеке
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Классификация по префиксу MIME-типа; прочие типы не поддерживаются
    pub fn from_mime(mime: &str) -> Option<Self> {
        if mime.starts_with("image/") {
            Some(Self::Image)
        } else if mime.starts_with("video/") {
            Some(Self::Video)
        } else {
            None
        }
    }
}

/// Файл, выбранный пользователем
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    /// MIME-тип; пустая строка, если тип неизвестен
    pub mime: String,
}

impl SelectedFile {
    pub fn new(path: impl Into<PathBuf>, mime: impl Into<String>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            path,
            name,
            mime: mime.into(),
        }
    }

    /// Создать с MIME-типом, определённым по расширению
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mime = guess_mime(&path).unwrap_or_default();
        Self::new(path, mime)
    }
}

/// Определить MIME-тип по расширению файла
pub fn guess_mime(path: &Path) -> Option<String> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "ogv" => "video/ogg",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "txt" => "text/plain",
        "pdf" => "application/pdf",
        _ => return None,
    };
    Some(mime.to_string())
}

/// Элемент медиатеки
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaItem {
    pub id: String,
    pub kind: MediaKind,
    /// Источник для отображения
    pub source: PathBuf,
    pub file: SelectedFile,
    /// Длительность в секундах
    pub duration: Option<f64>,
    pub thumbnail: Option<PathBuf>,
}

/// Элемент таймлайна: копия полей медиа плюс время начала и длительность
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub id: String,
    pub kind: MediaKind,
    pub source: PathBuf,
    pub file: SelectedFile,
    pub thumbnail: Option<PathBuf>,
    pub start_time: f64,
    pub duration: f64,
}

impl TimelineItem {
    pub fn from_media(media: &MediaItem, start_time: f64, duration: f64) -> Self {
        Self {
            id: media.id.clone(),
            kind: media.kind,
            source: media.source.clone(),
            file: media.file.clone(),
            thumbnail: media.thumbnail.clone(),
            start_time,
            duration,
        }
    }

    pub fn end_time(&self) -> f64 {
        self.start_time + self.duration
    }
}

/// Переход между элементами (только метка, в рендере не используется)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub id: &'static str,
    pub name: &'static str,
}

pub const TRANSITIONS: &[Transition] = &[
    Transition { id: "none", name: "None" },
    Transition { id: "fade", name: "Fade" },
    Transition { id: "slide", name: "Slide" },
    Transition { id: "zoom", name: "Zoom" },
    Transition { id: "dissolve", name: "Dissolve" },
];

pub const DEFAULT_TRANSITION: &str = "fade";

pub fn find_transition(id: &str) -> Option<&'static Transition> {
    TRANSITIONS.iter().find(|t| t.id == id)
}

/// Режим редактора видео
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Simple,
    Advanced,
}

const ID_CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ID_LEN: usize = 9;

/// Случайный идентификатор из 9 символов base36
pub fn generate_media_id() -> String {
    let mut rng = rand::thread_rng();
    (0..ID_LEN)
        .map(|_| ID_CHARSET[rng.gen_range(0..ID_CHARSET.len())] as char)
        .collect()
}
