// TTS engines module
// Contains the speech engine seam and system voice matching

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::media::recorder::{ChunkSink, WAV_MIME};
use crate::models::{Gender, Voice};

pub mod espeak;

pub use espeak::EspeakEngine;

/// Голос, доступный в системном движке речи
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemVoice {
    /// Идентификатор, передаваемый движку
    pub id: String,
    /// Отображаемое имя
    pub name: String,
    pub language: String,
}

/// Запрос на синтез речи
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechRequest {
    pub text: String,
    /// `None` означает голос движка по умолчанию
    pub voice: Option<SystemVoice>,
    /// Множитель скорости (1.0 - обычная)
    pub rate: f32,
    /// Множитель высоты тона (1.0 - обычная)
    pub pitch: f32,
}

/// Trait that all speech engines must implement
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Список голосов движка
    async fn voices(&self) -> Result<Vec<SystemVoice>>;

    /// Произнести текст, отправляя аудиопоток в `sink`
    ///
    /// Завершение future означает окончание речи.
    async fn speak(&self, request: &SpeechRequest, sink: ChunkSink) -> Result<()>;

    /// MIME-тип отправляемого потока
    fn output_mime(&self) -> &'static str {
        WAV_MIME
    }
}

/// Множитель тона для смещения -10..=10
pub fn pitch_multiplier(offset: i32) -> f32 {
    1.0 + offset as f32 / 10.0
}

/// Подобрать системный голос для пресета
///
/// Ищется первое имя, содержащее ключевое слово пола. В отличие от простого
/// поиска подстроки, "male" внутри "female" не считается: иначе мужской
/// пресет мог бы выбрать голос "Female". Если совпадений нет, берётся
/// первый голос.
pub fn match_system_voice(preset: &Voice, voices: &[SystemVoice]) -> Option<SystemVoice> {
    voices
        .iter()
        .find(|v| name_has_gender(&v.name, preset.gender))
        .or_else(|| voices.first())
        .cloned()
}

fn name_has_gender(name: &str, gender: Gender) -> bool {
    let name = name.to_lowercase();
    match gender {
        Gender::Female => name.contains(Gender::Female.keyword()),
        Gender::Male => name
            .match_indices(Gender::Male.keyword())
            .any(|(idx, _)| !name[..idx].ends_with("fe")),
    }
}
