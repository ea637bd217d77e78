//! Запись синтезированной речи
//!
//! Движок речи отправляет куски аудиопотока в канал, а сессия записи
//! параллельно собирает их и по остановке склеивает в один `AudioClip`.

use std::io::Cursor;

use bytes::{Bytes, BytesMut};
use log::debug;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::error::{Result, StudioError};

pub const WAV_MIME: &str = "audio/wav";

const CHANNEL_CAPACITY: usize = 64;

/// Приёмник кусков аудиопотока
pub type ChunkSink = mpsc::Sender<Bytes>;

/// Готовый аудиофрагмент
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    data: Bytes,
    mime: String,
}

impl AudioClip {
    pub fn new(data: impl Into<Bytes>, mime: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            mime: mime.into(),
        }
    }

    /// Склеить куски в один фрагмент; для WAV исправляется заголовок
    pub fn from_chunks(chunks: Vec<Bytes>, mime: impl Into<String>) -> Self {
        let mime = mime.into();
        let total: usize = chunks.iter().map(Bytes::len).sum();
        let mut buf = BytesMut::with_capacity(total);
        for chunk in &chunks {
            buf.extend_from_slice(chunk);
        }
        if mime == WAV_MIME && !finalize_wav_header(&mut buf) {
            debug!("Recorded stream has no WAV header to finalize");
        }
        Self {
            data: buf.freeze(),
            mime,
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Расширение файла, соответствующее реальному контейнеру
    pub fn extension(&self) -> &'static str {
        match self.mime.as_str() {
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            "audio/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mpeg" => "mp3",
            _ => "bin",
        }
    }

    /// Подпись формата для кнопки скачивания
    pub fn format_label(&self) -> String {
        self.extension().to_ascii_uppercase()
    }

    /// Длительность в секундах по заголовку WAV
    pub fn duration_secs(&self) -> Result<f64> {
        if self.extension() != "wav" {
            return Err(StudioError::Probe(format!(
                "cannot read duration of {} audio",
                self.mime
            )));
        }
        let reader = hound::WavReader::new(Cursor::new(self.data.as_ref()))?;
        let spec = reader.spec();
        if spec.sample_rate == 0 {
            return Err(StudioError::Probe("WAV sample rate is zero".to_string()));
        }
        Ok(reader.duration() as f64 / spec.sample_rate as f64)
    }
}

/// Переписать размеры RIFF и data по фактической длине буфера
///
/// Потоковые WAV (например, вывод в stdout) содержат в заголовке
/// размеры-заглушки. Возвращает `false`, если буфер не WAV или в нём нет
/// чанка data.
pub fn finalize_wav_header(data: &mut [u8]) -> bool {
    if data.len() < 12 || &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return false;
    }
    let riff_size = u32::try_from(data.len() - 8).unwrap_or(u32::MAX);
    data[4..8].copy_from_slice(&riff_size.to_le_bytes());

    let mut offset = 12usize;
    while offset + 8 <= data.len() {
        let size = u32::from_le_bytes([
            data[offset + 4],
            data[offset + 5],
            data[offset + 6],
            data[offset + 7],
        ]) as usize;

        if &data[offset..offset + 4] == b"data" {
            let actual = u32::try_from(data.len() - offset - 8).unwrap_or(u32::MAX);
            data[offset + 4..offset + 8].copy_from_slice(&actual.to_le_bytes());
            return true;
        }

        // Чанки выравниваются по чётной границе
        offset = match offset
            .checked_add(8)
            .and_then(|o| o.checked_add(size))
            .and_then(|o| o.checked_add(size & 1))
        {
            Some(next) => next,
            None => return false,
        };
    }
    false
}

/// Сессия записи: собирает куски до вызова `stop`
pub struct RecordingSession {
    tx: ChunkSink,
    collector: JoinHandle<Vec<Bytes>>,
    mime: String,
}

impl RecordingSession {
    /// Начать запись
    pub fn start(mime: impl Into<String>) -> Self {
        let (tx, mut rx) = mpsc::channel::<Bytes>(CHANNEL_CAPACITY);
        let collector = tokio::spawn(async move {
            let mut chunks = Vec::new();
            while let Some(chunk) = rx.recv().await {
                if !chunk.is_empty() {
                    chunks.push(chunk);
                }
            }
            chunks
        });

        Self {
            tx,
            collector,
            mime: mime.into(),
        }
    }

    /// Приёмник, в который движок пишет аудио
    pub fn sink(&self) -> ChunkSink {
        self.tx.clone()
    }

    /// Остановить запись и собрать фрагмент
    ///
    /// Все клоны приёмника должны быть к этому моменту освобождены.
    pub async fn stop(self) -> Result<AudioClip> {
        let Self { tx, collector, mime } = self;
        drop(tx);
        let chunks = collector
            .await
            .map_err(|e| StudioError::Speech(format!("recording task failed: {}", e)))?;
        debug!("Recording stopped with {} chunks", chunks.len());
        Ok(AudioClip::from_chunks(chunks, mime))
    }
}
