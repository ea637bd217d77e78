//! Движок речи на основе espeak-ng
//!
//! Текст передаётся через stdin, WAV-поток читается из stdout кусками и
//! сразу отправляется в приёмник записи.

use std::process::Stdio;

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;

use super::{SpeechEngine, SpeechRequest, SystemVoice};
use crate::config::ToolsConfig;
use crate::error::{Result, StudioError};
use crate::media::recorder::ChunkSink;
use crate::utils::tools::{ExternalTool, describe_failure};

const DEFAULT_WPM: f32 = 175.0;
const DEFAULT_PITCH: f32 = 50.0;
const READ_CHUNK: usize = 8192;

// Pty Language Age/Gender VoiceName File Other Languages
static VOICE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*\d+\s+(\S+)\s+\S*/([MF-])\s+(\S+)").expect("valid voice list pattern")
});

pub struct EspeakEngine {
    tool: ExternalTool,
}

impl EspeakEngine {
    pub fn new(tools: &ToolsConfig) -> Result<Self> {
        Ok(Self {
            tool: ExternalTool::resolve("espeak-ng", tools.espeak_path.as_deref())?,
        })
    }
}

/// Разобрать вывод `espeak-ng --voices`
pub fn parse_voice_list(raw: &str) -> Vec<SystemVoice> {
    raw.lines()
        .filter_map(|line| VOICE_LINE.captures(line))
        .map(|caps| {
            let language = caps[1].to_string();
            let gender = match &caps[2] {
                "M" => " (male)",
                "F" => " (female)",
                _ => "",
            };
            SystemVoice {
                id: language.clone(),
                name: format!("{}{}", caps[3].replace('_', " "), gender),
                language,
            }
        })
        .collect()
}

/// Аргументы скорости и тона для espeak-ng
pub fn prosody_args(rate: f32, pitch: f32) -> (String, String) {
    let wpm = (DEFAULT_WPM * rate).round().clamp(80.0, 450.0) as u32;
    let pitch = (DEFAULT_PITCH * pitch).round().clamp(0.0, 99.0) as u32;
    (wpm.to_string(), pitch.to_string())
}

#[async_trait]
impl SpeechEngine for EspeakEngine {
    async fn voices(&self) -> Result<Vec<SystemVoice>> {
        let output = self.tool.output(["--voices"], None).await?;
        if !output.status.success() {
            return Err(StudioError::Speech(describe_failure("espeak-ng", &output)));
        }
        let voices = parse_voice_list(&String::from_utf8_lossy(&output.stdout));
        debug!("espeak-ng reports {} voices", voices.len());
        Ok(voices)
    }

    async fn speak(&self, request: &SpeechRequest, sink: ChunkSink) -> Result<()> {
        let (wpm, pitch) = prosody_args(request.rate, request.pitch);

        let mut command = Command::new(&self.tool.path);
        if let Some(voice) = &request.voice {
            command.args(["-v", voice.id.as_str()]);
        }
        command
            .args(["-s", wpm.as_str(), "-p", pitch.as_str(), "--stdout", "--stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("Speaking {} chars (wpm {}, pitch {})", request.text.chars().count(), wpm, pitch);
        let mut child = command.spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| StudioError::Speech("espeak-ng stdin unavailable".to_string()))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| StudioError::Speech("espeak-ng stdout unavailable".to_string()))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| StudioError::Speech("espeak-ng stderr unavailable".to_string()))?;

        let text = request.text.clone().into_bytes();
        let writer = tokio::spawn(async move {
            stdin.write_all(&text).await?;
            stdin.shutdown().await
        });
        let stderr_reader = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut buf = vec![0u8; READ_CHUNK];
        loop {
            let n = stdout.read(&mut buf).await?;
            if n == 0 {
                break;
            }
            sink.send(Bytes::copy_from_slice(&buf[..n]))
                .await
                .map_err(|_| StudioError::Speech("recording sink closed".to_string()))?;
        }

        let status = child.wait().await?;
        let stderr = stderr_reader.await.unwrap_or_default();

        if !status.success() {
            return Err(StudioError::Speech(format!(
                "espeak-ng failed with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        writer.await.map_err(std::io::Error::other)??;
        Ok(())
    }
}
