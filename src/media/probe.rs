use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use log::debug;

use crate::config::ToolsConfig;
use crate::error::{Result, StudioError};
use crate::utils::tools::{ExternalTool, describe_failure};

/// Получение метаданных загруженного видео
#[async_trait]
pub trait MediaProbe: Send + Sync {
    /// Длительность видео в секундах
    async fn video_duration(&self, path: &Path) -> Result<f64>;
}

/// Реализация через ffprobe
pub struct FfprobeProbe {
    tool: ExternalTool,
}

impl FfprobeProbe {
    pub fn new(tools: &ToolsConfig) -> Result<Self> {
        Ok(Self {
            tool: ExternalTool::resolve("ffprobe", tools.ffprobe_path.as_deref())?,
        })
    }
}

#[async_trait]
impl MediaProbe for FfprobeProbe {
    async fn video_duration(&self, path: &Path) -> Result<f64> {
        let mut args: Vec<&OsStr> = [
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "default=noprint_wrappers=1:nokey=1",
        ]
        .into_iter()
        .map(OsStr::new)
        .collect();
        args.push(path.as_os_str());

        let output = self
            .tool
            .output(args, None)
            .await?;

        if !output.status.success() {
            return Err(StudioError::Probe(describe_failure("ffprobe", &output)));
        }

        let duration = parse_duration(&String::from_utf8_lossy(&output.stdout))?;
        debug!("Probed {}: {:.2}s", path.display(), duration);
        Ok(duration)
    }
}

/// Разобрать длительность из вывода ffprobe
pub fn parse_duration(raw: &str) -> Result<f64> {
    let value = raw.trim();
    let duration = value
        .parse::<f64>()
        .map_err(|_| StudioError::Probe(format!("Failed to parse duration: {:?}", value)))?;
    if !duration.is_finite() || duration < 0.0 {
        return Err(StudioError::Probe(format!("Invalid duration: {}", duration)));
    }
    Ok(duration)
}
