//! Отрисовка кадра превью
//!
//! Кадр растягивается на холст фиксированного размера, снизу рисуется
//! полупрозрачная полоса с подписью, результат кодируется в JPEG.

use std::ffi::OsStr;
use std::path::Path;

use async_trait::async_trait;
use log::debug;

use crate::config::{ToolsConfig, VideoPanelConfig};
use crate::error::{Result, StudioError};
use crate::models::MediaKind;
use crate::utils::tools::{ExternalTool, describe_failure};

pub const JPEG_MIME: &str = "image/jpeg";

/// Параметры холста
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSpec {
    pub width: u32,
    pub height: u32,
    pub caption: String,
    pub band_height: u32,
    pub font_size: u32,
}

impl FrameSpec {
    pub fn from_config(config: &VideoPanelConfig) -> Self {
        Self {
            width: config.canvas_width,
            height: config.canvas_height,
            caption: config.caption.clone(),
            band_height: config.caption_band_height.min(config.canvas_height),
            font_size: config.caption_font_size,
        }
    }

    /// Цепочка фильтров ffmpeg для этого холста
    pub fn filter_graph(&self) -> String {
        format!(
            "scale={w}:{h},setsar=1,\
             drawbox=x=0:y=ih-{band}:w=iw:h={band}:color=black@0.7:t=fill,\
             drawtext=expansion=none:text={text}:fontcolor=white:fontsize={fs}:x=(w-text_w)/2:y=h-40-ascent",
            w = self.width,
            h = self.height,
            band = self.band_height,
            text = quote_filter_value(&self.caption),
            fs = self.font_size,
        )
    }
}

/// Значение опции фильтра, готовое для вставки в цепочку фильтров
///
/// ffmpeg снимает экранирование дважды: сначала на уровне цепочки
/// (кавычки), затем на уровне опций (`\`, `'`, `:`). Внутри кавычек `'`
/// выразить нельзя, поэтому кавычка закрывается, `'` экранируется и
/// кавычка открывается снова.
pub fn quote_filter_value(text: &str) -> String {
    let mut option = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '\'' | ':') {
            option.push('\\');
        }
        option.push(c);
    }
    format!("'{}'", option.replace('\'', r"'\''"))
}

/// Отрисовка одного кадра превью (аналог холста)
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    /// Нарисовать кадр из источника и вернуть закодированное изображение
    async fn render_still(&self, source: &Path, kind: MediaKind, spec: &FrameSpec) -> Result<Vec<u8>>;

    /// MIME-тип результата
    fn mime(&self) -> &'static str {
        JPEG_MIME
    }
}

/// Реализация через ffmpeg
pub struct FfmpegFrameRenderer {
    tool: ExternalTool,
}

impl FfmpegFrameRenderer {
    pub fn new(tools: &ToolsConfig) -> Result<Self> {
        Ok(Self {
            tool: ExternalTool::resolve("ffmpeg", tools.ffmpeg_path.as_deref())?,
        })
    }
}

#[async_trait]
impl FrameRenderer for FfmpegFrameRenderer {
    async fn render_still(&self, source: &Path, kind: MediaKind, spec: &FrameSpec) -> Result<Vec<u8>> {
        debug!("Rendering {:?} frame from {}", kind, source.display());
        let filter = spec.filter_graph();

        let mut args: Vec<&OsStr> = ["-v", "error", "-i"].into_iter().map(OsStr::new).collect();
        args.push(source.as_os_str());
        args.extend(
            [
                "-frames:v",
                "1",
                "-vf",
                filter.as_str(),
                "-f",
                "image2pipe",
                "-c:v",
                "mjpeg",
                "-",
            ]
            .into_iter()
            .map(OsStr::new),
        );

        let output = self.tool.output(args, None).await?;
        if !output.status.success() {
            return Err(StudioError::Render(describe_failure("ffmpeg", &output)));
        }
        if output.stdout.is_empty() {
            return Err(StudioError::Render("ffmpeg produced no image".to_string()));
        }
        Ok(output.stdout)
    }
}
