//! # 配置模块
//!
//! ## 设计思路
//!
//! 配置面板输出的是带 `enabled` 开关的 camelCase JSON（“线上格式”），
//! 流水线内部只接受解析后的 `ExportSettings`，每个效果都是
//! `Effect::Disabled | Effect::Enabled(details)`。
//! 这样 `enabled: false` 时残留的旧参数根本不会被读到。
//!
//! ## 实现思路
//!
//! - 线上格式字段全部带默认值，缺省字段不报错。
//! - `validate_*_config` 负责“读时钳制”：数值越界钳到边界，颜色无法解析才报错。
//! - `ExportConfig::resolve` 把线上格式转换为内部的标签联合。

use serde::{Deserialize, Serialize};

use super::ExportError;
use crate::clamp;
use crate::color::{Rgba, parse_color};

pub const DEFAULT_PADDING_COLOR: &str = "#FFFFFF";
pub const DEFAULT_PADDING_SIZE: f64 = 20.0;
pub const DEFAULT_WATERMARK_SIZE: f64 = 100.0;
pub const DEFAULT_WATERMARK_OPACITY: f64 = 50.0;
pub const DEFAULT_JPEG_QUALITY: f64 = 0.92;

/// 浏览器边框样式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStyle {
    #[default]
    Mac,
    Windows,
    UrlTop,
    UrlBottom,
}

/// 水印锚点。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    Center,
    BottomLeft,
    #[default]
    BottomRight,
}

/// 输出编码格式。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutputFormat {
    #[default]
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/jpeg")]
    Jpeg,
}

impl OutputFormat {
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }
}

// ============================================================================
// 线上格式
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PaddingConfig {
    pub enabled: bool,
    pub color: String,
    pub size: f64,
}

impl Default for PaddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            color: DEFAULT_PADDING_COLOR.to_string(),
            size: DEFAULT_PADDING_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrowserFrameConfig {
    pub enabled: bool,
    pub style: FrameStyle,
    pub include_url: bool,
    pub include_date: bool,
    pub url: String,
}

impl Default for BrowserFrameConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            style: FrameStyle::Mac,
            include_url: true,
            include_date: false,
            url: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatermarkConfig {
    pub enabled: bool,
    /// Data URL 或纯 Base64；空字符串表示尚未选择图片。
    pub image_data: String,
    pub position: WatermarkPosition,
    pub size: f64,
    pub opacity: f64,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image_data: String::new(),
            position: WatermarkPosition::BottomRight,
            size: DEFAULT_WATERMARK_SIZE,
            opacity: DEFAULT_WATERMARK_OPACITY,
        }
    }
}

/// 一次导出的完整配置（线上格式）。缺省的效果等价于关闭。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportConfig {
    pub padding: Option<PaddingConfig>,
    pub browser_frame: Option<BrowserFrameConfig>,
    pub watermark: Option<WatermarkConfig>,
    pub format: OutputFormat,
    pub quality: f64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            padding: None,
            browser_frame: None,
            watermark: None,
            format: OutputFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

// ============================================================================
// 内部格式
// ============================================================================

/// 可选效果：关闭时不携带任何参数。
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Effect<T> {
    #[default]
    Disabled,
    Enabled(T),
}

impl<T> Effect<T> {
    pub fn as_enabled(&self) -> Option<&T> {
        match self {
            Self::Enabled(details) => Some(details),
            Self::Disabled => None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, Self::Enabled(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Padding {
    pub color: Rgba,
    pub size: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserFrame {
    pub style: FrameStyle,
    pub include_url: bool,
    pub include_date: bool,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub image_data: String,
    pub position: WatermarkPosition,
    /// 百分比，`[20, 200]`。
    pub size: u32,
    /// 百分比，`[0, 100]`。
    pub opacity: u32,
}

/// 解析后的导出参数，流水线唯一接受的输入形式。
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub padding: Effect<Padding>,
    pub frame: Effect<BrowserFrame>,
    pub watermark: Effect<Watermark>,
    pub format: OutputFormat,
    pub quality: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            padding: Effect::Disabled,
            frame: Effect::Disabled,
            watermark: Effect::Disabled,
            format: OutputFormat::Png,
            quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl ExportConfig {
    /// 从 JSON 文本解析并校验。
    ///
    /// 只有 `enabled: true` 的效果会被校验；关闭的效果尽量保留原样，
    /// 残留明细无法解析时退回默认值，不影响整体配置。
    pub fn from_json(text: &str) -> Result<Self, ExportError> {
        let mut raw: serde_json::Value = serde_json::from_str(text)
            .map_err(|e| ExportError::ConfigValidation(format!("导出配置不是合法 JSON：{}", e)))?;

        let padding = take_block(&mut raw, "padding");
        let frame = take_block(&mut raw, "browserFrame");
        let watermark = take_block(&mut raw, "watermark");

        let mut config: ExportConfig = serde_json::from_value(raw)
            .map_err(|e| ExportError::ConfigValidation(format!("导出配置字段类型错误：{}", e)))?;

        config.padding = parse_block(padding, validate_padding_config)?;
        config.browser_frame = parse_block(frame, validate_browser_frame_config)?;
        config.watermark = parse_block(watermark, validate_watermark_config)?;
        config.quality = clamp::clamp_quality(config.quality);

        Ok(config)
    }

    /// 转换为内部标签联合形式。
    ///
    /// 仅在颜色无法解析时失败；数值一律钳制。
    pub fn resolve(&self) -> Result<ExportSettings, ExportError> {
        let padding = match &self.padding {
            Some(cfg) if cfg.enabled => Effect::Enabled(Padding {
                color: parse_padding_color(&cfg.color)?,
                size: clamp::clamp_padding_size(cfg.size),
            }),
            _ => Effect::Disabled,
        };

        let frame = match &self.browser_frame {
            Some(cfg) if cfg.enabled => Effect::Enabled(BrowserFrame {
                style: cfg.style,
                include_url: cfg.include_url,
                include_date: cfg.include_date,
                url: cfg.url.clone(),
            }),
            _ => Effect::Disabled,
        };

        let watermark = match &self.watermark {
            Some(cfg) if cfg.enabled => Effect::Enabled(Watermark {
                image_data: cfg.image_data.clone(),
                position: cfg.position,
                size: clamp::clamp_watermark_size(cfg.size),
                opacity: clamp::clamp_watermark_opacity(cfg.opacity),
            }),
            _ => Effect::Disabled,
        };

        Ok(ExportSettings {
            padding,
            frame,
            watermark,
            format: self.format,
            quality: clamp::clamp_quality(self.quality),
        })
    }
}

fn take_block(raw: &mut serde_json::Value, key: &str) -> Option<serde_json::Value> {
    raw.as_object_mut()
        .and_then(|map| map.remove(key))
        .filter(|block| !block.is_null())
}

fn is_enabled(block: &serde_json::Value) -> bool {
    block.get("enabled").and_then(serde_json::Value::as_bool) == Some(true)
}

/// 启用的效果走校验；关闭的效果只做宽松解析。
fn parse_block<T>(
    block: Option<serde_json::Value>,
    validate: fn(&serde_json::Value) -> Result<T, ExportError>,
) -> Result<Option<T>, ExportError>
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(block) = block else {
        return Ok(None);
    };

    if is_enabled(&block) {
        return validate(&block).map(Some);
    }

    let parsed = serde_json::from_value(block).unwrap_or_else(|e| {
        log::debug!("⚙️ 已关闭效果的残留配置无法解析，使用默认值：{}", e);
        T::default()
    });
    Ok(Some(parsed))
}

fn parse_padding_color(color: &str) -> Result<Rgba, ExportError> {
    parse_color(color)
        .ok_or_else(|| ExportError::ConfigValidation(format!("无法解析的内边距颜色：{}", color)))
}

/// 校验并归一化内边距配置。
///
/// 缺省字段取默认值，`size` 钳制到 `[0, 200]`，颜色字符串原样保留。
pub fn validate_padding_config(raw: &serde_json::Value) -> Result<PaddingConfig, ExportError> {
    let mut config: PaddingConfig = serde_json::from_value(raw.clone())
        .map_err(|e| ExportError::ConfigValidation(format!("内边距配置格式错误：{}", e)))?;

    parse_padding_color(&config.color)?;
    config.size = clamp::clamp_padding_size(config.size) as f64;

    Ok(config)
}

/// 校验浏览器边框配置；样式未知时报错。
pub fn validate_browser_frame_config(
    raw: &serde_json::Value,
) -> Result<BrowserFrameConfig, ExportError> {
    serde_json::from_value(raw.clone())
        .map_err(|e| ExportError::ConfigValidation(format!("浏览器边框配置格式错误：{}", e)))
}

/// 校验并归一化水印配置。
pub fn validate_watermark_config(raw: &serde_json::Value) -> Result<WatermarkConfig, ExportError> {
    let mut config: WatermarkConfig = serde_json::from_value(raw.clone())
        .map_err(|e| ExportError::ConfigValidation(format!("水印配置格式错误：{}", e)))?;

    config.size = clamp::clamp_watermark_size(config.size) as f64;
    config.opacity = clamp::clamp_watermark_opacity(config.opacity) as f64;

    Ok(config)
}
