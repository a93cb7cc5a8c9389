//! # 数据源与中间模型
//!
//! ## 设计思路
//!
//! 将“外部输入类型”和“流水线中间结果”解耦：
//! - `ImageSource` 表示编码图片从哪里来
//! - `RawImageData` 表示已加载但未解码的字节
//! - `ExportResult` 表示合成完成、可交付的位图

use std::path::PathBuf;

use image::RgbaImage;

use super::config::OutputFormat;

/// 编码图片来源（PNG / JPEG 等）。
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Data URL 或纯 Base64 字符串。
    Base64(String),
    /// 内存中的编码字节（例如截图接口直接给出的 PNG）。
    Bytes(Vec<u8>),
    /// 本地文件路径。
    FilePath(PathBuf),
}

/// 加载阶段输出：原始字节与来源标识。
pub(crate) struct RawImageData {
    /// 原始图片字节。
    pub(crate) bytes: Vec<u8>,
    /// 来源提示（用于日志与诊断）。
    pub(crate) source_hint: &'static str,
}

/// 画布尺寸（像素）。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// 像素总数；溢出时返回 `None`。
    pub fn pixel_count(self) -> Option<u64> {
        (self.width as u64).checked_mul(self.height as u64)
    }
}

/// 合成结果。
///
/// `width` / `height` 恒等于 `calculate_final_dimensions` 的预测值。
#[derive(Debug, Clone)]
pub struct ExportResult {
    pub bitmap: RgbaImage,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    /// JPEG 质量 `[0,1]`，PNG 忽略。
    pub quality: f64,
}

impl ExportResult {
    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }
}
