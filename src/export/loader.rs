//! # 加载与校验模块
//!
//! ## 设计思路
//!
//! 统一处理不同来源（Data URL / Base64 / 内存字节 / 本地文件）的原始字节加载，
//! 并在“尽可能早”的阶段执行输入校验，目标是尽快失败。
//!
//! ## 实现思路
//!
//! - Base64：格式解析 + 解码前体积估算 + 解码后体积限制。
//! - 文件：存在性 + metadata 体积限制 + 读取。
//! - 所有来源最后都做一次文件签名（magic bytes）校验。
//! - 错误按“所处阶段”映射：源图失败是 `SourceDecode`，水印失败是 `EffectDecode`。

use std::path::Path;

use base64::{Engine as _, engine::general_purpose};

use super::source::{ImageSource, RawImageData};
use super::{EffectKind, ExportError, ExportPipeline, PipelineLimits};

/// 当前解码的是哪一层，决定失败时的错误类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DecodeStage {
    Source,
    Effect(EffectKind),
}

impl DecodeStage {
    pub(crate) fn error(self, message: impl Into<String>) -> ExportError {
        match self {
            Self::Source => ExportError::SourceDecode(message.into()),
            Self::Effect(effect) => ExportError::effect(effect, message),
        }
    }

    pub(crate) fn hint(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Effect(effect) => effect.as_str(),
        }
    }
}

impl ExportPipeline {
    /// 从任意来源加载编码字节。
    pub(crate) fn load_encoded(
        source: &ImageSource,
        limits: &PipelineLimits,
        stage: DecodeStage,
    ) -> Result<RawImageData, ExportError> {
        let raw = match source {
            ImageSource::Base64(data) => Self::load_from_base64(data, limits, stage)?,
            ImageSource::Bytes(bytes) => {
                if bytes.len() as u64 > limits.max_file_size {
                    return Err(stage.error(Self::size_exceeded_message(
                        "图片",
                        bytes.len() as u64,
                        limits.max_file_size,
                    )));
                }
                RawImageData {
                    bytes: bytes.clone(),
                    source_hint: "bytes",
                }
            }
            ImageSource::FilePath(path) => Self::load_from_file(path, limits, stage)?,
        };

        Self::validate_image_signature(&raw.bytes).map_err(|msg| stage.error(msg))?;
        Ok(raw)
    }

    fn load_from_base64(
        data: &str,
        limits: &PipelineLimits,
        stage: DecodeStage,
    ) -> Result<RawImageData, ExportError> {
        log::debug!("📝 开始解析 base64 图片（{}）", stage.hint());

        let bytes = Self::parse_base64_with_limit(data, limits.max_file_size)
            .map_err(|msg| stage.error(msg))?;

        if bytes.len() as u64 > limits.max_file_size {
            return Err(stage.error(Self::size_exceeded_message(
                "Base64 解码后",
                bytes.len() as u64,
                limits.max_file_size,
            )));
        }

        Ok(RawImageData {
            bytes,
            source_hint: "base64",
        })
    }

    fn load_from_file(
        path: &Path,
        limits: &PipelineLimits,
        stage: DecodeStage,
    ) -> Result<RawImageData, ExportError> {
        log::info!("📁 开始读取本地图片 - 路径: {}", path.display());

        if !path.exists() {
            return Err(stage.error(format!("文件不存在：{}", path.display())));
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| stage.error(format!("无法读取文件信息：{}", e)))?;

        if metadata.len() > limits.max_file_size {
            return Err(stage.error(Self::size_exceeded_message(
                "文件",
                metadata.len(),
                limits.max_file_size,
            )));
        }

        let bytes = std::fs::read(path)
            .map_err(|e| stage.error(format!("无法读取图片文件：{}", e)))?;

        Ok(RawImageData {
            bytes,
            source_hint: "file",
        })
    }

    /// 解析 Base64 输入（支持 Data URL / 纯 Base64），不限体积。
    pub fn parse_base64(data: &str) -> Result<Vec<u8>, String> {
        Self::parse_base64_with_limit(data, u64::MAX)
    }

    fn estimate_base64_decoded_upper_bound_len(base64_data: &str) -> Result<u64, String> {
        let len = base64_data.trim().len() as u64;
        let groups = len
            .checked_add(3)
            .ok_or_else(|| "Base64 输入长度溢出".to_string())?
            / 4;

        groups
            .checked_mul(3)
            .ok_or_else(|| "Base64 解码体积估算溢出".to_string())
    }

    fn parse_base64_with_limit(data: &str, max_file_size: u64) -> Result<Vec<u8>, String> {
        let normalized = data.trim();

        let payload = if normalized.starts_with("data:") {
            if !normalized.starts_with("data:image/") {
                return Err("Data URL 不是图片类型".to_string());
            }
            let base64_start = normalized
                .find(";base64,")
                .ok_or_else(|| "缺少 base64 标记".to_string())?;
            &normalized[base64_start + 8..]
        } else {
            normalized
        };

        let estimated_len = Self::estimate_base64_decoded_upper_bound_len(payload)?;
        if estimated_len > max_file_size {
            return Err(Self::size_exceeded_message(
                "Base64 预计解码",
                estimated_len,
                max_file_size,
            ));
        }

        general_purpose::STANDARD
            .decode(payload)
            .map_err(|e| format!("Base64 解码失败：{}", e))
    }

    fn size_exceeded_message(what: &str, actual: u64, limit: u64) -> String {
        format!(
            "{}体积过大：{:.2} MB（限制：{:.2} MB）",
            what,
            actual as f64 / 1024.0 / 1024.0,
            limit as f64 / 1024.0 / 1024.0
        )
    }

    /// 通过文件签名（magic bytes）校验输入是否为图片。
    fn validate_image_signature(bytes: &[u8]) -> Result<(), String> {
        if bytes.is_empty() {
            return Err("图片内容为空".to_string());
        }

        let kind = infer::get(bytes).ok_or_else(|| "无法识别图片类型".to_string())?;

        if kind.matcher_type() != infer::MatcherType::Image {
            return Err(format!("文件签名不是图片类型：{}", kind.mime_type()));
        }

        Ok(())
    }
}
