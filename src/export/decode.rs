//! # 解码模块
//!
//! ## 设计思路
//!
//! 解码是“单次、可等待”的异步任务：在阻塞线程中完成，调用方 `await` 结果后再继续。
//! 任务之间不共享可变状态，流水线按 源图 → 边框 → 水印 的固定顺序逐个等待。
//!
//! ## 实现思路
//!
//! 1. 加载编码字节并校验签名
//! 2. 只读 header 获取尺寸，按像素上限快速拒绝
//! 3. 完整解码
//! 4. 转换 RGBA 并复核尺寸

use std::io::Cursor;

use image::{GenericImageView, RgbaImage};

use super::loader::DecodeStage;
use super::source::{ImageSource, RawImageData};
use super::{ExportError, ExportPipeline, PipelineLimits};

impl ExportPipeline {
    /// 在阻塞线程中加载并解码一张图片。
    pub(crate) async fn decode_bitmap(
        &self,
        source: ImageSource,
        stage: DecodeStage,
    ) -> Result<RgbaImage, ExportError> {
        let limits = self.limits.clone();

        tokio::task::spawn_blocking(move || {
            let raw = Self::load_encoded(&source, &limits, stage)?;
            Self::decode_raw(raw, &limits, stage)
        })
        .await
        .map_err(|e| ExportError::Task(format!("解码线程执行失败：{}", e)))?
    }

    /// 同步解码已加载的字节。
    pub(crate) fn decode_raw(
        raw: RawImageData,
        limits: &PipelineLimits,
        stage: DecodeStage,
    ) -> Result<RgbaImage, ExportError> {
        let (header_width, header_height) =
            Self::inspect_dimensions_from_memory(&raw.bytes).map_err(|msg| stage.error(msg))?;
        limits
            .check_decoded(header_width, header_height)
            .map_err(|msg| stage.error(msg))?;

        let decoded = image::load_from_memory(&raw.bytes)
            .map_err(|e| stage.error(format!("图片解码失败：{}", e)))?;

        let (width, height) = decoded.dimensions();
        if width == 0 || height == 0 {
            return Err(stage.error("图片尺寸为 0"));
        }
        limits
            .check_decoded(width, height)
            .map_err(|msg| stage.error(msg))?;

        let rgba = decoded.to_rgba8();

        log::info!(
            "✅ 图片解码成功 - 图层: {} 来源: {} 尺寸: {}x{}",
            stage.hint(),
            raw.source_hint,
            width,
            height
        );

        Ok(rgba)
    }

    /// 仅通过内存中的图片头信息读取宽高。
    fn inspect_dimensions_from_memory(bytes: &[u8]) -> Result<(u32, u32), String> {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| format!("无法识别图片格式：{}", e))?
            .into_dimensions()
            .map_err(|e| format!("无法读取图片尺寸：{}", e))
    }
}
