//! # 资源限制模块
//!
//! ## 设计思路
//!
//! 把“能处理多大的输入、能申请多大的画布”集中到 `PipelineLimits`，
//! 保证恶意或异常输入在解码前就被拒绝。
//! 水印缩放的重采样策略以档位（quality / balanced / speed）对外暴露。
//!
//! ## 实现思路
//!
//! - `Default` 提供生产可用的平衡配置。
//! - `ScaleProfile` 负责档位字符串解析与反向输出。
//! - `with_profile` 将档位映射为具体滤镜。

use image::imageops::FilterType;

use super::ExportError;

/// 流水线资源限制。
///
/// 字段覆盖了输入读取、解码与画布申请三个阶段。调用期间只读。
#[derive(Debug, Clone)]
pub struct PipelineLimits {
    /// 编码后输入（源图 / 水印）允许的最大体积（字节）。
    pub max_file_size: u64,
    /// 解码后的像素上限（`width * height`）。
    pub max_decoded_pixels: u64,
    /// 解码阶段允许的预计内存上限（按 RGBA 估算，字节）。
    pub max_decoded_bytes: u64,
    /// 画布单边最大值（与主流浏览器 canvas 上限一致）。
    pub max_canvas_dimension: u32,
    /// 画布像素总量上限。
    pub max_canvas_pixels: u64,
    /// 水印缩放滤镜。
    pub watermark_filter: FilterType,
}

impl Default for PipelineLimits {
    fn default() -> Self {
        Self {
            max_file_size: 50 * 1024 * 1024,
            max_decoded_pixels: 40_000_000,
            max_decoded_bytes: 160 * 1024 * 1024,
            max_canvas_dimension: 32_767,
            max_canvas_pixels: 268_435_456,
            watermark_filter: FilterType::Triangle,
        }
    }
}

/// 水印重采样档位。
///
/// - `Quality`：尽量保真
/// - `Balanced`：质量与性能平衡
/// - `Speed`：优先速度
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScaleProfile {
    Quality,
    Balanced,
    Speed,
}

impl ScaleProfile {
    /// 从外部字符串解析档位。
    ///
    /// # 示例
    /// ```rust
    /// use screenshot_export::export::ScaleProfile;
    ///
    /// let p = ScaleProfile::parse("balanced")?;
    /// assert_eq!(p.as_str(), "balanced");
    /// # Ok::<(), screenshot_export::export::ExportError>(())
    /// ```
    pub fn parse(profile: &str) -> Result<Self, ExportError> {
        match profile.trim().to_lowercase().as_str() {
            "quality" => Ok(Self::Quality),
            "balanced" => Ok(Self::Balanced),
            "speed" => Ok(Self::Speed),
            other => Err(ExportError::ConfigValidation(format!(
                "未知缩放档位：{}（可选：quality / balanced / speed）",
                other
            ))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Quality => "quality",
            Self::Balanced => "balanced",
            Self::Speed => "speed",
        }
    }

    fn filter(self) -> FilterType {
        match self {
            Self::Quality => FilterType::CatmullRom,
            Self::Balanced => FilterType::Triangle,
            Self::Speed => FilterType::Nearest,
        }
    }
}

impl PipelineLimits {
    /// 应用指定档位到水印缩放滤镜。
    pub fn with_profile(mut self, profile: ScaleProfile) -> Self {
        self.watermark_filter = profile.filter();
        self
    }

    /// 基于当前滤镜反推档位。
    pub fn profile(&self) -> ScaleProfile {
        match self.watermark_filter {
            FilterType::CatmullRom | FilterType::Lanczos3 | FilterType::Gaussian => {
                ScaleProfile::Quality
            }
            FilterType::Nearest => ScaleProfile::Speed,
            FilterType::Triangle => ScaleProfile::Balanced,
        }
    }

    /// 校验解码后的像素数与内存估算是否超过上限。
    pub(crate) fn check_decoded(&self, width: u32, height: u32) -> Result<(), String> {
        let pixels = (width as u64)
            .checked_mul(height as u64)
            .ok_or_else(|| "图片像素数溢出".to_string())?;

        if pixels > self.max_decoded_pixels {
            return Err(format!(
                "图片像素过大：{} 像素（限制：{} 像素）",
                pixels, self.max_decoded_pixels
            ));
        }

        let estimated = pixels
            .checked_mul(4)
            .ok_or_else(|| "图片解码内存估算溢出".to_string())?;

        if estimated > self.max_decoded_bytes {
            return Err(format!(
                "图片解码预计内存过大：{:.2} MB（限制：{:.2} MB）",
                estimated as f64 / 1024.0 / 1024.0,
                self.max_decoded_bytes as f64 / 1024.0 / 1024.0
            ));
        }

        Ok(())
    }
}
