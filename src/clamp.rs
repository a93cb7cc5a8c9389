//! # 数值钳制工具
//!
//! 配置面板写入的数值（内边距、水印尺寸/透明度、导出质量）在这里统一归一化。
//! 越界值一律钳制到边界，从不拒绝；所有函数单调且幂等。

/// 内边距下限（像素）。
pub const PADDING_SIZE_MIN: u32 = 0;
/// 内边距上限（像素）。
pub const PADDING_SIZE_MAX: u32 = 200;
/// 水印缩放下限（百分比）。
pub const WATERMARK_SIZE_MIN: u32 = 20;
/// 水印缩放上限（百分比）。
pub const WATERMARK_SIZE_MAX: u32 = 200;
/// 水印不透明度下限（百分比）。
pub const WATERMARK_OPACITY_MIN: u32 = 0;
/// 水印不透明度上限（百分比）。
pub const WATERMARK_OPACITY_MAX: u32 = 100;

/// 四舍五入后钳制到 `[min, max]`；`NaN` 视为下限。
pub fn clamp_rounded(value: f64, min: u32, max: u32) -> u32 {
    if value.is_nan() {
        return min;
    }
    let rounded = value.round();
    if rounded <= min as f64 {
        min
    } else if rounded >= max as f64 {
        max
    } else {
        rounded as u32
    }
}

pub fn clamp_padding_size(value: f64) -> u32 {
    clamp_rounded(value, PADDING_SIZE_MIN, PADDING_SIZE_MAX)
}

pub fn clamp_watermark_size(value: f64) -> u32 {
    clamp_rounded(value, WATERMARK_SIZE_MIN, WATERMARK_SIZE_MAX)
}

pub fn clamp_watermark_opacity(value: f64) -> u32 {
    clamp_rounded(value, WATERMARK_OPACITY_MIN, WATERMARK_OPACITY_MAX)
}

/// JPEG 质量钳制到 `[0,1]`。
pub fn clamp_quality(value: f64) -> f64 {
    if value.is_nan() {
        return 0.0;
    }
    value.clamp(0.0, 1.0)
}

/// 画布边长钳制到 `[1, max]`。
pub fn clamp_dimension(value: u64, max: u32) -> u32 {
    value.clamp(1, max.max(1) as u64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn padding_size_rounds_and_clamps() {
        assert_eq!(clamp_padding_size(-5.0), 0);
        assert_eq!(clamp_padding_size(19.5), 20);
        assert_eq!(clamp_padding_size(19.4), 19);
        assert_eq!(clamp_padding_size(999.0), 200);
        assert_eq!(clamp_padding_size(f64::NAN), 0);
        assert_eq!(clamp_padding_size(f64::INFINITY), 200);
    }

    #[test]
    fn watermark_bounds() {
        assert_eq!(clamp_watermark_size(0.0), 20);
        assert_eq!(clamp_watermark_size(150.0), 150);
        assert_eq!(clamp_watermark_size(201.0), 200);
        assert_eq!(clamp_watermark_opacity(-1.0), 0);
        assert_eq!(clamp_watermark_opacity(100.4), 100);
    }

    #[test]
    fn quality_and_dimension() {
        assert_eq!(clamp_quality(1.5), 1.0);
        assert_eq!(clamp_quality(-0.1), 0.0);
        assert_eq!(clamp_quality(f64::NAN), 0.0);
        assert_eq!(clamp_dimension(0, 100), 1);
        assert_eq!(clamp_dimension(500, 100), 100);
    }
}
