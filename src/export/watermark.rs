//! # 水印图层
//!
//! ## 设计思路
//!
//! 水印永远最后绘制，盖在“内边距 + 边框 + 截图”之上，不会被任何装饰遮挡。
//! 五个锚点（四角 + 居中）距画布边缘保持固定内缩，内缩不对用户开放。
//!
//! ## 实现思路
//!
//! - 缩放：宽高同时乘以 `size / 100`，保持水印原始宽高比。
//! - 缩放优先走 `fast_image_resize`，失败时回退 `image::imageops::resize`。
//! - 透明度只作用于水印这一次绘制（`opacity / 100`）。
//! - 启用但没有图片数据时什么都不画；图片解码失败则是错误。

use fast_image_resize as fr;
use image::RgbaImage;
use image::imageops::FilterType;

use super::config::{Watermark, WatermarkPosition};
use super::source::Dimensions;
use super::surface::Surface;
use crate::clamp::clamp_dimension;

/// 水印距画布边缘的固定内缩（像素）。
pub const WATERMARK_MARGIN: i64 = 20;

/// 是否有可绘制的图片数据。
pub fn has_image(watermark: &Watermark) -> bool {
    !watermark.image_data.trim().is_empty()
}

/// 按百分比缩放后的水印尺寸，至少 1x1。
///
/// 两个轴共用同一个缩放比例；长边超过 `max_dimension` 时整体等比缩小。
pub fn scaled_size(native: Dimensions, size_percent: u32, max_dimension: u32) -> Dimensions {
    let longest = native.width.max(native.height).max(1) as f64;
    let limit = max_dimension.max(1) as f64;
    let scale = (size_percent as f64 / 100.0).min(limit / longest);

    let scale_axis = |v: u32| clamp_dimension((v as f64 * scale).round() as u64, max_dimension);
    Dimensions::new(scale_axis(native.width), scale_axis(native.height))
}

/// 水印左上角在画布上的位置，可能为负（水印比画布大时）。
pub fn placement(canvas: Dimensions, overlay: Dimensions, position: WatermarkPosition) -> (i64, i64) {
    let cw = canvas.width as i64;
    let ch = canvas.height as i64;
    let ow = overlay.width as i64;
    let oh = overlay.height as i64;
    let m = WATERMARK_MARGIN;

    match position {
        WatermarkPosition::TopLeft => (m, m),
        WatermarkPosition::TopRight => (cw - ow - m, m),
        WatermarkPosition::Center => ((cw - ow) / 2, (ch - oh) / 2),
        WatermarkPosition::BottomLeft => (m, ch - oh - m),
        WatermarkPosition::BottomRight => (cw - ow - m, ch - oh - m),
    }
}

/// 缩放并绘制水印。
pub fn apply_watermark(
    surface: &mut Surface,
    overlay: &RgbaImage,
    watermark: &Watermark,
    filter: FilterType,
    max_dimension: u32,
) {
    let native = Dimensions::new(overlay.width(), overlay.height());
    let target = scaled_size(native, watermark.size, max_dimension);

    let scaled;
    let image = if target == native {
        overlay
    } else {
        scaled = scale_overlay(overlay, target, filter);
        &scaled
    };

    let canvas = Dimensions::new(surface.width(), surface.height());
    let (x, y) = placement(canvas, target, watermark.position);
    let opacity = watermark.opacity as f32 / 100.0;

    log::debug!(
        "💧 绘制水印 - 原始 {}x{} 缩放后 {}x{} 位置 ({}, {}) 不透明度 {:.2}",
        native.width,
        native.height,
        target.width,
        target.height,
        x,
        y,
        opacity
    );

    surface.draw_image_with_opacity(image, x, y, opacity);
}

fn scale_overlay(overlay: &RgbaImage, target: Dimensions, filter: FilterType) -> RgbaImage {
    match resize_with_fast_image_resize(overlay, target, filter) {
        Ok(resized) => resized,
        Err(err) => {
            log::warn!("⚠️ fast_image_resize 缩放水印失败，回退 image::resize：{}", err);
            image::imageops::resize(overlay, target.width, target.height, filter)
        }
    }
}

fn resize_with_fast_image_resize(
    overlay: &RgbaImage,
    target: Dimensions,
    filter: FilterType,
) -> Result<RgbaImage, String> {
    let src_image = fr::images::Image::from_vec_u8(
        overlay.width(),
        overlay.height(),
        overlay.as_raw().clone(),
        fr::PixelType::U8x4,
    )
    .map_err(|e| format!("构建水印缓冲失败：{}", e))?;

    let mut dst_image = fr::images::Image::new(target.width, target.height, fr::PixelType::U8x4);

    let mut resizer = fr::Resizer::new();
    let options =
        fr::ResizeOptions::new().resize_alg(fr::ResizeAlg::Convolution(to_fast_filter(filter)));

    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| format!("fast_image_resize 执行失败：{}", e))?;

    RgbaImage::from_raw(target.width, target.height, dst_image.into_vec())
        .ok_or_else(|| "fast_image_resize 输出缓冲长度异常".to_string())
}

fn to_fast_filter(filter: FilterType) -> fr::FilterType {
    match filter {
        FilterType::Nearest => fr::FilterType::Box,
        FilterType::Triangle => fr::FilterType::Bilinear,
        FilterType::CatmullRom => fr::FilterType::CatmullRom,
        FilterType::Gaussian => fr::FilterType::Mitchell,
        FilterType::Lanczos3 => fr::FilterType::Lanczos3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::export::PipelineLimits;
    use image::ImageBuffer;

    fn watermark(position: WatermarkPosition, size: u32, opacity: u32) -> Watermark {
        Watermark {
            image_data: "data:image/png;base64,AAAA".to_string(),
            position,
            size,
            opacity,
        }
    }

    #[test]
    fn scaling_preserves_aspect_ratio() {
        let native = Dimensions::new(200, 100);
        assert_eq!(scaled_size(native, 50, 32_767), Dimensions::new(100, 50));
        assert_eq!(scaled_size(native, 150, 32_767), Dimensions::new(300, 150));
        assert_eq!(scaled_size(Dimensions::new(1, 1), 20, 32_767), Dimensions::new(1, 1));
    }

    #[test]
    fn dimension_limit_shrinks_both_axes_together() {
        let native = Dimensions::new(400, 100);
        assert_eq!(scaled_size(native, 200, 200), Dimensions::new(200, 50));
        assert_eq!(scaled_size(Dimensions::new(100, 300), 100, 150), Dimensions::new(50, 150));
    }

    #[test]
    fn anchors_keep_fixed_inset() {
        let canvas = Dimensions::new(1000, 500);
        let overlay = Dimensions::new(100, 50);

        assert_eq!(placement(canvas, overlay, WatermarkPosition::TopLeft), (20, 20));
        assert_eq!(placement(canvas, overlay, WatermarkPosition::TopRight), (880, 20));
        assert_eq!(placement(canvas, overlay, WatermarkPosition::Center), (450, 225));
        assert_eq!(placement(canvas, overlay, WatermarkPosition::BottomLeft), (20, 430));
        assert_eq!(placement(canvas, overlay, WatermarkPosition::BottomRight), (880, 430));
    }

    #[test]
    fn empty_image_data_is_detected() {
        let mut wm = watermark(WatermarkPosition::Center, 100, 100);
        assert!(has_image(&wm));
        wm.image_data = "   ".to_string();
        assert!(!has_image(&wm));
    }

    #[test]
    fn applies_scaled_overlay_at_anchor() {
        let mut surface = Surface::acquire(Dimensions::new(100, 100), &PipelineLimits::default())
            .expect("surface");
        surface.fill(Rgba::WHITE);

        let overlay = ImageBuffer::from_pixel(20, 10, image::Rgba([0u8, 0, 0, 255]));
        apply_watermark(
            &mut surface,
            &overlay,
            &watermark(WatermarkPosition::TopLeft, 50, 100),
            FilterType::Nearest,
            32_767,
        );

        let out = surface.finish().expect("finish");
        assert_eq!(out.get_pixel(20, 20).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(29, 24).0, [0, 0, 0, 255]);
        assert_eq!(out.get_pixel(30, 20).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(20, 25).0, [255, 255, 255, 255]);
    }

    #[test]
    fn opacity_only_affects_overlay() {
        let mut surface = Surface::acquire(Dimensions::new(60, 60), &PipelineLimits::default())
            .expect("surface");
        surface.fill(Rgba::WHITE);

        let overlay = ImageBuffer::from_pixel(20, 20, image::Rgba([0u8, 0, 0, 255]));
        apply_watermark(
            &mut surface,
            &overlay,
            &watermark(WatermarkPosition::Center, 100, 50),
            FilterType::Triangle,
            32_767,
        );

        let out = surface.finish().expect("finish");
        assert_eq!(out.get_pixel(30, 30).0, [128, 128, 128, 255]);
        assert_eq!(out.get_pixel(0, 0).0, [255, 255, 255, 255]);
    }
}
