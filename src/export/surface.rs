//! # 绘制画布
//!
//! ## 设计思路
//!
//! 画布是一个显式的值：`acquire(W, H)` 申请、每一步绘制显式传入、`finish()` 读出像素。
//! 没有任何跨调用复用的全局画布；`Surface` 被 drop 时内存随之释放，
//! 无论合成在哪个 `await` 点被取消或出错都不会泄漏。
//!
//! ## 实现思路
//!
//! - 申请前按 `PipelineLimits` 校验尺寸，内存通过 `try_reserve_exact` 申请，
//!   失败映射为 `RenderSurfaceUnavailable`。
//! - 合成使用直通 alpha 的 source-over，并支持对整张图施加全局透明度。
//! - 绘制坐标允许为负或越界，超出部分被裁掉。

use image::RgbaImage;

use super::source::Dimensions;
use super::{ExportError, PipelineLimits};
use crate::color::Rgba;

/// 合成用的 RGBA 画布。
#[derive(Debug)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    /// 申请一块 `width x height` 的透明画布。
    pub fn acquire(size: Dimensions, limits: &PipelineLimits) -> Result<Self, ExportError> {
        let Dimensions { width, height } = size;

        if width == 0 || height == 0 {
            return Err(ExportError::RenderSurfaceUnavailable(format!(
                "画布尺寸无效：{}x{}",
                width, height
            )));
        }

        if width > limits.max_canvas_dimension || height > limits.max_canvas_dimension {
            return Err(ExportError::RenderSurfaceUnavailable(format!(
                "画布边长超出上限：{}x{}（单边限制：{}）",
                width, height, limits.max_canvas_dimension
            )));
        }

        let pixel_count = size
            .pixel_count()
            .filter(|count| *count <= limits.max_canvas_pixels)
            .ok_or_else(|| {
                ExportError::RenderSurfaceUnavailable(format!(
                    "画布像素总量超出上限：{}x{}（限制：{} 像素）",
                    width, height, limits.max_canvas_pixels
                ))
            })?;

        let byte_len = usize::try_from(pixel_count)
            .ok()
            .and_then(|count| count.checked_mul(4))
            .ok_or_else(|| {
                ExportError::RenderSurfaceUnavailable("画布内存大小溢出".to_string())
            })?;

        let mut pixels = Vec::new();
        pixels.try_reserve_exact(byte_len).map_err(|e| {
            ExportError::RenderSurfaceUnavailable(format!("画布内存申请失败：{}", e))
        })?;
        pixels.resize(byte_len, 0);

        log::debug!("🖼️ 申请画布 {}x{}", width, height);

        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// 用纯色覆盖整块画布（不做混合）。
    pub fn fill(&mut self, color: Rgba) {
        let px = [color.r, color.g, color.b, color.a];
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// 以 source-over 方式把图片画到 `(x, y)`。
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64) {
        self.draw_image_with_opacity(image, x, y, 1.0);
    }

    /// 以 source-over 方式绘制，并对源图整体乘以 `opacity`（`[0,1]`）。
    ///
    /// 透明度只作用于这次绘制，不影响下方已有内容。
    pub fn draw_image_with_opacity(&mut self, image: &RgbaImage, x: i64, y: i64, opacity: f32) {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return;
        }

        let (src_w, src_h) = image.dimensions();
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + src_w as i64).min(self.width as i64);
        let y1 = (y + src_h as i64).min(self.height as i64);
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let src = image.as_raw();
        let dst_stride = self.width as usize * 4;
        let src_stride = src_w as usize * 4;

        for dy in y0..y1 {
            let sy = (dy - y) as usize;
            for dx in x0..x1 {
                let sx = (dx - x) as usize;
                let si = sy * src_stride + sx * 4;
                let di = dy as usize * dst_stride + dx as usize * 4;
                let src_px = [src[si], src[si + 1], src[si + 2], src[si + 3]];
                let dst_px = &mut self.pixels[di..di + 4];
                blend_source_over(dst_px, src_px, opacity);
            }
        }
    }

    /// 读出像素，结束本次绘制。
    pub fn finish(self) -> Result<RgbaImage, ExportError> {
        RgbaImage::from_raw(self.width, self.height, self.pixels).ok_or_else(|| {
            ExportError::RenderSurfaceUnavailable("画布像素长度与尺寸不一致".to_string())
        })
    }
}

/// 直通 alpha 的 source-over 混合。
fn blend_source_over(dst: &mut [u8], src: [u8; 4], opacity: f32) {
    let src_a = src[3] as f32 / 255.0 * opacity;
    if src_a <= 0.0 {
        return;
    }
    if src_a >= 1.0 {
        dst.copy_from_slice(&src);
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);

    for c in 0..3 {
        let s = src[c] as f32 * src_a;
        let d = dst[c] as f32 * dst_a * (1.0 - src_a);
        dst[c] = ((s + d) / out_a).round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
}
