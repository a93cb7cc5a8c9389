//! # 内边距图层
//!
//! 内边距永远是最底层：整块画布先填充内边距颜色，其余内容都画在它上面。

use super::config::{Effect, Padding};
use super::source::Dimensions;
use super::surface::Surface;
use crate::clamp::clamp_padding_size;
use crate::color::Rgba;

/// 未启用内边距时的画布底色。
pub const DEFAULT_BACKGROUND: Rgba = Rgba::WHITE;

pub fn clamp_size(value: f64) -> u32 {
    clamp_padding_size(value)
}

/// 实际生效的内边距（像素），未启用时为 0。
pub fn effective_size(padding: &Effect<Padding>) -> u32 {
    match padding {
        Effect::Enabled(p) if p.size > 0 => clamp_size(p.size as f64),
        _ => 0,
    }
}

/// 加上内边距后的尺寸。
pub fn compute_padded_dimensions(width: u32, height: u32, padding: &Effect<Padding>) -> Dimensions {
    let size = effective_size(padding);
    Dimensions::new(width.saturating_add(2 * size), height.saturating_add(2 * size))
}

/// 画布底色：启用内边距时取其颜色，否则白色。
///
/// 全部效果关闭时透明像素会被压到白底上，只有不透明源图才逐像素不变。
pub fn background_color(padding: &Effect<Padding>) -> Rgba {
    match padding {
        Effect::Enabled(p) => p.color,
        Effect::Disabled => DEFAULT_BACKGROUND,
    }
}

/// 绘制最底层。
pub fn fill_background(surface: &mut Surface, padding: &Effect<Padding>) {
    let color = background_color(padding);
    log::debug!("🎨 填充画布底色 {}", color);
    surface.fill(color);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::PipelineLimits;

    fn enabled(size: u32) -> Effect<Padding> {
        Effect::Enabled(Padding {
            color: Rgba::opaque(1, 2, 3),
            size,
        })
    }

    #[test]
    fn disabled_or_zero_padding_is_identity() {
        assert_eq!(
            compute_padded_dimensions(100, 50, &Effect::Disabled),
            Dimensions::new(100, 50)
        );
        assert_eq!(compute_padded_dimensions(100, 50, &enabled(0)), Dimensions::new(100, 50));
    }

    #[test]
    fn padding_wraps_both_axes() {
        assert_eq!(compute_padded_dimensions(100, 50, &enabled(20)), Dimensions::new(140, 90));
        assert_eq!(compute_padded_dimensions(1, 1, &enabled(500)), Dimensions::new(401, 401));
    }

    #[test]
    fn background_uses_padding_color_or_white() {
        assert_eq!(background_color(&enabled(0)), Rgba::opaque(1, 2, 3));
        assert_eq!(background_color(&Effect::Disabled), Rgba::WHITE);

        let mut surface = Surface::acquire(Dimensions::new(2, 2), &PipelineLimits::default())
            .expect("surface");
        fill_background(&mut surface, &enabled(4));
        let out = surface.finish().expect("finish");
        assert!(out.pixels().all(|p| p.0 == [1, 2, 3, 255]));
    }
}
