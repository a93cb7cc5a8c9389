//! 数值裁剪、颜色解析与尺寸推导的性质测试。

use proptest::prelude::*;
use screenshot_export::clamp::{
    PADDING_SIZE_MAX, PADDING_SIZE_MIN, WATERMARK_OPACITY_MAX, WATERMARK_SIZE_MAX,
    WATERMARK_SIZE_MIN, clamp_padding_size, clamp_watermark_opacity, clamp_watermark_size,
};
use screenshot_export::color::{Rgba, format_hex, format_rgba, parse_color};
use screenshot_export::export::{
    BrowserFrame, Effect, ExportSettings, FrameStyle, Padding, calculate_final_dimensions,
};

fn frame_style() -> impl Strategy<Value = FrameStyle> {
    prop_oneof![
        Just(FrameStyle::Mac),
        Just(FrameStyle::Windows),
        Just(FrameStyle::UrlTop),
        Just(FrameStyle::UrlBottom),
    ]
}

proptest! {
    #[test]
    fn clamped_values_stay_in_range(value in -1.0e6f64..1.0e6) {
        let padding = clamp_padding_size(value);
        prop_assert!((PADDING_SIZE_MIN..=PADDING_SIZE_MAX).contains(&padding));

        let size = clamp_watermark_size(value);
        prop_assert!((WATERMARK_SIZE_MIN..=WATERMARK_SIZE_MAX).contains(&size));

        prop_assert!(clamp_watermark_opacity(value) <= WATERMARK_OPACITY_MAX);
    }

    #[test]
    fn clamping_is_idempotent(value in -1.0e6f64..1.0e6) {
        let once = clamp_padding_size(value);
        prop_assert_eq!(clamp_padding_size(once as f64), once);

        let once = clamp_watermark_size(value);
        prop_assert_eq!(clamp_watermark_size(once as f64), once);
    }

    #[test]
    fn clamping_is_monotonic(a in -500.0f64..500.0, b in -500.0f64..500.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(clamp_padding_size(lo) <= clamp_padding_size(hi));
        prop_assert!(clamp_watermark_opacity(lo) <= clamp_watermark_opacity(hi));
    }

    #[test]
    fn hex_format_round_trips(r: u8, g: u8, b: u8, a: u8) {
        let color = Rgba::new(r, g, b, a);
        prop_assert_eq!(parse_color(&format_hex(color)), Some(color));
    }

    #[test]
    fn rgba_format_round_trips(r: u8, g: u8, b: u8, a: u8) {
        let color = Rgba::new(r, g, b, a);
        prop_assert_eq!(parse_color(&format_rgba(color)), Some(color));
    }

    #[test]
    fn final_dimensions_follow_formula(
        width in 1u32..5_000,
        height in 1u32..5_000,
        padding in 0u32..=200,
        style in frame_style(),
        include_url: bool,
    ) {
        let settings = ExportSettings {
            padding: Effect::Enabled(Padding { color: Rgba::WHITE, size: padding }),
            frame: Effect::Enabled(BrowserFrame {
                style,
                include_url,
                include_date: false,
                url: String::new(),
            }),
            ..ExportSettings::default()
        };

        let dims = calculate_final_dimensions(width, height, &settings);
        let header = match style {
            FrameStyle::Windows if include_url => 70,
            FrameStyle::Windows => 32,
            FrameStyle::Mac if !include_url => 40,
            _ => 84,
        };

        prop_assert_eq!(dims.width, width + 2 * padding);
        prop_assert_eq!(dims.height, height + header + 2 * padding);
    }
}
