//! # 浏览器边框渲染
//!
//! ## 设计思路
//!
//! 模拟浏览器窗口的标题栏（按钮 + 可选地址栏 + 可选日期），画在截图上方或下方。
//! 高度只由“基础样式 + 是否显示地址栏”决定，`get_header_height` 不需要渲染就能给出，
//! 合成流水线据此提前预留空间。渲染出的位图高度必须与它完全一致。
//!
//! ## 实现思路
//!
//! - `url_top` / `url_bottom` 一律使用 mac 基础样式，并强制显示地址栏。
//! - 地址超过 50 个字符时截断并追加省略号。
//! - 日期右对齐，按系统区域（`LC_ALL` / `LC_TIME` / `LANG`）的日期格式输出当天日期，
//!   无法识别时退回 POSIX 格式。
//! - 先构建 `Scene`，再统一栅格化，宽高由场景声明决定。

use chrono::{DateTime, Local, Locale, TimeZone};
use image::RgbaImage;

use super::config::{BrowserFrame, FrameStyle};
use super::scene::{DrawCommand, Scene, Stroke, TextAnchor};
use super::{EffectKind, ExportError};
use crate::color::Rgba;

/// 地址栏文字最多保留的字符数。
pub const URL_MAX_CHARS: usize = 50;
const URL_ELLIPSIS: &str = "...";

/// 边框的基础外观。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseStyle {
    Mac,
    Windows,
}

/// 每种基础样式的固定布局常量。
#[derive(Debug, Clone, Copy)]
struct FrameLayout {
    header_height: u32,
    url_bar_height: u32,
    url_bar_margin: u32,
    corner_radius: f32,
    url_bar_radius: f32,
    background: Rgba,
    separator: Rgba,
    url_bar_border: Rgba,
}

const MAC_LAYOUT: FrameLayout = FrameLayout {
    header_height: 40,
    url_bar_height: 28,
    url_bar_margin: 8,
    corner_radius: 10.0,
    url_bar_radius: 6.0,
    background: Rgba::opaque(0xEC, 0xEC, 0xEC),
    separator: Rgba::opaque(0xD0, 0xD0, 0xD0),
    url_bar_border: Rgba::opaque(0xD6, 0xD6, 0xD6),
};

const WINDOWS_LAYOUT: FrameLayout = FrameLayout {
    header_height: 32,
    url_bar_height: 26,
    url_bar_margin: 6,
    corner_radius: 0.0,
    url_bar_radius: 0.0,
    background: Rgba::opaque(0xF3, 0xF3, 0xF3),
    separator: Rgba::opaque(0xDD, 0xDD, 0xDD),
    url_bar_border: Rgba::opaque(0xCC, 0xCC, 0xCC),
};

const MAC_BUTTON_COLORS: [Rgba; 3] = [
    Rgba::opaque(0xFF, 0x5F, 0x57),
    Rgba::opaque(0xFE, 0xBC, 0x2E),
    Rgba::opaque(0x28, 0xC8, 0x40),
];
const MAC_BUTTON_RADIUS: f32 = 6.0;
const MAC_BUTTON_SPACING: f32 = 20.0;
const MAC_BUTTON_OFFSET: f32 = 20.0;

const WINDOWS_BUTTON_WIDTH: f32 = 46.0;
const WINDOWS_GLYPH_SIZE: f32 = 10.0;
const WINDOWS_GLYPH_COLOR: Rgba = Rgba::opaque(0x33, 0x33, 0x33);

const DATE_FONT_SIZE: f32 = 12.0;
const DATE_COLOR: Rgba = Rgba::opaque(0x6E, 0x6E, 0x6E);
const DATE_RIGHT_INSET: f32 = 16.0;
const URL_FONT_SIZE: f32 = 13.0;
const URL_COLOR: Rgba = Rgba::opaque(0x33, 0x33, 0x33);
const URL_TEXT_INSET: f32 = 12.0;

impl BaseStyle {
    fn layout(self) -> &'static FrameLayout {
        match self {
            Self::Mac => &MAC_LAYOUT,
            Self::Windows => &WINDOWS_LAYOUT,
        }
    }
}

impl FrameStyle {
    /// `url_top` / `url_bottom` 没有 Windows 变体，固定为 mac 外观。
    pub fn base_style(self) -> BaseStyle {
        match self {
            Self::Windows => BaseStyle::Windows,
            Self::Mac | Self::UrlTop | Self::UrlBottom => BaseStyle::Mac,
        }
    }

    /// 地址栏样式无视 `include_url`，始终显示地址栏。
    pub fn effective_show_url(self, include_url: bool) -> bool {
        match self {
            Self::UrlTop | Self::UrlBottom => true,
            Self::Mac | Self::Windows => include_url,
        }
    }

    /// 边框是否画在截图下方。
    pub fn is_bottom(self) -> bool {
        matches!(self, Self::UrlBottom)
    }
}

/// 标题栏高度，无需渲染即可计算。
pub fn get_header_height(style: BaseStyle, show_url: bool) -> u32 {
    let layout = style.layout();
    let url_part = if show_url {
        layout.url_bar_height + 2 * layout.url_bar_margin
    } else {
        0
    };
    layout.header_height + url_part
}

/// 按边框配置计算标题栏高度。
pub fn frame_header_height(frame: &BrowserFrame) -> u32 {
    get_header_height(
        frame.style.base_style(),
        frame.style.effective_show_url(frame.include_url),
    )
}

/// 截断过长的地址。
pub fn truncate_url(url: &str) -> String {
    if url.chars().count() <= URL_MAX_CHARS {
        return url.to_string();
    }
    let mut truncated: String = url.chars().take(URL_MAX_CHARS).collect();
    truncated.push_str(URL_ELLIPSIS);
    truncated
}

/// 当天日期，按系统区域格式化。
pub fn current_date_text() -> String {
    format_date(&Local::now(), system_locale())
}

/// 按区域的日期格式（`%x`）输出。
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>, locale: Locale) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format_localized("%x", locale).to_string()
}

/// 从环境变量推断区域，优先级 `LC_ALL` > `LC_TIME` > `LANG`。
pub fn system_locale() -> Locale {
    ["LC_ALL", "LC_TIME", "LANG"]
        .iter()
        .filter_map(|key| std::env::var(key).ok())
        .find(|value| !value.trim().is_empty())
        .and_then(|value| locale_from_env(&value))
        .unwrap_or(Locale::POSIX)
}

/// `de_DE.UTF-8`、`zh_CN@euro` 之类的取值去掉编码与修饰后解析。
fn locale_from_env(value: &str) -> Option<Locale> {
    let name = value.trim().split(['.', '@']).next()?;
    Locale::try_from(name).ok()
}

/// 渲染完成的标题栏。
#[derive(Debug, Clone)]
pub struct HeaderImage {
    pub bitmap: RgbaImage,
    pub style: BaseStyle,
    pub show_url: bool,
}

impl HeaderImage {
    pub fn width(&self) -> u32 {
        self.bitmap.width()
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }
}

/// 构建标题栏场景。
///
/// `date` 为 `None` 时不画日期。
pub fn build_header_scene(
    width: u32,
    style: BaseStyle,
    show_url: bool,
    url: &str,
    date: Option<&str>,
) -> Scene {
    let layout = style.layout();
    let height = get_header_height(style, show_url);
    let w = width as f32;
    let title_mid = layout.header_height as f32 / 2.0;

    let mut scene = Scene::new(width, height);
    scene.push(DrawCommand::Rect {
        x: 0.0,
        y: 0.0,
        width: w,
        height: height as f32,
        radius: layout.corner_radius,
        fill: layout.background,
        stroke: None,
    });

    let date_right = match style {
        BaseStyle::Mac => {
            for (i, color) in MAC_BUTTON_COLORS.iter().enumerate() {
                scene.push(DrawCommand::Circle {
                    cx: MAC_BUTTON_OFFSET + i as f32 * MAC_BUTTON_SPACING,
                    cy: title_mid,
                    radius: MAC_BUTTON_RADIUS,
                    fill: *color,
                });
            }
            w - DATE_RIGHT_INSET
        }
        BaseStyle::Windows => {
            push_windows_buttons(&mut scene, w, title_mid);
            w - 3.0 * WINDOWS_BUTTON_WIDTH - DATE_RIGHT_INSET
        }
    };

    if let Some(date) = date {
        scene.push(DrawCommand::Text {
            x: date_right,
            y: title_mid + DATE_FONT_SIZE * 0.35,
            content: date.to_string(),
            font_size: DATE_FONT_SIZE,
            color: DATE_COLOR,
            anchor: TextAnchor::End,
        });
    }

    if show_url {
        let margin = layout.url_bar_margin as f32;
        let bar_y = layout.header_height as f32 + margin;
        let bar_h = layout.url_bar_height as f32;

        scene.push(DrawCommand::Rect {
            x: margin,
            y: bar_y,
            width: (w - 2.0 * margin).max(0.0),
            height: bar_h,
            radius: layout.url_bar_radius,
            fill: Rgba::WHITE,
            stroke: Some(Stroke {
                color: layout.url_bar_border,
                width: 1.0,
            }),
        });

        if !url.is_empty() {
            scene.push(DrawCommand::Text {
                x: margin + URL_TEXT_INSET,
                y: bar_y + bar_h / 2.0 + URL_FONT_SIZE * 0.35,
                content: truncate_url(url),
                font_size: URL_FONT_SIZE,
                color: URL_COLOR,
                anchor: TextAnchor::Start,
            });
        }
    }

    scene.push(DrawCommand::Line {
        x1: 0.0,
        y1: height as f32 - 0.5,
        x2: w,
        y2: height as f32 - 0.5,
        stroke: Stroke {
            color: layout.separator,
            width: 1.0,
        },
    });

    scene
}

fn push_windows_buttons(scene: &mut Scene, w: f32, mid: f32) {
    let glyph = Stroke {
        color: WINDOWS_GLYPH_COLOR,
        width: 1.0,
    };
    let half = WINDOWS_GLYPH_SIZE / 2.0;
    let center = |slot: f32| w - WINDOWS_BUTTON_WIDTH * slot + WINDOWS_BUTTON_WIDTH / 2.0;

    // 最小化
    let cx = center(3.0);
    scene.push(DrawCommand::Line {
        x1: cx - half,
        y1: mid,
        x2: cx + half,
        y2: mid,
        stroke: glyph,
    });

    // 最大化
    let cx = center(2.0);
    scene.push(DrawCommand::Rect {
        x: cx - half,
        y: mid - half,
        width: WINDOWS_GLYPH_SIZE,
        height: WINDOWS_GLYPH_SIZE,
        radius: 0.0,
        fill: Rgba::TRANSPARENT,
        stroke: Some(glyph),
    });

    // 关闭
    let cx = center(1.0);
    scene.push(DrawCommand::Line {
        x1: cx - half,
        y1: mid - half,
        x2: cx + half,
        y2: mid + half,
        stroke: glyph,
    });
    scene.push(DrawCommand::Line {
        x1: cx - half,
        y1: mid + half,
        x2: cx + half,
        y2: mid - half,
        stroke: glyph,
    });
}

/// 按边框配置生成标题栏，日期取当天。
pub fn generate_frame(width: u32, frame: &BrowserFrame) -> Result<HeaderImage, ExportError> {
    let date = frame.include_date.then(current_date_text);
    generate_frame_with_date(width, frame, date.as_deref())
}

/// 按边框配置生成标题栏，日期由调用方给出（`include_date` 为假时忽略）。
pub fn generate_frame_with_date(
    width: u32,
    frame: &BrowserFrame,
    date: Option<&str>,
) -> Result<HeaderImage, ExportError> {
    let style = frame.style.base_style();
    let show_url = frame.style.effective_show_url(frame.include_url);
    let date = if frame.include_date { date } else { None };

    let scene = build_header_scene(width, style, show_url, &frame.url, date);
    let bitmap = scene
        .rasterize()
        .map_err(|msg| ExportError::effect(EffectKind::Frame, msg))?;

    let expected = get_header_height(style, show_url);
    if bitmap.height() != expected || bitmap.width() != width {
        return Err(ExportError::effect(
            EffectKind::Frame,
            format!(
                "标题栏尺寸异常：{}x{}（预期 {}x{}）",
                bitmap.width(),
                bitmap.height(),
                width,
                expected
            ),
        ));
    }

    log::debug!(
        "🧭 标题栏渲染完成 - style={:?} show_url={} size={}x{}",
        style,
        show_url,
        width,
        expected
    );

    Ok(HeaderImage {
        bitmap,
        style,
        show_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn frame(style: FrameStyle, include_url: bool) -> BrowserFrame {
        BrowserFrame {
            style,
            include_url,
            include_date: false,
            url: "https://example.com/page".to_string(),
        }
    }

    #[test]
    fn header_heights_follow_layout_constants() {
        assert_eq!(get_header_height(BaseStyle::Mac, false), 40);
        assert_eq!(get_header_height(BaseStyle::Mac, true), 84);
        assert_eq!(get_header_height(BaseStyle::Windows, false), 32);
        assert_eq!(get_header_height(BaseStyle::Windows, true), 70);
    }

    #[test]
    fn url_styles_force_mac_and_url_bar() {
        for style in [FrameStyle::UrlTop, FrameStyle::UrlBottom] {
            assert_eq!(style.base_style(), BaseStyle::Mac);
            assert!(style.effective_show_url(false));
            assert_eq!(frame_header_height(&frame(style, false)), 84);
        }
        assert!(!FrameStyle::Windows.effective_show_url(false));
        assert!(FrameStyle::UrlBottom.is_bottom());
        assert!(!FrameStyle::UrlTop.is_bottom());
    }

    #[test]
    fn long_urls_are_truncated() {
        let long = "x".repeat(80);
        let truncated = truncate_url(&long);
        assert_eq!(truncated.chars().count(), URL_MAX_CHARS + URL_ELLIPSIS.len());
        assert!(truncated.ends_with("..."));

        let exact = "y".repeat(URL_MAX_CHARS);
        assert_eq!(truncate_url(&exact), exact);

        let wide = "网".repeat(60);
        assert!(truncate_url(&wide).starts_with(&"网".repeat(50)));
    }

    #[test]
    fn scene_carries_truncated_url_and_date() {
        let url = format!("https://example.com/{}", "a".repeat(100));
        let scene = build_header_scene(800, BaseStyle::Mac, true, &url, Some("2026/10/19"));
        let texts: Vec<&str> = scene.texts().collect();

        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "2026/10/19");
        assert_eq!(texts[1], truncate_url(&url));
    }

    #[test]
    fn date_is_omitted_when_disabled() {
        let header = frame(FrameStyle::Mac, false);
        let rendered =
            generate_frame_with_date(200, &header, Some("ignored")).expect("frame should render");
        assert_eq!(rendered.height(), 40);

        let scene = build_header_scene(200, BaseStyle::Mac, false, "", None);
        assert_eq!(scene.texts().count(), 0);
    }

    #[test]
    fn rendered_height_matches_height_function() {
        for width in [100, 800, 1920] {
            for style in [FrameStyle::Mac, FrameStyle::Windows] {
                for show_url in [false, true] {
                    let header = frame(style, show_url);
                    let rendered = generate_frame_with_date(width, &header, None)
                        .expect("frame should render");

                    let expected = get_header_height(style.base_style(), show_url);
                    assert_eq!(rendered.height(), expected);
                    assert_eq!(rendered.width(), width);

                    let mid = width / 2;
                    assert!(rendered.bitmap.get_pixel(mid, 0).0[3] > 0);
                    assert!(rendered.bitmap.get_pixel(mid, expected - 1).0[3] > 0);
                }
            }
        }
    }

    #[test]
    fn date_follows_locale_format() {
        let at = Utc
            .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
            .single()
            .expect("valid timestamp");

        assert_eq!(format_date(&at, Locale::de_DE), "19.10.2026");
        assert_eq!(format_date(&at, Locale::POSIX), "10/19/26");
    }

    #[test]
    fn locale_names_are_read_from_env_values() {
        let at = Utc
            .with_ymd_and_hms(2026, 10, 19, 8, 30, 0)
            .single()
            .expect("valid timestamp");

        let de = locale_from_env("de_DE.UTF-8").expect("de_DE should be known");
        assert_eq!(format_date(&at, de), "19.10.2026");
        assert!(locale_from_env("xx_NOPE").is_none());
    }
}
