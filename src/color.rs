//! # 颜色模型
//!
//! ## 设计思路
//!
//! 配置面板传来的颜色都是字符串（`#RGB` / `#RRGGBBAA` / `rgba(...)`），
//! 而内边距填充、水印合成、浏览器边框渲染都需要精确的 RGBA 通道值。
//! 这里统一负责“字符串 ↔ 通道”的转换。
//!
//! ## 实现思路
//!
//! - 解析失败返回 `None`，从不 panic，调用方把“无法解析”当作校验状态处理。
//! - 比较基于解析后的通道，而不是字符串本身（`#FFF` 等于 `#FFFFFF`）。
//! - `rgba()` 的 alpha 以 `[0,1]` 浮点给出，内部按 `round(a * 255)` 存储。

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// 8 位直通（非预乘）RGBA 颜色。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::opaque(255, 255, 255);
    pub const BLACK: Rgba = Rgba::opaque(0, 0, 0);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn is_opaque(self) -> bool {
        self.a == 255
    }

    /// alpha 通道的 `[0,1]` 浮点表示。
    pub fn alpha_f32(self) -> f32 {
        self.a as f32 / 255.0
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn from_pixel(pixel: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        Self { r, g, b, a }
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_hex(*self))
    }
}

impl Serialize for Rgba {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format_hex(*self))
    }
}

impl<'de> Deserialize<'de> for Rgba {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse_color(&raw).ok_or_else(|| serde::de::Error::custom(format!("无法解析的颜色：{}", raw)))
    }
}

/// 解析颜色字符串。
///
/// 支持 `#RGB`、`#RGBA`、`#RRGGBB`、`#RRGGBBAA`、`rgb(r,g,b)`、`rgba(r,g,b,a)`。
/// 语法错误或通道越界时返回 `None`。
///
/// # 示例
/// ```rust
/// use screenshot_export::color::{parse_color, Rgba};
///
/// assert_eq!(parse_color("#fff"), Some(Rgba::WHITE));
/// assert_eq!(parse_color("rgba(0, 0, 0, 0.5)"), Some(Rgba::new(0, 0, 0, 128)));
/// assert_eq!(parse_color("rgb(300,0,0)"), None);
/// ```
pub fn parse_color(input: &str) -> Option<Rgba> {
    let trimmed = input.trim();

    if let Some(hex) = trimmed.strip_prefix('#') {
        return parse_hex_digits(hex);
    }

    let lower = trimmed.to_ascii_lowercase();
    if let Some(inner) = strip_function(&lower, "rgba") {
        return parse_channel_list(inner, true);
    }
    if let Some(inner) = strip_function(&lower, "rgb") {
        return parse_channel_list(inner, false);
    }

    None
}

/// 输出十六进制形式；完全不透明时省略 alpha 对。
pub fn format_hex(color: Rgba) -> String {
    if color.is_opaque() {
        format!("#{:02X}{:02X}{:02X}", color.r, color.g, color.b)
    } else {
        format!(
            "#{:02X}{:02X}{:02X}{:02X}",
            color.r, color.g, color.b, color.a
        )
    }
}

/// 输出 `rgba(r, g, b, a)` 形式，alpha 最多保留三位小数。
pub fn format_rgba(color: Rgba) -> String {
    let alpha = format!("{:.3}", color.alpha_f32());
    let alpha = alpha.trim_end_matches('0').trim_end_matches('.');
    format!("rgba({}, {}, {}, {})", color.r, color.g, color.b, alpha)
}

/// 按解析后的通道比较两个颜色字符串；任一无法解析时视为不相等。
pub fn colors_equal(a: &str, b: &str) -> bool {
    match (parse_color(a), parse_color(b)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

fn strip_function<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input
        .strip_prefix(name)?
        .trim_start()
        .strip_prefix('(')?
        .strip_suffix(')')
}

fn parse_hex_digits(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok();
    let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 | 4 => {
            let mut channels = [255u8; 4];
            for (i, slot) in channels.iter_mut().enumerate().take(hex.len()) {
                let v = nibble(i)?;
                *slot = v * 17;
            }
            Some(Rgba::new(channels[0], channels[1], channels[2], channels[3]))
        }
        6 | 8 => {
            let a = if hex.len() == 8 { pair(6)? } else { 255 };
            Some(Rgba::new(pair(0)?, pair(2)?, pair(4)?, a))
        }
        _ => None,
    }
}

fn parse_channel_list(inner: &str, with_alpha: bool) -> Option<Rgba> {
    let parts: Vec<&str> = inner.split(',').map(str::trim).collect();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let r = parse_rgb_channel(parts[0])?;
    let g = parse_rgb_channel(parts[1])?;
    let b = parse_rgb_channel(parts[2])?;
    let a = if with_alpha {
        parse_alpha_channel(parts[3])?
    } else {
        255
    };

    Some(Rgba::new(r, g, b, a))
}

fn parse_rgb_channel(part: &str) -> Option<u8> {
    let value: f64 = part.parse().ok()?;
    if !value.is_finite() || !(0.0..=255.0).contains(&value) {
        return None;
    }
    Some(value.round() as u8)
}

fn parse_alpha_channel(part: &str) -> Option<u8> {
    let value: f64 = part.parse().ok()?;
    if !value.is_finite() || !(0.0..=1.0).contains(&value) {
        return None;
    }
    Some((value * 255.0).round() as u8)
}
