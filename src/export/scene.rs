//! # 场景描述与栅格化
//!
//! ## 设计思路
//!
//! 浏览器边框不直接拼接矢量标记字符串，而是先生成一组有类型的绘制指令
//! （矩形、圆、线、文本），再由本模块统一栅格化。
//! 文本转义只在 `Text` 指令的序列化里发生，其他指令不涉及用户输入。
//!
//! ## 实现思路
//!
//! - 指令列表序列化为 SVG 文档后交给 `usvg` 解析、`resvg` 渲染到 `tiny_skia::Pixmap`。
//! - Pixmap 的尺寸就是场景尺寸，输出位图的宽高因此与场景声明严格一致。
//! - 字体库只在首次使用时加载一次系统字体，之后只读共享。

use std::sync::Arc;

use image::RgbaImage;
use once_cell::sync::Lazy;

use crate::color::Rgba;

static FONT_DB: Lazy<Arc<usvg::fontdb::Database>> = Lazy::new(|| {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    log::debug!("🔤 已加载系统字体 {} 个", db.faces().count());
    Arc::new(db)
});

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgba,
    pub width: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    End,
}

/// 单条绘制指令，坐标以场景左上角为原点。
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        radius: f32,
        fill: Rgba,
        stroke: Option<Stroke>,
    },
    Circle {
        cx: f32,
        cy: f32,
        radius: f32,
        fill: Rgba,
    },
    Line {
        x1: f32,
        y1: f32,
        x2: f32,
        y2: f32,
        stroke: Stroke,
    },
    Text {
        x: f32,
        /// 基线位置。
        y: f32,
        content: String,
        font_size: f32,
        color: Rgba,
        anchor: TextAnchor,
    },
}

/// 固定尺寸的场景。
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub commands: Vec<DrawCommand>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// 场景内所有文本内容，按绘制顺序。
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|cmd| match cmd {
            DrawCommand::Text { content, .. } => Some(content.as_str()),
            _ => None,
        })
    }

    /// 序列化为 SVG 文档。
    pub fn to_svg(&self) -> String {
        let mut svg = format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
            w = self.width,
            h = self.height
        );

        for command in &self.commands {
            svg.push_str(&command_to_svg(command));
        }

        svg.push_str("</svg>");
        svg
    }

    /// 栅格化为直通 alpha 的 RGBA 位图，尺寸恒为 `width x height`。
    pub fn rasterize(&self) -> Result<RgbaImage, String> {
        let options = usvg::Options {
            fontdb: FONT_DB.clone(),
            ..Default::default()
        };

        let svg = self.to_svg();
        let tree = usvg::Tree::from_str(&svg, &options)
            .map_err(|e| format!("场景解析失败：{}", e))?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(self.width, self.height)
            .ok_or_else(|| format!("无法申请 {}x{} 的场景画布", self.width, self.height))?;

        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );

        let mut bytes = Vec::with_capacity(pixmap.pixels().len() * 4);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            bytes.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }

        RgbaImage::from_raw(self.width, self.height, bytes)
            .ok_or_else(|| "场景像素长度与尺寸不一致".to_string())
    }
}

fn paint_attrs(prefix: &str, color: Rgba) -> String {
    format!(
        r#"{prefix}="rgb({},{},{})" {prefix}-opacity="{}""#,
        color.r,
        color.g,
        color.b,
        color.alpha_f32()
    )
}

fn stroke_attrs(stroke: Option<Stroke>) -> String {
    match stroke {
        Some(s) => format!(r#" {} stroke-width="{}""#, paint_attrs("stroke", s.color), s.width),
        None => String::new(),
    }
}

fn command_to_svg(command: &DrawCommand) -> String {
    match command {
        DrawCommand::Rect {
            x,
            y,
            width,
            height,
            radius,
            fill,
            stroke,
        } => format!(
            r#"<rect x="{x}" y="{y}" width="{width}" height="{height}" rx="{radius}" {}{}/>"#,
            paint_attrs("fill", *fill),
            stroke_attrs(*stroke)
        ),
        DrawCommand::Circle {
            cx,
            cy,
            radius,
            fill,
        } => format!(
            r#"<circle cx="{cx}" cy="{cy}" r="{radius}" {}/>"#,
            paint_attrs("fill", *fill)
        ),
        DrawCommand::Line {
            x1,
            y1,
            x2,
            y2,
            stroke,
        } => format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}"{}/>"#,
            stroke_attrs(Some(*stroke))
        ),
        DrawCommand::Text {
            x,
            y,
            content,
            font_size,
            color,
            anchor,
        } => {
            let anchor = match anchor {
                TextAnchor::Start => "start",
                TextAnchor::End => "end",
            };
            format!(
                r#"<text x="{x}" y="{y}" font-family="sans-serif" font-size="{font_size}" text-anchor="{anchor}" {}>{}</text>"#,
                paint_attrs("fill", *color),
                escape_text(content)
            )
        }
    }
}

/// XML 文本转义。
///
/// 空白类控制字符（`\t` `\n` `\r`）折叠为空格，其余控制字符与
/// `U+FFFE` / `U+FFFF` 直接丢弃，保证任意输入都能生成合法文档。
fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\t' | '\n' | '\r' => out.push(' '),
            '\u{FFFE}' | '\u{FFFF}' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    out
}
