//! # 合成编排模块
//!
//! ## 设计思路
//!
//! `ExportPipeline` 只负责流程编排，本身不持有任何可变状态，
//! 每次 `compose` 都是 `(源图, 配置) → 结果` 的纯函数：
//! 1. 解析配置，计算最终尺寸（不渲染即可得出）
//! 2. 解码源图
//! 3. 申请画布并填充底色（内边距颜色或白色）
//! 4. 按样式放置标题栏与截图（二者互不重叠）
//! 5. 最后绘制水印
//!
//! ## 实现思路
//!
//! - 解码按 源图 → 标题栏 → 水印 的固定顺序逐个 `await`。
//! - 任一效果失败即整体失败，不返回缺层的结果。
//! - 记录 `decode/frame/watermark/total` 阶段耗时，便于性能诊断。
//! - 画布是局部变量，任何退出路径上都会被释放。

use std::time::Instant;

use image::RgbaImage;

use super::config::{BrowserFrame, Effect, ExportConfig, ExportSettings};
use super::frame::{HeaderImage, current_date_text, frame_header_height, generate_frame_with_date};
use super::loader::DecodeStage;
use super::source::{Dimensions, ExportResult, ImageSource};
use super::surface::Surface;
use super::{EffectKind, ExportError, PipelineLimits, padding, watermark};

/// 根据源图尺寸与配置推导最终画布尺寸，不做任何渲染。
///
/// ```text
/// finalWidth  = sourceWidth  + 2 * padding
/// finalHeight = sourceHeight + frameHeaderHeight + 2 * padding
/// ```
pub fn calculate_final_dimensions(
    source_width: u32,
    source_height: u32,
    settings: &ExportSettings,
) -> Dimensions {
    let header = header_height(&settings.frame);
    padding::compute_padded_dimensions(
        source_width,
        source_height.saturating_add(header),
        &settings.padding,
    )
}

fn header_height(frame: &Effect<BrowserFrame>) -> u32 {
    frame.as_enabled().map(frame_header_height).unwrap_or(0)
}

/// 各图层在最终画布上的左上角坐标。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerOffsets {
    pub source: (u32, u32),
    pub header: Option<(u32, u32)>,
}

/// 计算截图与标题栏的位置。
///
/// - 无边框：截图位于 `(p, p)`
/// - 顶部边框：标题栏 `(p, p)`，截图 `(p, p + header)`
/// - `url_bottom`：截图 `(p, p)`，标题栏 `(p, p + sourceHeight)`
pub fn layer_offsets(source_height: u32, settings: &ExportSettings) -> LayerOffsets {
    let p = padding::effective_size(&settings.padding);

    match settings.frame.as_enabled() {
        None => LayerOffsets {
            source: (p, p),
            header: None,
        },
        Some(frame) if frame.style.is_bottom() => LayerOffsets {
            source: (p, p),
            header: Some((p, p + source_height)),
        },
        Some(frame) => LayerOffsets {
            source: (p, p + frame_header_height(frame)),
            header: Some((p, p)),
        },
    }
}

/// 截图导出流水线。
///
/// 封装资源限制与可选的固定日期，并编排各子模块实现完整合成。
#[derive(Debug, Clone, Default)]
pub struct ExportPipeline {
    pub(super) limits: PipelineLimits,
    fixed_date: Option<String>,
}

impl ExportPipeline {
    /// 根据资源限制创建流水线。
    ///
    /// # 示例
    /// ```rust
    /// use screenshot_export::export::{ExportPipeline, PipelineLimits};
    ///
    /// let pipeline = ExportPipeline::new(PipelineLimits::default());
    /// assert!(pipeline.limits().max_canvas_dimension > 0);
    /// ```
    pub fn new(limits: PipelineLimits) -> Self {
        Self {
            limits,
            fixed_date: None,
        }
    }

    /// 固定标题栏日期文本，使输出可逐像素复现。
    pub fn with_fixed_date(mut self, date: impl Into<String>) -> Self {
        self.fixed_date = Some(date.into());
        self
    }

    pub fn limits(&self) -> &PipelineLimits {
        &self.limits
    }

    /// 处理主入口：解析线上格式配置后合成。
    ///
    /// # 示例
    /// ```rust,no_run
    /// use screenshot_export::export::{ExportConfig, ExportPipeline, ImageSource};
    ///
    /// # async fn demo() -> Result<(), screenshot_export::export::ExportError> {
    /// let pipeline = ExportPipeline::default();
    /// let result = pipeline
    ///     .compose(ImageSource::FilePath("shot.png".into()), &ExportConfig::default())
    ///     .await?;
    /// println!("{}x{}", result.width, result.height);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn compose(
        &self,
        source: ImageSource,
        config: &ExportConfig,
    ) -> Result<ExportResult, ExportError> {
        let settings = config.resolve()?;
        self.compose_with(source, &settings).await
    }

    /// 使用已解析的参数合成。
    pub async fn compose_with(
        &self,
        source: ImageSource,
        settings: &ExportSettings,
    ) -> Result<ExportResult, ExportError> {
        let total_start = Instant::now();

        let decode_start = Instant::now();
        let bitmap = self.decode_bitmap(source, DecodeStage::Source).await?;
        let decode_elapsed = decode_start.elapsed();

        let (source_width, source_height) = bitmap.dimensions();
        let final_size = calculate_final_dimensions(source_width, source_height, settings);
        let offsets = layer_offsets(source_height, settings);

        log::debug!(
            "📐 布局 - 源图 {}x{} 最终 {}x{} 截图偏移 {:?} 标题栏偏移 {:?}",
            source_width,
            source_height,
            final_size.width,
            final_size.height,
            offsets.source,
            offsets.header
        );

        let mut surface = Surface::acquire(final_size, &self.limits)?;
        padding::fill_background(&mut surface, &settings.padding);

        let frame_start = Instant::now();
        let header = match settings.frame.as_enabled() {
            Some(frame) => Some(self.render_header(source_width, frame).await?),
            None => None,
        };
        let frame_elapsed = frame_start.elapsed();

        match (&header, offsets.header) {
            (Some(header), Some((hx, hy))) if !is_bottom(settings) => {
                surface.draw_image(&header.bitmap, hx as i64, hy as i64);
                Self::draw_source(&mut surface, &bitmap, offsets.source);
            }
            (Some(header), Some((hx, hy))) => {
                Self::draw_source(&mut surface, &bitmap, offsets.source);
                surface.draw_image(&header.bitmap, hx as i64, hy as i64);
            }
            _ => Self::draw_source(&mut surface, &bitmap, offsets.source),
        }
        drop(bitmap);
        drop(header);

        let watermark_start = Instant::now();
        if let Some(wm) = settings.watermark.as_enabled() {
            if watermark::has_image(wm) {
                let overlay = self
                    .decode_bitmap(
                        ImageSource::Base64(wm.image_data.clone()),
                        DecodeStage::Effect(EffectKind::Watermark),
                    )
                    .await?;
                watermark::apply_watermark(
                    &mut surface,
                    &overlay,
                    wm,
                    self.limits.watermark_filter,
                    self.limits.max_canvas_dimension,
                );
            } else {
                log::warn!("⚠️ 水印已启用但未提供图片，跳过水印图层");
            }
        }
        let watermark_elapsed = watermark_start.elapsed();

        let composed = surface.finish()?;
        if composed.dimensions() != (final_size.width, final_size.height) {
            return Err(ExportError::RenderSurfaceUnavailable(format!(
                "合成尺寸与预测不一致：{}x{}（预测 {}x{}）",
                composed.width(),
                composed.height(),
                final_size.width,
                final_size.height
            )));
        }

        log::info!(
            "✅ 截图合成完成 - {}x{} decode={}ms frame={}ms watermark={}ms total={}ms",
            final_size.width,
            final_size.height,
            decode_elapsed.as_millis(),
            frame_elapsed.as_millis(),
            watermark_elapsed.as_millis(),
            total_start.elapsed().as_millis()
        );

        Ok(ExportResult {
            bitmap: composed,
            width: final_size.width,
            height: final_size.height,
            format: settings.format,
            quality: settings.quality,
        })
    }

    /// 在阻塞线程中栅格化标题栏。
    async fn render_header(
        &self,
        width: u32,
        frame: &BrowserFrame,
    ) -> Result<HeaderImage, ExportError> {
        let frame = frame.clone();
        let date = if frame.include_date {
            Some(self.fixed_date.clone().unwrap_or_else(current_date_text))
        } else {
            None
        };

        tokio::task::spawn_blocking(move || generate_frame_with_date(width, &frame, date.as_deref()))
            .await
            .map_err(|e| ExportError::Task(format!("标题栏渲染线程执行失败：{}", e)))?
    }

    fn draw_source(surface: &mut Surface, bitmap: &RgbaImage, (x, y): (u32, u32)) {
        surface.draw_image(bitmap, x as i64, y as i64);
    }
}

fn is_bottom(settings: &ExportSettings) -> bool {
    settings
        .frame
        .as_enabled()
        .is_some_and(|frame| frame.style.is_bottom())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgba;
    use crate::export::config::{FrameStyle, OutputFormat, Padding, Watermark, WatermarkPosition};
    use base64::{Engine as _, engine::general_purpose};
    use image::{DynamicImage, ImageBuffer, ImageFormat};
    use std::io::Cursor;

    fn create_png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = ImageBuffer::from_pixel(width, height, image::Rgba(color));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut cursor, ImageFormat::Png)
            .expect("failed to encode test image");
        cursor.into_inner()
    }

    fn settings(padding: u32, style: Option<FrameStyle>) -> ExportSettings {
        ExportSettings {
            padding: if padding > 0 {
                Effect::Enabled(Padding {
                    color: Rgba::opaque(0, 0, 255),
                    size: padding,
                })
            } else {
                Effect::Disabled
            },
            frame: match style {
                Some(style) => Effect::Enabled(BrowserFrame {
                    style,
                    include_url: true,
                    include_date: false,
                    url: "https://example.com".to_string(),
                }),
                None => Effect::Disabled,
            },
            watermark: Effect::Disabled,
            format: OutputFormat::Png,
            quality: 0.92,
        }
    }

    #[test]
    fn dimensions_add_header_and_padding() {
        assert_eq!(
            calculate_final_dimensions(1280, 720, &settings(20, Some(FrameStyle::Mac))),
            Dimensions::new(1320, 720 + 84 + 40)
        );
        assert_eq!(
            calculate_final_dimensions(1280, 720, &settings(0, Some(FrameStyle::Windows))),
            Dimensions::new(1280, 720 + 70)
        );
        assert_eq!(
            calculate_final_dimensions(10, 10, &settings(0, None)),
            Dimensions::new(10, 10)
        );
    }

    #[test]
    fn offsets_follow_frame_position() {
        let top = layer_offsets(600, &settings(10, Some(FrameStyle::Mac)));
        assert_eq!(top.header, Some((10, 10)));
        assert_eq!(top.source, (10, 94));

        let bottom = layer_offsets(600, &settings(10, Some(FrameStyle::UrlBottom)));
        assert_eq!(bottom.source, (10, 10));
        assert_eq!(bottom.header, Some((10, 610)));

        let plain = layer_offsets(600, &settings(10, None));
        assert_eq!(plain.source, (10, 10));
        assert_eq!(plain.header, None);
    }

    #[tokio::test]
    async fn padding_surrounds_source() {
        let pipeline = ExportPipeline::default();
        let result = pipeline
            .compose_with(
                ImageSource::Bytes(create_png_bytes(10, 10, [255, 0, 0, 255])),
                &settings(5, None),
            )
            .await
            .expect("compose should succeed");

        assert_eq!((result.width, result.height), (20, 20));
        assert_eq!(result.bitmap.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(result.bitmap.get_pixel(5, 5).0, [255, 0, 0, 255]);
        assert_eq!(result.bitmap.get_pixel(14, 14).0, [255, 0, 0, 255]);
        assert_eq!(result.bitmap.get_pixel(15, 15).0, [0, 0, 255, 255]);
    }

    #[tokio::test]
    async fn watermark_without_image_is_a_no_op() {
        let mut cfg = settings(0, None);
        cfg.watermark = Effect::Enabled(Watermark {
            image_data: String::new(),
            position: WatermarkPosition::Center,
            size: 100,
            opacity: 100,
        });

        let source = create_png_bytes(30, 30, [10, 20, 30, 255]);
        let result = ExportPipeline::default()
            .compose_with(ImageSource::Bytes(source), &cfg)
            .await
            .expect("empty watermark must not fail");

        assert!(result.bitmap.pixels().all(|p| p.0 == [10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn broken_watermark_fails_the_export() {
        let mut cfg = settings(0, None);
        cfg.watermark = Effect::Enabled(Watermark {
            image_data: format!(
                "data:image/png;base64,{}",
                general_purpose::STANDARD.encode(b"not a png at all")
            ),
            position: WatermarkPosition::Center,
            size: 100,
            opacity: 100,
        });

        let result = ExportPipeline::default()
            .compose_with(ImageSource::Bytes(create_png_bytes(30, 30, [0, 0, 0, 255])), &cfg)
            .await;

        assert!(matches!(
            result,
            Err(ExportError::EffectDecode {
                effect: EffectKind::Watermark,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn undecodable_source_is_reported() {
        let result = ExportPipeline::default()
            .compose_with(ImageSource::Bytes(b"garbage".to_vec()), &settings(0, None))
            .await;

        assert!(matches!(result, Err(ExportError::SourceDecode(_))));
    }

    #[tokio::test]
    async fn oversized_canvas_is_unavailable() {
        let limits = PipelineLimits {
            max_canvas_dimension: 50,
            ..PipelineLimits::default()
        };
        let result = ExportPipeline::new(limits)
            .compose_with(
                ImageSource::Bytes(create_png_bytes(40, 40, [0, 0, 0, 255])),
                &settings(10, None),
            )
            .await;

        assert!(matches!(result, Err(ExportError::RenderSurfaceUnavailable(_))));
    }
}
