//! # 输出编码
//!
//! 把合成结果编码为 PNG / JPEG 字节或 Data URL，供剪贴板、下载和预览使用。
//! JPEG 不支持透明通道，编码前直接丢弃 alpha。

use base64::{Engine as _, engine::general_purpose};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder};

use super::config::OutputFormat;
use super::source::ExportResult;
use crate::delivery::DeliveryError;

/// `[0,1]` 质量映射到 JPEG 编码器的 `1..=100`。
pub fn jpeg_quality(quality: f64) -> u8 {
    (crate::clamp::clamp_quality(quality) * 100.0).round().clamp(1.0, 100.0) as u8
}

impl ExportResult {
    /// 按结果自带的格式与质量编码。
    pub fn encode(&self) -> Result<Vec<u8>, DeliveryError> {
        let mut buf = Vec::new();

        match self.format {
            OutputFormat::Png => {
                PngEncoder::new(&mut buf)
                    .write_image(
                        self.bitmap.as_raw(),
                        self.width,
                        self.height,
                        ColorType::Rgba8.into(),
                    )
                    .map_err(|e| DeliveryError::Encode(format!("PNG 编码失败：{}", e)))?;
            }
            OutputFormat::Jpeg => {
                let rgb = DynamicImage::ImageRgba8(self.bitmap.clone()).to_rgb8();
                JpegEncoder::new_with_quality(&mut buf, jpeg_quality(self.quality))
                    .write_image(rgb.as_raw(), self.width, self.height, ColorType::Rgb8.into())
                    .map_err(|e| DeliveryError::Encode(format!("JPEG 编码失败：{}", e)))?;
            }
        }

        log::debug!(
            "📦 编码完成 - format={} size={}KB",
            self.format.mime_type(),
            buf.len() / 1024
        );

        Ok(buf)
    }

    /// 编码为 `data:<mime>;base64,...`。
    pub fn to_data_url(&self) -> Result<String, DeliveryError> {
        let bytes = self.encode()?;
        Ok(format!(
            "data:{};base64,{}",
            self.format.mime_type(),
            general_purpose::STANDARD.encode(bytes)
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportPipeline;
    use image::{ImageBuffer, RgbaImage};

    fn result(format: OutputFormat) -> ExportResult {
        let bitmap: RgbaImage =
            ImageBuffer::from_fn(8, 6, |x, y| image::Rgba([x as u8 * 30, y as u8 * 40, 7, 255]));
        ExportResult {
            width: 8,
            height: 6,
            bitmap,
            format,
            quality: 0.92,
        }
    }

    #[test]
    fn quality_mapping_is_bounded() {
        assert_eq!(jpeg_quality(0.0), 1);
        assert_eq!(jpeg_quality(0.92), 92);
        assert_eq!(jpeg_quality(3.0), 100);
    }

    #[test]
    fn png_data_url_round_trips_exactly() {
        let original = result(OutputFormat::Png);
        let url = original.to_data_url().expect("encode png");
        assert!(url.starts_with("data:image/png;base64,"));

        let bytes = ExportPipeline::parse_base64(&url).expect("parse data url");
        let decoded = image::load_from_memory(&bytes).expect("decode png").to_rgba8();
        assert_eq!(decoded, original.bitmap);
    }

    #[test]
    fn jpeg_output_keeps_dimensions() {
        let original = result(OutputFormat::Jpeg);
        let bytes = original.encode().expect("encode jpeg");
        assert_eq!(infer::get(&bytes).map(|k| k.mime_type()), Some("image/jpeg"));

        let decoded = image::load_from_memory(&bytes).expect("decode jpeg");
        assert_eq!((decoded.width(), decoded.height()), (8, 6));
    }
}
