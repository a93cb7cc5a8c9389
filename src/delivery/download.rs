//! # 文件下载
//!
//! 默认文件名形如 `<prefix>_2026-10-19T08-30-15.png`：
//! UTC 时间戳中的 `:` 与 `.` 换成 `-`，截取前 19 个字符。

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use super::DeliveryError;
use crate::export::{ExportResult, OutputFormat};

/// 未指定前缀时使用的文件名前缀。
pub const DEFAULT_PREFIX: &str = "screenshot";

/// 生成带时间戳的默认文件名。
pub fn default_file_name(prefix: &str, format: OutputFormat, now: DateTime<Utc>) -> String {
    let stamp: String = now
        .format("%Y-%m-%dT%H:%M:%S%.3fZ")
        .to_string()
        .replace([':', '.'], "-")
        .chars()
        .take(19)
        .collect();

    let prefix = prefix.trim();
    let prefix = if prefix.is_empty() { DEFAULT_PREFIX } else { prefix };

    format!("{}_{}.{}", prefix, stamp, format.extension())
}

/// 编码结果并写入 `dir`，返回完整路径。
pub fn save_to_dir(
    result: &ExportResult,
    dir: &Path,
    prefix: &str,
) -> Result<PathBuf, DeliveryError> {
    let bytes = result.encode()?;

    std::fs::create_dir_all(dir)
        .map_err(|e| DeliveryError::Download(format!("无法创建目录 {}：{}", dir.display(), e)))?;

    let path = dir.join(default_file_name(prefix, result.format, Utc::now()));
    std::fs::write(&path, &bytes)
        .map_err(|e| DeliveryError::Download(format!("写入 {} 失败：{}", path.display(), e)))?;

    log::info!("💾 已保存 {}（{}KB）", path.display(), bytes.len() / 1024);

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use image::ImageBuffer;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 15)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn file_name_uses_prefix_timestamp_and_extension() {
        assert_eq!(
            default_file_name("capture", OutputFormat::Png, fixed_time()),
            "capture_2026-10-19T08-30-15.png"
        );
        assert_eq!(
            default_file_name("capture", OutputFormat::Jpeg, fixed_time()),
            "capture_2026-10-19T08-30-15.jpg"
        );
    }

    #[test]
    fn blank_prefix_falls_back_to_default() {
        assert_eq!(
            default_file_name("  ", OutputFormat::Png, fixed_time()),
            "screenshot_2026-10-19T08-30-15.png"
        );
    }

    #[test]
    fn saves_encoded_file_into_directory() {
        let dir = std::env::temp_dir().join(format!("screenshot-export-test-{}", std::process::id()));
        let result = ExportResult {
            bitmap: ImageBuffer::from_pixel(3, 2, image::Rgba([1, 2, 3, 255])),
            width: 3,
            height: 2,
            format: OutputFormat::Png,
            quality: 0.92,
        };

        let path = save_to_dir(&result, &dir, "unit").expect("save should succeed");
        let saved = image::open(&path).expect("saved file decodes").to_rgba8();
        assert_eq!(saved, result.bitmap);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
