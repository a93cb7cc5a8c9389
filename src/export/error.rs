//! # 错误模型模块
//!
//! ## 设计思路
//!
//! 合成阶段的所有失败都收敛到 `ExportError`。任何一个效果失败都会让整次导出失败，
//! 不存在“少画一层但照常返回”的降级路径。
//! 交付阶段（剪贴板 / 下载）的错误单独放在 `crate::delivery::DeliveryError`，
//! 调用方据此区分“重新交付”与“重新合成”。

use std::fmt;

/// 可能在解码阶段失败的子效果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Frame,
    Watermark,
}

impl EffectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Frame => "frame",
            Self::Watermark => "watermark",
        }
    }
}

impl fmt::Display for EffectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 合成流水线统一错误类型。
///
/// 该类型会在顶层被上转为 `AppError`。
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("配置校验失败：{0}")]
    ConfigValidation(String),

    #[error("源图解码失败：{0}")]
    SourceDecode(String),

    #[error("效果图层解码失败（{effect}）：{message}")]
    EffectDecode { effect: EffectKind, message: String },

    #[error("无法获取绘制画布：{0}")]
    RenderSurfaceUnavailable(String),

    #[error("后台任务异常：{0}")]
    Task(String),
}

impl ExportError {
    pub fn effect(effect: EffectKind, message: impl Into<String>) -> Self {
        Self::EffectDecode {
            effect,
            message: message.into(),
        }
    }

    /// 稳定的错误码，供宿主界面按类型展示提示。
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigValidation(_) => "config_validation",
            Self::SourceDecode(_) => "source_decode",
            Self::EffectDecode {
                effect: EffectKind::Frame,
                ..
            } => "frame_decode",
            Self::EffectDecode {
                effect: EffectKind::Watermark,
                ..
            } => "watermark_decode",
            Self::RenderSurfaceUnavailable(_) => "render_surface_unavailable",
            Self::Task(_) => "task_failed",
        }
    }
}

impl From<ExportError> for String {
    fn from(error: ExportError) -> Self {
        error.to_string()
    }
}
