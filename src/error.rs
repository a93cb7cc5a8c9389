//! 统一错误类型模块
//!
//! # 设计思路
//!
//! 合成失败与交付失败必须可区分：合成失败需要修改配置或源图后重新合成，
//! 交付失败只需要换一种方式（或稍后）重新交付，已合成的结果仍然可用。
//!
//! # 实现思路
//!
//! - 使用 `thiserror` 派生可读错误消息。
//! - `ExportError` / `DeliveryError` 通过 `#[from]` 自动转换。
//! - 实现 `Serialize` 将错误序列化为字符串，方便嵌入 JSON 响应。

use serde::Serialize;

use crate::delivery::DeliveryError;
use crate::export::ExportError;

/// 应用级统一错误类型
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// 合成阶段错误（配置 / 解码 / 画布）
    #[error("{0}")]
    Export(#[from] ExportError),

    /// 交付阶段错误（剪贴板 / 保存 / 编码）
    #[error("{0}")]
    Delivery(#[from] DeliveryError),

    /// 文件系统 I/O 错误
    #[error("文件系统错误: {0}")]
    Io(#[from] std::io::Error),

    /// 命令行参数或配置文件不可用
    #[error("配置错误: {0}")]
    Config(String),
}

impl AppError {
    /// 是否是交付阶段的失败（可直接重试交付，无需重新合成）。
    pub fn is_delivery(&self) -> bool {
        matches!(self, Self::Delivery(_))
    }
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
