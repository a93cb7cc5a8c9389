//! # 交付模块
//!
//! 把合成结果送到用户手里：写入系统剪贴板，或保存为本地文件。
//! 交付失败不影响合成结果本身，调用方可以换一种方式重试。

pub mod clipboard;
pub mod download;

pub use clipboard::{ClipboardRetryPolicy, copy_to_clipboard};
pub use download::{default_file_name, save_to_dir};

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("剪贴板错误：{0}")]
    Clipboard(String),

    #[error("剪贴板忙：{0}")]
    ClipboardBusy(String),

    #[error("保存文件失败：{0}")]
    Download(String),

    #[error("编码失败：{0}")]
    Encode(String),
}

impl DeliveryError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Clipboard(_) => "clipboard",
            Self::ClipboardBusy(_) => "clipboard_busy",
            Self::Download(_) => "download",
            Self::Encode(_) => "encode",
        }
    }
}

impl From<DeliveryError> for String {
    fn from(error: DeliveryError) -> Self {
        error.to_string()
    }
}
