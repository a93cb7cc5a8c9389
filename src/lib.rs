//! # 截图导出工具 — 库入口
//!
//! ## 架构总览
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │         调用方（CLI / 设置面板 / 截图采集）               │
//! │                                                          │
//! │   ExportConfig (JSON)           源图 (Base64/字节/文件)   │
//! └───────┬─────────────────────────────────┬────────────────┘
//!         ↓                                 ↓
//! ┌──────────────────────────────────────────────────────────┐
//! │  export                                                  │
//! │  ├─ config ─── 默认值 · 校验 · 裁剪 → ExportSettings      │
//! │  ├─ loader/decode ── 签名校验 · 像素上限 · RGBA 解码      │
//! │  ├─ surface ── 画布申请 · alpha 混合                      │
//! │  ├─ padding ── 底色 / 内边距                              │
//! │  ├─ frame ──── 标题栏布局 → scene → resvg                 │
//! │  ├─ watermark ─ 缩放 · 锚点 · 透明度                       │
//! │  └─ pipeline ── compose / calculate_final_dimensions      │
//! └───────┬──────────────────────────────────────────────────┘
//!         ↓ ExportResult
//! ┌──────────────────────────────────────────────────────────┐
//! │  delivery ── 剪贴板（重试 + 退避） / 保存文件             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## 模块职责
//!
//! | 模块 | 职责 |
//! |------|------|
//! | [`error`] | 统一错误类型 `AppError`，区分合成失败与交付失败 |
//! | [`color`] | 颜色解析（hex / rgb / rgba）与格式化 |
//! | [`clamp`] | 各数值参数的合法区间与裁剪 |
//! | [`export`] | 截图合成流水线 |
//! | [`delivery`] | 剪贴板写入、文件保存 |

pub mod clamp;
pub mod color;
pub mod delivery;
pub mod error;
pub mod export;
