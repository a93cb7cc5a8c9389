//! # 截图导出流水线
//!
//! ## 设计思路
//!
//! 把一张截图按固定顺序合成为最终图片：
//!
//! ```text
//! 源图 ──► 解码 ──► 画布(底色) ──► 标题栏 + 截图 ──► 水印 ──► ExportResult
//!                                                             │
//!                                               encode ◄──────┘
//! ```
//!
//! - 配置分两层：线上格式（`ExportConfig`，可缺省、可序列化）与内部格式
//!   （`ExportSettings`，已校验、已裁剪）。流水线只接受后者。
//! - 各效果互相独立，任意组合都合法；最终尺寸可以不渲染直接推导。
//! - 任一图层失败即整体失败，不会返回缺层的图片。
//!
//! ## 模块划分
//!
//! | 子模块 | 职责 |
//! |--------|------|
//! | `config` | 线上格式、默认值、校验与解析 |
//! | `limits` | 文件大小、解码像素、画布尺寸等资源上限 |
//! | `loader` / `decode` | Base64 / 字节 / 文件 → RGBA 位图 |
//! | `surface` | 画布申请与 alpha 混合绘制 |
//! | `scene` | 结构化绘图指令 → SVG → 位图 |
//! | `frame` | 浏览器标题栏布局与渲染 |
//! | `padding` | 底色与内边距尺寸 |
//! | `watermark` | 水印缩放、定位与透明度 |
//! | `pipeline` | 编排：`compose` / `calculate_final_dimensions` |
//! | `encode` | PNG / JPEG 编码与 Data URL |

pub mod config;
mod decode;
pub mod encode;
mod error;
pub mod frame;
mod limits;
mod loader;
pub mod padding;
mod pipeline;
pub mod scene;
mod source;
pub mod surface;
pub mod watermark;

pub use config::{
    BrowserFrame, BrowserFrameConfig, Effect, ExportConfig, ExportSettings, FrameStyle,
    OutputFormat, Padding, PaddingConfig, Watermark, WatermarkConfig, WatermarkPosition,
};
pub use error::{EffectKind, ExportError};
pub use limits::{PipelineLimits, ScaleProfile};
pub use pipeline::{ExportPipeline, LayerOffsets, calculate_final_dimensions, layer_offsets};
pub use source::{Dimensions, ExportResult, ImageSource};
