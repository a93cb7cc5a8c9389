//! # 截图导出工具 — 命令行入口
//!
//! 本文件仅负责参数解析、日志初始化与流程串联。
//! 合成逻辑详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use screenshot_export::delivery::{self, ClipboardRetryPolicy};
use screenshot_export::error::AppError;
use screenshot_export::export::{
    ExportConfig, ExportPipeline, ImageSource, PipelineLimits, ScaleProfile,
};

#[derive(Parser, Debug)]
#[command(name = "screenshot-export", version)]
struct Cli {
    /// Source image file (PNG/JPEG/WebP/...).
    input: PathBuf,

    /// Export configuration JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory to write the composed image into.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// File name prefix.
    #[arg(long, default_value = delivery::download::DEFAULT_PREFIX)]
    prefix: String,

    /// Copy the composed image to the system clipboard.
    #[arg(long)]
    copy: bool,

    /// Watermark scaling profile: quality, balanced or speed.
    #[arg(long, default_value = "balanced")]
    profile: String,

    /// Fixed date text for the browser frame header.
    #[arg(long)]
    date: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("导出失败: {err}");
            if err.is_delivery() {
                log::error!("合成已完成，可重新尝试交付");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = match &cli.config {
        Some(path) => ExportConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ExportConfig::default(),
    };
    let settings = config.resolve()?;

    let limits = PipelineLimits::default().with_profile(ScaleProfile::parse(&cli.profile)?);
    let mut pipeline = ExportPipeline::new(limits);
    if let Some(date) = cli.date {
        pipeline = pipeline.with_fixed_date(date);
    }

    if !cli.input.exists() {
        return Err(AppError::Config(format!("输入文件不存在: {}", cli.input.display())));
    }

    let result = pipeline
        .compose_with(ImageSource::FilePath(cli.input.clone()), &settings)
        .await?;

    let path = delivery::save_to_dir(&result, &cli.out_dir, &cli.prefix)?;
    println!("{}", path.display());

    if cli.copy {
        delivery::copy_to_clipboard(&result, &ClipboardRetryPolicy::default()).await?;
    }

    Ok(())
}
