//! # 剪贴板交付
//!
//! ## 设计思路
//!
//! 系统剪贴板经常被其他应用短暂占用，单次写入失败并不代表真的不可用。
//! 写入放在阻塞线程中执行，失败时按“指数退避 + 抖动”有限重试，
//! 并受总预算约束，避免用户长时间等待。
//!
//! ## 实现思路
//!
//! - 退避时长完全由 `ClipboardRetryPolicy` 决定；抖动来源是每次写入独立的
//!   `Backoff`，不共享全局状态，测试可用固定种子复现。
//! - 打开剪贴板失败视为 `Busy`，写入失败视为 `Transient`，均可重试。
//! - 输入数据不合法（尺寸与缓冲不符）视为 `Fatal`，立即终止。
//! - 最后一次失败为 `Busy` 时返回 `ClipboardBusy`，便于调用方提示“稍后再试”。

use std::borrow::Cow;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::DeliveryError;
use crate::export::ExportResult;

/// 剪贴板写入重试策略。
#[derive(Debug, Clone)]
pub struct ClipboardRetryPolicy {
    /// 最大尝试次数（至少 1）。
    pub retries: u32,
    /// 首次退避间隔（毫秒）。
    pub retry_delay_ms: u64,
    /// 整个写入流程允许的总预算（毫秒）。
    pub max_total_ms: u64,
    /// 单次退避上限（毫秒，不含抖动）。
    pub max_delay_ms: u64,
    /// 抖动上限，占本次退避时长的百分比。
    pub jitter_percent: u8,
}

impl Default for ClipboardRetryPolicy {
    fn default() -> Self {
        Self {
            retries: 3,
            retry_delay_ms: 100,
            max_total_ms: 1_800,
            max_delay_ms: 900,
            jitter_percent: 30,
        }
    }
}

impl ClipboardRetryPolicy {
    /// 第 `retry` 次重试（从 1 开始）前的基础等待：逐次翻倍，封顶 `max_delay_ms`。
    pub fn base_delay_ms(&self, retry: u32) -> u64 {
        let first = self.retry_delay_ms.max(1);
        let doublings = retry.saturating_sub(1).min(16);
        first
            .saturating_mul(1_u64 << doublings)
            .min(self.max_delay_ms.max(first))
    }

    /// 某次基础等待允许附加的最大抖动。
    pub fn max_jitter_ms(&self, base_ms: u64) -> u64 {
        base_ms.saturating_mul(self.jitter_percent.min(100) as u64) / 100
    }

    /// 已耗时 `elapsed_ms` 后再等待 `wait_ms` 是否仍在预算内。
    pub fn fits_budget(&self, elapsed_ms: u64, wait_ms: u64) -> bool {
        elapsed_ms.saturating_add(wait_ms) <= self.max_total_ms
    }
}

/// 单次写入流程的退避计算器。
#[derive(Debug)]
struct Backoff<'a> {
    policy: &'a ClipboardRetryPolicy,
    state: u64,
}

impl<'a> Backoff<'a> {
    fn new(policy: &'a ClipboardRetryPolicy) -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0)
            ^ std::process::id() as u64;
        Self::seeded(policy, seed)
    }

    fn seeded(policy: &'a ClipboardRetryPolicy, seed: u64) -> Self {
        Self {
            policy,
            state: seed,
        }
    }

    /// splitmix64
    fn next_random(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    /// 基础等待加上 `[0, max_jitter]` 内的随机抖动。
    fn delay_ms(&mut self, retry: u32) -> u64 {
        let base = self.policy.base_delay_ms(retry);
        let jitter_bound = self.policy.max_jitter_ms(base);
        let jitter = if jitter_bound == 0 {
            0
        } else {
            self.next_random() % (jitter_bound + 1)
        };
        base + jitter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClipboardFailureKind {
    Busy,
    Transient,
    Fatal,
}

#[derive(Debug, Clone)]
struct ClipboardWriteFailure {
    kind: ClipboardFailureKind,
    message: String,
}

impl ClipboardWriteFailure {
    fn new(kind: ClipboardFailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn is_retryable(&self) -> bool {
        self.kind != ClipboardFailureKind::Fatal
    }
}

/// 将合成结果写入系统剪贴板（含重试）。
pub async fn copy_to_clipboard(
    result: &ExportResult,
    policy: &ClipboardRetryPolicy,
) -> Result<(), DeliveryError> {
    log::debug!("📋 准备复制到剪贴板 - {}x{}", result.width, result.height);

    let width = result.width as usize;
    let height = result.height as usize;
    let bytes = result.bitmap.as_raw().clone();
    let policy = policy.clone();

    tokio::task::spawn_blocking(move || {
        write_with_retry(&policy, &mut Backoff::new(&policy), || {
            try_write(width, height, &bytes)
        })
    })
    .await
    .map_err(|e| DeliveryError::Clipboard(format!("线程执行失败：{}", e)))?
}

/// 重试循环本身与具体写入方式无关，`write` 每调用一次即一次尝试。
fn write_with_retry<F>(
    policy: &ClipboardRetryPolicy,
    backoff: &mut Backoff<'_>,
    mut write: F,
) -> Result<(), DeliveryError>
where
    F: FnMut() -> Result<(), ClipboardWriteFailure>,
{
    let attempts = policy.retries.max(1);
    let started = Instant::now();
    let mut last_failure = None;

    for attempt in 1..=attempts {
        if attempt > 1 {
            let elapsed_ms = started.elapsed().as_millis() as u64;
            let wait_ms = backoff.delay_ms(attempt - 1);

            if !policy.fits_budget(elapsed_ms, wait_ms) {
                log::warn!(
                    "⏱️ 放弃第 {} 次尝试：已耗时 {}ms，再等 {}ms 会超过预算 {}ms",
                    attempt,
                    elapsed_ms,
                    wait_ms,
                    policy.max_total_ms
                );
                break;
            }

            log::debug!("🔄 第 {}/{} 次尝试前等待 {}ms", attempt, attempts, wait_ms);
            std::thread::sleep(Duration::from_millis(wait_ms));
        }

        match write() {
            Ok(()) => {
                log::info!("✅ 已复制到剪贴板 (尝试 {})", attempt);
                return Ok(());
            }
            Err(failure) => {
                log::warn!(
                    "❌ 剪贴板写入失败 (尝试 {}): {}（kind={:?}）",
                    attempt,
                    failure.message,
                    failure.kind
                );
                let retryable = failure.is_retryable();
                last_failure = Some(failure);

                if !retryable {
                    break;
                }
            }
        }
    }

    Err(match last_failure {
        Some(ClipboardWriteFailure {
            kind: ClipboardFailureKind::Busy,
            message,
        }) => DeliveryError::ClipboardBusy(message),
        Some(failure) => DeliveryError::Clipboard(failure.message),
        None => DeliveryError::Clipboard("未进行任何写入尝试".to_string()),
    })
}

fn try_write(width: usize, height: usize, bytes: &[u8]) -> Result<(), ClipboardWriteFailure> {
    let expected = width.checked_mul(height).and_then(|n| n.checked_mul(4));
    if expected != Some(bytes.len()) {
        return Err(ClipboardWriteFailure::new(
            ClipboardFailureKind::Fatal,
            format!("像素缓冲长度 {} 与尺寸 {}x{} 不符", bytes.len(), width, height),
        ));
    }

    let mut clipboard = arboard::Clipboard::new().map_err(|e| {
        ClipboardWriteFailure::new(ClipboardFailureKind::Busy, format!("无法访问剪贴板：{}", e))
    })?;

    clipboard
        .set_image(arboard::ImageData {
            width,
            height,
            bytes: Cow::Borrowed(bytes),
        })
        .map_err(|e| {
            ClipboardWriteFailure::new(ClipboardFailureKind::Transient, format!("复制失败：{}", e))
        })
}
