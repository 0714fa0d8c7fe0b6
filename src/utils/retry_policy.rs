// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// 重试策略配置
///
/// 线性退避：第 n 次失败后等待 `initial_backoff * n`，不区分错误类型
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// 首次尝试之外的最大重试次数
    pub max_retries: u32,
    /// 初始退避时间
    pub initial_backoff: Duration,
    /// 最大退避时间
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_backoff: Duration::from_millis(800),
            max_backoff: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    /// 创建标准重试策略
    pub fn standard() -> Self {
        Self::default()
    }

    /// 使用指定重试次数和初始退避创建策略
    pub fn new(max_retries: u32, initial_backoff: Duration) -> Self {
        Self {
            max_retries,
            initial_backoff,
            ..Self::default()
        }
    }

    /// 计算第 `attempt` 次失败之后的退避时间
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        self.initial_backoff
            .saturating_mul(attempt.max(1))
            .min(self.max_backoff)
    }

    /// 是否应该重试
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt <= self.max_retries
    }

    /// 带重试地执行异步操作
    ///
    /// `operation` 接收当前尝试序号（从 1 开始）。所有尝试都失败时返回最后一次的错误。
    pub async fn with_retry<T, E, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 1;
        loop {
            match operation(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if self.should_retry(attempt) => {
                    let backoff = self.calculate_backoff(attempt);
                    warn!(
                        "{} failed on attempt {}/{}: {}. Retrying in {:?}",
                        label,
                        attempt,
                        self.max_retries + 1,
                        e,
                        backoff
                    );
                    tokio::time::sleep(backoff).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
