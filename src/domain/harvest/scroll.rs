// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::harvest::scripts;
use crate::engines::traits::BrowserPage;
use rand::Rng;
use std::time::Duration;
use tracing::debug;

/// 滚动节奏配置
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollConfig {
    pub pause_min: Duration,
    pub pause_max: Duration,
    pub factor_min: f64,
    pub factor_max: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            pause_min: Duration::from_millis(900),
            pause_max: Duration::from_millis(1400),
            factor_min: 1.2,
            factor_max: 1.5,
        }
    }
}

/// 滚动结束原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// 候选数量达到目标
    TargetReached,
    /// 连续两次采样数量相同
    Stalled,
    /// 轮数用尽
    RoundsExhausted,
}

/// 滚动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrollOutcome {
    pub rounds: u32,
    pub count: usize,
    pub reason: StopReason,
}

/// 滚动稳定器
///
/// 反复滚动并采样候选条目数量，直到增长停止或达到目标。
/// 这是启发式的收敛判断，加载慢的页面可能提前停止，返回的数量少于目标不算错误。
pub struct ScrollStabilizer<R> {
    config: ScrollConfig,
    rng: R,
}

impl<R: Rng + Send> ScrollStabilizer<R> {
    pub fn new(config: ScrollConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub async fn scroll_until(
        &mut self,
        page: &dyn BrowserPage,
        target: usize,
        max_rounds: u32,
    ) -> ScrollOutcome {
        let mut count = sample(page).await;
        if count >= target {
            return ScrollOutcome {
                rounds: 0,
                count,
                reason: StopReason::TargetReached,
            };
        }

        for round in 1..=max_rounds {
            let previous = count;
            let script = scripts::scroll_by(self.next_factor());
            if let Err(e) = page.evaluate(&script).await {
                debug!("Scroll round {} failed: {}", round, e);
            }
            tokio::time::sleep(self.next_pause()).await;

            count = sample(page).await;
            debug!(round, count, "Scroll sample");

            if count >= target {
                return ScrollOutcome {
                    rounds: round,
                    count,
                    reason: StopReason::TargetReached,
                };
            }
            if count == previous {
                return ScrollOutcome {
                    rounds: round,
                    count,
                    reason: StopReason::Stalled,
                };
            }
        }

        ScrollOutcome {
            rounds: max_rounds,
            count,
            reason: StopReason::RoundsExhausted,
        }
    }

    fn next_pause(&mut self) -> Duration {
        let min = self.config.pause_min.as_millis() as u64;
        let max = self.config.pause_max.as_millis() as u64;
        if min >= max {
            return Duration::from_millis(min);
        }
        Duration::from_millis(self.rng.random_range(min..=max))
    }

    fn next_factor(&mut self) -> f64 {
        let (min, max) = (self.config.factor_min, self.config.factor_max);
        if min >= max {
            return min;
        }
        self.rng.random_range(min..=max)
    }
}

/// 采样失败按 0 处理
async fn sample(page: &dyn BrowserPage) -> usize {
    match page.evaluate(&scripts::LINK_PROBE).await {
        Ok(value) => value.as_u64().unwrap_or(0) as usize,
        Err(e) => {
            debug!("Link probe failed: {}", e);
            0
        }
    }
}
