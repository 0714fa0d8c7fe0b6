// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::{BrowserSettings, HarvestSettings};
use crate::domain::harvest::{
    ItemExtractor, LinkCollector, NavigationController, ResultAggregator, ScrollConfig,
    ScrollStabilizer,
};
use crate::domain::models::reel::ScrapeResult;
use crate::domain::models::scrape_request::ScrapeRequest;
use crate::engines::resource_filter::ResourceFilter;
use crate::engines::traits::{BrowserLauncher, BrowserPage, BrowserSession};
use crate::utils::errors::HarvestError;
use crate::utils::retry_policy::RetryPolicy;
use metrics::{counter, histogram};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// 采集流程配置
#[derive(Debug, Clone)]
pub struct HarvestConfig {
    /// 滚动最大轮数
    pub max_rounds: u32,
    /// 滚动节奏
    pub scroll: ScrollConfig,
    /// 导航重试策略
    pub retry: RetryPolicy,
    /// 单次导航超时
    pub navigation_timeout: Duration,
    /// 列表页加载后的稳定等待
    pub settle_delay: Duration,
    /// 资源过滤器
    pub resource_filter: ResourceFilter,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            max_rounds: 16,
            scroll: ScrollConfig::default(),
            retry: RetryPolicy::standard(),
            navigation_timeout: Duration::from_secs(40),
            settle_delay: Duration::from_secs(2),
            resource_filter: ResourceFilter::default(),
        }
    }
}

impl HarvestConfig {
    pub fn from_settings(harvest: &HarvestSettings, browser: &BrowserSettings) -> Self {
        Self {
            max_rounds: harvest.max_rounds,
            scroll: ScrollConfig {
                pause_min: Duration::from_millis(harvest.scroll_pause_min_ms),
                pause_max: Duration::from_millis(harvest.scroll_pause_max_ms),
                factor_min: harvest.scroll_factor_min,
                factor_max: harvest.scroll_factor_max,
            },
            retry: RetryPolicy::new(
                harvest.retry_attempts,
                Duration::from_millis(harvest.retry_base_delay_ms),
            ),
            navigation_timeout: Duration::from_secs(harvest.navigation_timeout_secs),
            settle_delay: Duration::from_millis(harvest.settle_delay_ms),
            resource_filter: ResourceFilter::new(browser.blocked_resources.iter().copied()),
        }
    }
}

/// 采集服务
///
/// 每次请求独占一个浏览器会话和一个页面，条目严格按顺序处理。
/// 会话在所有退出路径上都会被关闭。
pub struct HarvestService {
    launcher: Arc<dyn BrowserLauncher>,
    config: HarvestConfig,
}

impl HarvestService {
    pub fn new(launcher: Arc<dyn BrowserLauncher>, config: HarvestConfig) -> Self {
        Self { launcher, config }
    }

    /// 校验地址后执行采集
    ///
    /// 只有参数校验失败会返回 `Err`，此时不会启动浏览器
    pub async fn harvest_address(
        &self,
        address: &str,
        limit: Option<i64>,
    ) -> Result<ScrapeResult, HarvestError> {
        let request = ScrapeRequest::new(address, limit)?;
        Ok(self.harvest(&request).await)
    }

    /// 执行采集，会话级失败体现在结果的 `error` 字段
    pub async fn harvest(&self, request: &ScrapeRequest) -> ScrapeResult {
        self.harvest_with_rng(request, StdRng::from_os_rng()).await
    }

    /// 使用指定随机源执行采集
    pub async fn harvest_with_rng<R: Rng + Send>(
        &self,
        request: &ScrapeRequest,
        rng: R,
    ) -> ScrapeResult {
        let span = info_span!(
            "harvest",
            id = %Uuid::new_v4(),
            url = %request.address(),
            limit = request.limit()
        );

        async move {
            let started = Instant::now();
            info!("Harvest started with launcher {}", self.launcher.name());
            let mut aggregator = ResultAggregator::new(request.address());

            let outcome = match self.launcher.launch().await {
                Ok(session) => {
                    let outcome = self
                        .run_session(session.as_ref(), request, rng, &mut aggregator)
                        .await;
                    if let Err(e) = session.close().await {
                        warn!("Failed to close browser session: {}", e);
                    }
                    outcome
                }
                Err(e) => Err(HarvestError::Session(e.to_string())),
            };

            let failed_items = aggregator.failed_items();
            let result = match outcome {
                Ok(()) => {
                    counter!("reelrs_harvests_total", "outcome" => "success").increment(1);
                    aggregator.finish()
                }
                Err(e) => {
                    error!("Harvest failed: {}", e);
                    counter!("reelrs_harvests_total", "outcome" => "failed").increment(1);
                    aggregator.fail(&e)
                }
            };

            histogram!("reelrs_harvest_duration_seconds").record(started.elapsed().as_secs_f64());
            info!(
                count = result.count,
                failed_items,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Harvest finished"
            );
            result
        }
        .instrument(span)
        .await
    }

    async fn run_session<R: Rng + Send>(
        &self,
        session: &dyn BrowserSession,
        request: &ScrapeRequest,
        rng: R,
        aggregator: &mut ResultAggregator,
    ) -> Result<(), HarvestError> {
        let page = session
            .new_page()
            .await
            .map_err(|e| HarvestError::Session(e.to_string()))?;

        let outcome = self.run_page(page.as_ref(), request, rng, aggregator).await;

        if let Err(e) = page.close().await {
            warn!("Failed to close page: {}", e);
        }
        outcome
    }

    async fn run_page<R: Rng + Send>(
        &self,
        page: &dyn BrowserPage,
        request: &ScrapeRequest,
        rng: R,
        aggregator: &mut ResultAggregator,
    ) -> Result<(), HarvestError> {
        page.block_resources(&self.config.resource_filter)
            .await
            .map_err(|e| HarvestError::Session(e.to_string()))?;

        let navigator =
            NavigationController::new(self.config.retry.clone(), self.config.navigation_timeout);
        navigator.navigate(page, request.address()).await?;

        if !self.config.settle_delay.is_zero() {
            tokio::time::sleep(self.config.settle_delay).await;
        }

        let limit = request.limit() as usize;
        let mut stabilizer = ScrollStabilizer::new(self.config.scroll.clone(), rng);
        let scrolled = stabilizer
            .scroll_until(page, limit, self.config.max_rounds)
            .await;
        info!(
            rounds = scrolled.rounds,
            visible = scrolled.count,
            reason = ?scrolled.reason,
            "Listing scroll finished"
        );

        let references = LinkCollector
            .collect_links(page, request.address(), limit)
            .await
            .map_err(|e| HarvestError::Navigation {
                url: request.address().to_string(),
                message: e.to_string(),
            })?;
        info!("Visiting {} items", references.len());

        let extractor = ItemExtractor::new(navigator);
        for reference in &references {
            let record = extractor.extract(page, reference).await;
            let outcome = if record.is_failed() { "error" } else { "ok" };
            counter!("reelrs_items_total", "outcome" => outcome).increment(1);
            aggregator.push(record);
        }

        Ok(())
    }
}
