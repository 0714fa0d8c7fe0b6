// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::{BrowserPage, EngineError};
use crate::utils::errors::HarvestError;
use crate::utils::retry_policy::RetryPolicy;
use std::time::Duration;

/// 导航控制器
///
/// 每次尝试有独立超时，失败后按重试策略退避重试
#[derive(Debug, Clone)]
pub struct NavigationController {
    retry: RetryPolicy,
    timeout: Duration,
}

impl NavigationController {
    pub fn new(retry: RetryPolicy, timeout: Duration) -> Self {
        Self { retry, timeout }
    }

    /// 加载地址，重试耗尽后返回 `HarvestError::Navigation`
    pub async fn navigate(&self, page: &dyn BrowserPage, url: &str) -> Result<(), HarvestError> {
        let label = format!("Navigation to {}", url);
        self.retry
            .with_retry(&label, |_attempt| async move {
                match tokio::time::timeout(self.timeout, page.navigate(url)).await {
                    Ok(result) => result,
                    Err(_) => Err(EngineError::Timeout(self.timeout)),
                }
            })
            .await
            .map_err(|e| HarvestError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            })
    }
}
