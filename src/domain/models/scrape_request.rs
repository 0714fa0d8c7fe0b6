// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::HarvestError;
use once_cell::sync::Lazy;
use regex::Regex;

/// 默认返回条数
pub const DEFAULT_LIMIT: u32 = 20;
/// 返回条数上限
pub const MAX_LIMIT: u32 = 100;

/// 列表页地址格式：`https://www.instagram.com/<account>/reels/`
static LISTING_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:www\.)?instagram\.com/[A-Za-z0-9._]+/reels/?(?:[?#].*)?$")
        .expect("listing pattern is valid")
});

/// 已校验的采集请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeRequest {
    address: String,
    limit: u32,
}

impl ScrapeRequest {
    /// 校验地址并将条数限制到 [1, 100]
    pub fn new(address: &str, limit: Option<i64>) -> Result<Self, HarvestError> {
        let address = address.trim();
        if address.is_empty() {
            return Err(HarvestError::Validation(
                "missing required query parameter: url".to_string(),
            ));
        }
        if !is_listing_address(address) {
            return Err(HarvestError::Validation(format!(
                "url must be a reels listing address like https://www.instagram.com/<account>/reels/, got {}",
                address
            )));
        }

        Ok(Self {
            address: address.to_string(),
            limit: clamp_limit(limit),
        })
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }
}

/// 是否为列表页地址
pub fn is_listing_address(address: &str) -> bool {
    LISTING_PATTERN.is_match(address)
}

/// 将条数限制到 [1, 100]，未提供时使用默认值
pub fn clamp_limit(limit: Option<i64>) -> u32 {
    match limit {
        Some(value) => value.clamp(1, MAX_LIMIT as i64) as u32,
        None => DEFAULT_LIMIT,
    }
}
