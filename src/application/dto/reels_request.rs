// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::scrape_request::ScrapeRequest;
use crate::utils::errors::HarvestError;
use serde::{Deserialize, Serialize};
use std::num::IntErrorKind;
use validator::Validate;

/// 短视频采集查询参数
///
/// 对应 `GET /api/ig/reels?url=...&limit=...`
#[derive(Debug, Default, Deserialize, Serialize, Validate)]
pub struct ReelsQueryDto {
    /// 列表页地址
    #[validate(required, url)]
    pub url: Option<String>,
    /// 返回条数，非数字时使用默认值
    pub limit: Option<String>,
}

impl ReelsQueryDto {
    /// 解析后的条数，非数字时为 None
    ///
    /// 超出 `i64` 范围的数字饱和到边界，之后由领域请求限制到 [1, 100]
    pub fn parsed_limit(&self) -> Option<i64> {
        let raw = self.limit.as_deref()?.trim();
        match raw.parse::<i64>() {
            Ok(value) => Some(value),
            Err(e) => match e.kind() {
                IntErrorKind::PosOverflow => Some(i64::MAX),
                IntErrorKind::NegOverflow => Some(i64::MIN),
                _ => None,
            },
        }
    }

    /// 校验并转换为领域请求
    pub fn into_request(self) -> Result<ScrapeRequest, HarvestError> {
        let url = self.url.as_deref().map(str::trim).unwrap_or_default();
        if url.is_empty() {
            return Err(HarvestError::Validation(
                "missing required query parameter: url".to_string(),
            ));
        }
        if self.validate().is_err() {
            return Err(HarvestError::Validation(format!(
                "url is not a valid address: {}",
                url
            )));
        }
        ScrapeRequest::new(url, self.parsed_limit())
    }
}
