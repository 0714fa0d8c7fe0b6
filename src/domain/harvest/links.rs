// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::harvest::scripts;
use crate::domain::models::reel::ReelReference;
use crate::engines::traits::{BrowserPage, EngineError};
use crate::utils::url_utils::resolve_href;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// 条目页地址格式，捕获组 1 为短码
///
/// 同时用于页面内的链接计数脚本，只能使用 JS 与 Rust 共有的语法
pub const ITEM_LINK_PATTERN: &str =
    r"^https?://(?:www\.)?instagram\.com/(?:[A-Za-z0-9._]+/)?(?:reel|p|tv)/([A-Za-z0-9_-]+)/?(?:[?#].*)?$";

static ITEM_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(ITEM_LINK_PATTERN).expect("item pattern is valid"));

/// 是否为条目页地址
pub fn is_item_link(link: &str) -> bool {
    ITEM_PATTERN.is_match(link)
}

/// 从条目页地址中提取短码，不匹配时为空字符串
pub fn short_code(link: &str) -> String {
    ITEM_PATTERN
        .captures(link)
        .and_then(|captures| captures.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// 从原始 href 列表中选出条目链接
///
/// 解析相对地址，按字符串精确去重并保持首次出现顺序，过滤非条目页，最后截断到 `limit`
pub fn select_links(
    base: &Url,
    hrefs: impl IntoIterator<Item = String>,
    limit: usize,
) -> Vec<ReelReference> {
    let mut seen = HashSet::new();
    hrefs
        .into_iter()
        .filter_map(|href| resolve_href(base, &href))
        .filter(|link| seen.insert(link.clone()))
        .filter(|link| is_item_link(link))
        .take(limit)
        .map(ReelReference::new)
        .collect()
}

/// 链接收集器
///
/// 只能在滚动稳定器收敛或轮数用尽之后调用
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkCollector;

impl LinkCollector {
    pub async fn collect_links(
        &self,
        page: &dyn BrowserPage,
        listing_address: &str,
        limit: usize,
    ) -> Result<Vec<ReelReference>, EngineError> {
        let base = Url::parse(listing_address)
            .map_err(|e| EngineError::Evaluation(format!("invalid listing address: {}", e)))?;
        let hrefs = page.query_all(scripts::ANCHOR_SELECTOR, "href").await?;
        let total = hrefs.len();
        let links = select_links(&base, hrefs, limit);
        tracing::debug!("Collected {} item links from {} anchors", links.len(), total);
        Ok(links)
    }
}
