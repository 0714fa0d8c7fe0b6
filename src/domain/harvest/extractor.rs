// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::harvest::links::short_code;
use crate::domain::harvest::navigation::NavigationController;
use crate::domain::harvest::scripts;
use crate::domain::models::reel::{ReelRecord, ReelReference};
use crate::engines::traits::BrowserPage;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

/// 数字紧跟本地化的“观看”短语
static VIEW_COUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)([0-9][0-9.,'\u{00A0}\u{202F}]*)\s*(?:次觀看|次观看|回視聴|views|plays|visualizzazioni|visualizaciones|visitas|visualizações|vues|aufrufe|weergaven|просмотров|просмотра)",
    )
    .expect("view count pattern is valid")
});

/// 页面源码中内嵌的播放次数数据
static EMBEDDED_VIEW_COUNT_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""(?:video_view_count|play_count)"\s*:\s*([0-9]+)"#)
        .expect("embedded view count pattern is valid")
});

/// 视频地址提取策略
///
/// 按顺序尝试，第一个非空结果生效。页面查询失败视为未找到。
#[async_trait]
pub trait VideoUrlStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn locate(&self, page: &dyn BrowserPage) -> Option<String>;
}

/// 主媒体元素的 `src`
///
/// `blob:` 地址只在页面内有效，不作为结果
pub struct MediaElementStrategy;

#[async_trait]
impl VideoUrlStrategy for MediaElementStrategy {
    fn name(&self) -> &'static str {
        "media-element"
    }

    async fn locate(&self, page: &dyn BrowserPage) -> Option<String> {
        for selector in ["video", "video source"] {
            match page.query_single(selector, "src").await {
                Ok(value) => {
                    if let Some(src) = non_empty(value).filter(|src| !src.starts_with("blob:")) {
                        return Some(src);
                    }
                }
                Err(e) => debug!("Querying {} failed: {}", selector, e),
            }
        }
        None
    }
}

/// OpenGraph 视频元数据
pub struct MetaTagStrategy;

const VIDEO_META_PROPERTIES: [&str; 3] = ["og:video:secure_url", "og:video", "og:video:url"];

#[async_trait]
impl VideoUrlStrategy for MetaTagStrategy {
    fn name(&self) -> &'static str {
        "meta-tag"
    }

    async fn locate(&self, page: &dyn BrowserPage) -> Option<String> {
        for property in VIDEO_META_PROPERTIES {
            let selector = format!(r#"meta[property="{}"]"#, property);
            match page.query_single(&selector, "content").await {
                Ok(value) => {
                    if let Some(content) = non_empty(value) {
                        return Some(content);
                    }
                }
                Err(e) => debug!("Querying {} failed: {}", selector, e),
            }
        }
        None
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// 从可见文本中解析播放次数
pub fn parse_view_count(text: &str) -> Option<String> {
    VIEW_COUNT_PATTERN
        .captures_iter(text)
        .map(|captures| digits_only(&captures[1]))
        .find(|digits| !digits.is_empty())
}

/// 从文档源码中的内嵌数据解析播放次数
pub fn parse_embedded_view_count(source: &str) -> Option<String> {
    EMBEDDED_VIEW_COUNT_PATTERN
        .captures(source)
        .map(|captures| captures[1].to_string())
}

/// 条目提取器
pub struct ItemExtractor {
    navigator: NavigationController,
    strategies: Vec<Box<dyn VideoUrlStrategy>>,
}

impl ItemExtractor {
    /// 使用默认策略链：媒体元素 → 元数据标签
    pub fn new(navigator: NavigationController) -> Self {
        Self::with_strategies(
            navigator,
            vec![Box::new(MediaElementStrategy), Box::new(MetaTagStrategy)],
        )
    }

    pub fn with_strategies(
        navigator: NavigationController,
        strategies: Vec<Box<dyn VideoUrlStrategy>>,
    ) -> Self {
        Self {
            navigator,
            strategies,
        }
    }

    /// 提取单个条目
    ///
    /// 导航失败时返回带 `error` 的记录，不会中断后续条目
    pub async fn extract(&self, page: &dyn BrowserPage, reference: &ReelReference) -> ReelRecord {
        if let Err(e) = self.navigator.navigate(page, &reference.link).await {
            warn!("Skipping {}: {}", reference.link, e);
            return ReelRecord::failed(reference, e.to_string());
        }

        let video_url = self.locate_video(page).await;
        let view_count = read_view_count(page).await;
        debug!(
            link = %reference.link,
            has_video = !video_url.is_empty(),
            view_count = %view_count,
            "Extracted item"
        );

        ReelRecord::extracted(reference, short_code(&reference.link), video_url, view_count)
    }

    async fn locate_video(&self, page: &dyn BrowserPage) -> String {
        for strategy in &self.strategies {
            if let Some(url) = strategy.locate(page).await {
                debug!("Video url found by {}", strategy.name());
                return url;
            }
        }
        String::new()
    }
}

async fn read_view_count(page: &dyn BrowserPage) -> String {
    let text = evaluate_text(page, scripts::VISIBLE_TEXT).await;
    if let Some(count) = parse_view_count(&text) {
        return count;
    }
    let source = evaluate_text(page, scripts::DOCUMENT_SOURCE).await;
    parse_embedded_view_count(&source).unwrap_or_default()
}

async fn evaluate_text(page: &dyn BrowserPage, script: &str) -> String {
    match page.evaluate(script).await {
        Ok(Value::String(text)) => text,
        Ok(_) => String::new(),
        Err(e) => {
            debug!("Reading page text failed: {}", e);
            String::new()
        }
    }
}
