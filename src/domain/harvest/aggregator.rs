// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::reel::{ReelRecord, ScrapeResult};
use crate::utils::errors::HarvestError;
use chrono::Utc;
use std::collections::HashSet;

/// 结果聚合器
///
/// 按提取顺序累积记录；会话级失败时保留已有记录并填充顶层错误
#[derive(Debug)]
pub struct ResultAggregator {
    url: String,
    records: Vec<ReelRecord>,
    links: HashSet<String>,
}

impl ResultAggregator {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            records: Vec::new(),
            links: HashSet::new(),
        }
    }

    /// 追加一条记录，重复链接会被丢弃
    pub fn push(&mut self, record: ReelRecord) {
        if !self.links.insert(record.link.clone()) {
            tracing::warn!("Dropping duplicate record for {}", record.link);
            return;
        }
        self.records.push(record);
    }

    /// 条目级失败数量
    pub fn failed_items(&self) -> usize {
        self.records.iter().filter(|r| r.is_failed()).count()
    }

    /// 成功完成
    pub fn finish(self) -> ScrapeResult {
        self.build(None)
    }

    /// 会话级失败
    pub fn fail(self, error: &HarvestError) -> ScrapeResult {
        self.build(Some(error.to_string()))
    }

    fn build(self, error: Option<String>) -> ScrapeResult {
        ScrapeResult {
            url: self.url,
            crawled_at: Utc::now(),
            count: self.records.len(),
            reels: self.records,
            error,
        }
    }
}
