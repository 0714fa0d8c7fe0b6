// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个短视频条目的链接
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReelReference {
    pub link: String,
}

impl ReelReference {
    pub fn new(link: impl Into<String>) -> Self {
        Self { link: link.into() }
    }
}

/// 单个条目的采集记录
///
/// 创建后不再修改。`error` 非空时 `video_url` 一定为空。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReelRecord {
    /// 链接路径中的短码，可能为空
    pub short_code: String,
    /// 视频资源地址，可能为空
    pub video_url: String,
    /// 条目页地址
    pub link: String,
    /// 播放次数，仅包含数字，可能为空
    pub view_count: String,
    /// 条目级错误
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ReelRecord {
    /// 成功提取的记录
    pub fn extracted(
        reference: &ReelReference,
        short_code: String,
        video_url: String,
        view_count: String,
    ) -> Self {
        Self {
            short_code,
            video_url,
            link: reference.link.clone(),
            view_count,
            error: None,
        }
    }

    /// 条目页无法加载时的记录
    pub fn failed(reference: &ReelReference, error: impl Into<String>) -> Self {
        Self {
            short_code: String::new(),
            video_url: String::new(),
            link: reference.link.clone(),
            view_count: String::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.error.is_some()
    }
}

/// 一次采集的最终结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeResult {
    /// 请求的列表页地址
    pub url: String,
    /// 完成时间
    pub crawled_at: DateTime<Utc>,
    /// 记录数，等于 `reels.len()`
    pub count: usize,
    /// 按访问顺序排列的记录
    pub reels: Vec<ReelRecord>,
    /// 会话级错误
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
