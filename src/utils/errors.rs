// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use thiserror::Error;

/// 采集错误类型
///
/// 页面元素缺失不属于错误，对应字段返回空字符串即可
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HarvestError {
    /// 请求参数无效，不会进入采集引擎
    #[error("{0}")]
    Validation(String),

    /// 浏览器会话或页面无法建立
    #[error("browser session failed: {0}")]
    Session(String),

    /// 重试耗尽后页面仍无法加载
    #[error("failed to load {url}: {message}")]
    Navigation { url: String, message: String },
}
