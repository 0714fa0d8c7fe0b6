// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::resource_filter::ResourceFilter;
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// 浏览器启动或连接失败
    #[error("Browser launch failed: {0}")]
    Launch(String),
    /// 页面创建或关闭失败
    #[error("Page error: {0}")]
    Page(String),
    /// 页面导航失败
    #[error("Navigation failed: {0}")]
    Navigation(String),
    /// 页面脚本执行失败
    #[error("Evaluation failed: {0}")]
    Evaluation(String),
    /// 超时
    #[error("Timeout after {0:?}")]
    Timeout(Duration),
}

/// 浏览器页面能力
///
/// 采集引擎只通过这组操作访问页面，测试时可替换为假实现
#[async_trait]
pub trait BrowserPage: Send + Sync {
    /// 打开地址并等待网络空闲
    async fn navigate(&self, url: &str) -> Result<(), EngineError>;

    /// 在页面中执行脚本，返回 JSON 结果（无返回值时为 `Null`）
    async fn evaluate(&self, script: &str) -> Result<Value, EngineError>;

    /// 读取所有匹配元素的属性值，缺少该属性的元素被跳过
    async fn query_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>, EngineError>;

    /// 读取第一个匹配元素的属性值
    async fn query_single(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, EngineError>;

    /// 安装资源过滤器
    async fn block_resources(&self, filter: &ResourceFilter) -> Result<(), EngineError>;

    /// 关闭页面
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// 浏览器会话
///
/// 会话由创建它的请求独占，使用完毕必须调用 `close`
#[async_trait]
pub trait BrowserSession: Send + Sync {
    /// 创建新页面
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, EngineError>;

    /// 关闭会话并释放所有资源
    async fn close(self: Box<Self>) -> Result<(), EngineError>;
}

/// 浏览器启动器
#[async_trait]
pub trait BrowserLauncher: Send + Sync {
    /// 启动一个独立的浏览器会话
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError>;

    /// 启动器名称
    fn name(&self) -> &'static str;
}
