// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 内存中的假浏览器
//!
//! 列表页按滚动次数逐步显示锚点，条目页是静态 HTML，选择器查询由 `scraper` 完成

use async_trait::async_trait;
use reelrs::domain::harvest::links::is_item_link;
use reelrs::domain::harvest::scripts;
use reelrs::engines::resource_filter::ResourceFilter;
use reelrs::engines::traits::{BrowserLauncher, BrowserPage, BrowserSession, EngineError};
use reelrs::utils::url_utils::resolve_href;
use scraper::{Html, Node, Selector};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

#[derive(Debug, Clone)]
enum FakeDocument {
    Listing { hrefs: Vec<String>, reveal: Vec<usize> },
    Item(String),
}

impl FakeDocument {
    fn html(&self, scrolls: usize) -> String {
        match self {
            FakeDocument::Listing { hrefs, reveal } => {
                let visible = reveal
                    .get(scrolls)
                    .or_else(|| reveal.last())
                    .copied()
                    .unwrap_or(hrefs.len())
                    .min(hrefs.len());
                let anchors: String = hrefs[..visible]
                    .iter()
                    .map(|href| format!(r#"<a href="{}">item</a>"#, href))
                    .collect();
                format!("<html><body><main>{}</main></body></html>", anchors)
            }
            FakeDocument::Item(html) => html.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FakeSite {
    documents: HashMap<String, FakeDocument>,
    hanging: HashSet<String>,
    failing_launch: bool,
    failing_page: bool,
    failing_probe: bool,
}

/// 浏览器活动记录
#[derive(Debug, Default)]
pub struct Activity {
    launches: AtomicUsize,
    sessions_closed: AtomicUsize,
    sessions_released: AtomicUsize,
    pages_closed: AtomicUsize,
    pages_released: AtomicUsize,
    scrolls: AtomicUsize,
    filter_installed: AtomicBool,
    filter_before_navigation: AtomicBool,
    navigations: Mutex<Vec<String>>,
    remaining_failures: Mutex<HashMap<String, u32>>,
}

/// 假网站及其浏览器
#[derive(Debug, Clone, Default)]
pub struct FakeWeb {
    site: FakeSite,
    activity: Arc<Activity>,
}

#[allow(dead_code)]
impl FakeWeb {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册列表页
    ///
    /// `reveal[n]` 是第 n 次滚动之后可见的锚点数，超出部分沿用最后一个值
    pub fn listing(mut self, url: &str, hrefs: Vec<String>, reveal: Vec<usize>) -> Self {
        self.site
            .documents
            .insert(url.to_string(), FakeDocument::Listing { hrefs, reveal });
        self
    }

    /// 注册条目页
    pub fn item(mut self, link: &str, html: impl Into<String>) -> Self {
        self.site
            .documents
            .insert(link.to_string(), FakeDocument::Item(html.into()));
        self
    }

    /// 前 `times` 次导航到 `url` 失败
    pub fn fail_navigation(self, url: &str, times: u32) -> Self {
        self.activity
            .remaining_failures
            .lock()
            .unwrap()
            .insert(url.to_string(), times);
        self
    }

    /// 导航到 `url` 永远不返回
    pub fn hang_navigation(mut self, url: &str) -> Self {
        self.site.hanging.insert(url.to_string());
        self
    }

    pub fn failing_launch(mut self) -> Self {
        self.site.failing_launch = true;
        self
    }

    pub fn failing_page(mut self) -> Self {
        self.site.failing_page = true;
        self
    }

    pub fn failing_probe(mut self) -> Self {
        self.site.failing_probe = true;
        self
    }

    pub fn launcher(&self) -> Arc<dyn BrowserLauncher> {
        Arc::new(FakeLauncher {
            site: Arc::new(self.site.clone()),
            activity: self.activity.clone(),
        })
    }

    /// 不经过会话直接创建页面
    pub fn page(&self) -> FakePage {
        FakePage::new(Arc::new(self.site.clone()), self.activity.clone())
    }

    pub fn launches(&self) -> usize {
        self.activity.launches.load(Ordering::SeqCst)
    }

    pub fn sessions_closed(&self) -> usize {
        self.activity.sessions_closed.load(Ordering::SeqCst)
    }

    /// 会话被释放的次数，包括未调用 `close` 就被丢弃的情况
    pub fn sessions_released(&self) -> usize {
        self.activity.sessions_released.load(Ordering::SeqCst)
    }

    pub fn pages_released(&self) -> usize {
        self.activity.pages_released.load(Ordering::SeqCst)
    }

    pub fn pages_closed(&self) -> usize {
        self.activity.pages_closed.load(Ordering::SeqCst)
    }

    pub fn scrolls(&self) -> usize {
        self.activity.scrolls.load(Ordering::SeqCst)
    }

    pub fn filter_installed(&self) -> bool {
        self.activity.filter_installed.load(Ordering::SeqCst)
    }

    pub fn filter_installed_before_navigation(&self) -> bool {
        self.activity.filter_before_navigation.load(Ordering::SeqCst)
    }

    pub fn navigations(&self) -> Vec<String> {
        self.activity.navigations.lock().unwrap().clone()
    }

    pub fn navigations_to(&self, url: &str) -> usize {
        self.navigations().iter().filter(|u| u.as_str() == url).count()
    }
}

struct FakeLauncher {
    site: Arc<FakeSite>,
    activity: Arc<Activity>,
}

#[async_trait]
impl BrowserLauncher for FakeLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        self.activity.launches.fetch_add(1, Ordering::SeqCst);
        if self.site.failing_launch {
            return Err(EngineError::Launch("chrome not found".to_string()));
        }
        Ok(Box::new(FakeSession {
            site: self.site.clone(),
            activity: self.activity.clone(),
        }))
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

struct FakeSession {
    site: Arc<FakeSite>,
    activity: Arc<Activity>,
}

#[async_trait]
impl BrowserSession for FakeSession {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, EngineError> {
        if self.site.failing_page {
            return Err(EngineError::Page("target crashed".to_string()));
        }
        Ok(Box::new(FakePage::new(
            self.site.clone(),
            self.activity.clone(),
        )))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.activity.sessions_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakeSession {
    fn drop(&mut self) {
        self.activity.sessions_released.fetch_add(1, Ordering::SeqCst);
    }
}

/// 假页面
pub struct FakePage {
    site: Arc<FakeSite>,
    activity: Arc<Activity>,
    current: Mutex<Option<String>>,
    scrolls: AtomicUsize,
}

impl FakePage {
    fn new(site: Arc<FakeSite>, activity: Arc<Activity>) -> Self {
        Self {
            site,
            activity,
            current: Mutex::new(None),
            scrolls: AtomicUsize::new(0),
        }
    }

    fn document(&self) -> Html {
        let current = self.current.lock().unwrap().clone();
        let html = current
            .and_then(|url| self.site.documents.get(&url).cloned())
            .map(|doc| doc.html(self.scrolls.load(Ordering::SeqCst)))
            .unwrap_or_else(|| "<html><body></body></html>".to_string());
        Html::parse_document(&html)
    }

    fn source(&self) -> String {
        let current = self.current.lock().unwrap().clone();
        current
            .and_then(|url| self.site.documents.get(&url).cloned())
            .map(|doc| doc.html(self.scrolls.load(Ordering::SeqCst)))
            .unwrap_or_default()
    }

    fn select(&self, selector: &str, attribute: &str) -> Result<Vec<String>, EngineError> {
        let selector = Selector::parse(selector)
            .map_err(|e| EngineError::Evaluation(format!("bad selector: {:?}", e)))?;
        let document = self.document();
        Ok(document
            .select(&selector)
            .filter_map(|element| element.value().attr(attribute).map(String::from))
            .collect())
    }

    fn visible_text(&self) -> String {
        let document = self.document();
        let body = Selector::parse("body").unwrap();
        let Some(body) = document.select(&body).next() else {
            return String::new();
        };
        body.descendants()
            .filter_map(|node| {
                let text = match node.value() {
                    Node::Text(text) => text,
                    _ => return None,
                };
                let hidden = node
                    .parent()
                    .and_then(|parent| parent.value().as_element().map(|e| e.name().to_string()))
                    .map(|name| name == "script" || name == "style")
                    .unwrap_or(false);
                (!hidden).then(|| text.trim().to_string())
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// 与页面内计数脚本一致：解析为绝对地址后按条目格式过滤并去重
    fn probe(&self) -> usize {
        let current = self.current.lock().unwrap().clone();
        let Some(base) = current.and_then(|url| Url::parse(&url).ok()) else {
            return 0;
        };
        self.select("a[href]", "href")
            .unwrap_or_default()
            .iter()
            .filter_map(|href| resolve_href(&base, href))
            .filter(|link| is_item_link(link))
            .collect::<HashSet<_>>()
            .len()
    }
}

#[async_trait]
impl BrowserPage for FakePage {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        self.activity
            .navigations
            .lock()
            .unwrap()
            .push(url.to_string());

        if self.site.hanging.contains(url) {
            std::future::pending::<()>().await;
        }

        {
            let mut failures = self.activity.remaining_failures.lock().unwrap();
            if let Some(remaining) = failures.get_mut(url) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Err(EngineError::Navigation(format!(
                        "net::ERR_CONNECTION_RESET at {}",
                        url
                    )));
                }
            }
        }

        *self.current.lock().unwrap() = Some(url.to_string());
        self.scrolls.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        if script == scripts::LINK_PROBE.as_str() {
            if self.site.failing_probe {
                return Err(EngineError::Evaluation("probe crashed".to_string()));
            }
            return Ok(Value::from(self.probe()));
        }
        if scripts::is_scroll(script) {
            self.scrolls.fetch_add(1, Ordering::SeqCst);
            self.activity.scrolls.fetch_add(1, Ordering::SeqCst);
            return Ok(Value::Null);
        }
        if script == scripts::VISIBLE_TEXT {
            return Ok(Value::String(self.visible_text()));
        }
        if script == scripts::DOCUMENT_SOURCE {
            return Ok(Value::String(self.source()));
        }
        Ok(Value::Null)
    }

    async fn query_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>, EngineError> {
        self.select(selector, attribute)
    }

    async fn query_single(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, EngineError> {
        Ok(self.select(selector, attribute)?.into_iter().next())
    }

    async fn block_resources(&self, filter: &ResourceFilter) -> Result<(), EngineError> {
        if !filter.is_empty() {
            let untouched = self.activity.navigations.lock().unwrap().is_empty();
            self.activity.filter_installed.store(true, Ordering::SeqCst);
            self.activity
                .filter_before_navigation
                .store(untouched, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        self.activity.pages_closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

impl Drop for FakePage {
    fn drop(&mut self) {
        self.activity.pages_released.fetch_add(1, Ordering::SeqCst);
    }
}
