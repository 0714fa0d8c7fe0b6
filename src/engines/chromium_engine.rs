// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use crate::domain::harvest::scripts::js_string;
use crate::engines::resource_filter::{ResourceClass, ResourceFilter};
use crate::engines::traits::{BrowserLauncher, BrowserPage, BrowserSession, EngineError};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams as FetchEnableParams, EventRequestPaused,
    FailRequestParams, RequestPattern,
};
use chromiumoxide::cdp::browser_protocol::network::{
    EnableParams as NetworkEnableParams, ErrorReason, EventLoadingFailed, EventLoadingFinished,
    EventRequestWillBeSent, ResourceType,
};
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Chromium 启动器
///
/// 基于chromiumoxide实现，每次调用启动一个独立的浏览器进程（或连接远程实例）
pub struct ChromiumLauncher {
    settings: BrowserSettings,
}

impl ChromiumLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    async fn start(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let (browser, mut handler, profile_dir) =
            if let Some(ref url) = self.settings.remote_debugging_url {
                info!("Connecting to remote Chrome instance at: {}", url);
                let (browser, handler) = Browser::connect(url.as_str()).await.map_err(|e| {
                    EngineError::Launch(format!("Failed to connect to remote Chrome: {}", e))
                })?;
                (browser, handler, None)
            } else {
                // Concurrent sessions must not share a profile directory
                let profile_dir = std::env::temp_dir().join(format!("reelrs-{}", Uuid::new_v4()));
                // Removed again if launching fails or times out
                let profile = ProfileDir::new(profile_dir.clone());
                let mut builder = BrowserConfig::builder()
                    .no_sandbox()
                    .request_timeout(Duration::from_secs(self.settings.request_timeout_secs))
                    .user_data_dir(&profile_dir)
                    .arg("--disable-gpu")
                    .arg("--disable-dev-shm-usage");

                if !self.settings.headless {
                    builder = builder.with_head();
                }
                if let Some(ref path) = self.settings.executable {
                    builder = builder.chrome_executable(path);
                }

                let config = builder.build().map_err(EngineError::Launch)?;
                let (browser, handler) = Browser::launch(config)
                    .await
                    .map_err(|e| EngineError::Launch(e.to_string()))?;
                (browser, handler, Some(profile))
            };

        // Spawn a handler to process browser events
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {}", e);
                }
            }
        });

        Ok(Box::new(ChromiumSession {
            browser,
            handler_task,
            profile_dir,
            settings: self.settings.clone(),
        }))
    }
}

#[async_trait]
impl BrowserLauncher for ChromiumLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, EngineError> {
        let timeout = Duration::from_secs(self.settings.launch_timeout_secs);
        tokio::time::timeout(timeout, self.start())
            .await
            .map_err(|_| EngineError::Timeout(timeout))?
    }

    fn name(&self) -> &'static str {
        "chromium"
    }
}

/// Chromium 浏览器会话
///
/// 本地启动的会话在关闭时结束浏览器进程并删除临时配置目录；
/// 远程会话只断开连接，不关闭远程浏览器。
pub struct ChromiumSession {
    browser: Browser,
    handler_task: JoinHandle<()>,
    // Declared after `browser` so the process is killed before removal starts
    profile_dir: Option<ProfileDir>,
    settings: BrowserSettings,
}

#[async_trait]
impl BrowserSession for ChromiumSession {
    async fn new_page(&self) -> Result<Box<dyn BrowserPage>, EngineError> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Page(e.to_string()))?;

        if let Some(ref user_agent) = self.settings.user_agent {
            page.set_user_agent(user_agent.as_str())
                .await
                .map_err(|e| EngineError::Page(e.to_string()))?;
        }

        let page = ChromiumPage::attach(page, &self.settings).await?;
        Ok(Box::new(page))
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        let mut session = *self;

        let result = if session.profile_dir.is_some() {
            let closed = session
                .browser
                .close()
                .await
                .map(|_| ())
                .map_err(|e| EngineError::Launch(format!("Failed to close browser: {}", e)));
            if let Err(e) = session.browser.wait().await {
                debug!("Waiting for browser exit failed: {}", e);
            }
            closed
        } else {
            Ok(())
        };

        session.handler_task.abort();

        if let Some(dir) = session.profile_dir.take() {
            dir.remove().await;
        }

        result
    }
}

impl Drop for ChromiumSession {
    fn drop(&mut self) {
        // The child process itself is killed by chromiumoxide when `Browser` drops,
        // the profile directory by `ProfileDir` after it
        self.handler_task.abort();
    }
}

/// 本地启动的临时配置目录
///
/// 显式 `remove` 在浏览器退出后同步删除；请求被取消时由 `Drop` 在后台删除，
/// 浏览器进程可能仍在退出，所以会短暂重试
pub struct ProfileDir {
    path: Option<PathBuf>,
}

const PROFILE_REMOVE_ATTEMPTS: u32 = 5;
const PROFILE_REMOVE_DELAY: Duration = Duration::from_millis(200);

impl ProfileDir {
    pub fn new(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    /// 删除目录，不存在视为成功
    pub async fn remove(mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = tokio::fs::remove_dir_all(&path).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!("Failed to remove profile directory {}: {}", path.display(), e);
                }
            }
        }
    }
}

impl Drop for ProfileDir {
    fn drop(&mut self) {
        let Some(path) = self.path.take() else {
            return;
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || remove_with_retry(&path, PROFILE_REMOVE_ATTEMPTS));
            }
            Err(_) => remove_with_retry(&path, 1),
        }
    }
}

fn remove_with_retry(path: &Path, attempts: u32) {
    for attempt in 1..=attempts {
        match std::fs::remove_dir_all(path) {
            Ok(()) => return,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
            Err(e) if attempt == attempts => {
                warn!("Leaving profile directory {}: {}", path.display(), e);
            }
            Err(_) => std::thread::sleep(PROFILE_REMOVE_DELAY),
        }
    }
}

enum Traffic {
    Started(String),
    Settled(String),
}

/// Chromium 页面
///
/// 通过网络事件跟踪进行中的请求，用于判断网络空闲
pub struct ChromiumPage {
    page: Page,
    inflight: Arc<Mutex<HashSet<String>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    max_inflight: usize,
    idle_window: Duration,
}

impl ChromiumPage {
    async fn attach(page: Page, settings: &BrowserSettings) -> Result<Self, EngineError> {
        let page_error = |e: chromiumoxide::error::CdpError| EngineError::Page(e.to_string());

        page.execute(NetworkEnableParams::default())
            .await
            .map_err(page_error)?;

        let started = page
            .event_listener::<EventRequestWillBeSent>()
            .await
            .map_err(page_error)?
            .map(|event| Traffic::Started(event.request_id.inner().clone()));
        let finished = page
            .event_listener::<EventLoadingFinished>()
            .await
            .map_err(page_error)?
            .map(|event| Traffic::Settled(event.request_id.inner().clone()));
        let failed = page
            .event_listener::<EventLoadingFailed>()
            .await
            .map_err(page_error)?
            .map(|event| Traffic::Settled(event.request_id.inner().clone()));

        let mut traffic = Box::pin(futures::stream::select(
            started,
            futures::stream::select(finished, failed),
        ));

        let inflight = Arc::new(Mutex::new(HashSet::new()));
        let tracker = inflight.clone();
        let tracker_task = tokio::spawn(async move {
            while let Some(event) = traffic.next().await {
                let mut requests = tracker.lock();
                match event {
                    Traffic::Started(id) => {
                        requests.insert(id);
                    }
                    Traffic::Settled(id) => {
                        requests.remove(&id);
                    }
                }
            }
        });

        Ok(Self {
            page,
            inflight,
            tasks: Mutex::new(vec![tracker_task]),
            max_inflight: settings.max_inflight_requests,
            idle_window: Duration::from_millis(settings.network_idle_ms),
        })
    }

    /// 等待进行中的请求数持续不超过阈值
    ///
    /// 本身不设上限，由调用方的导航超时约束
    async fn wait_for_network_idle(&self) {
        let mut quiet_since: Option<Instant> = None;
        loop {
            let busy = self.inflight.lock().len() > self.max_inflight;
            match quiet_since {
                _ if busy => quiet_since = None,
                None => quiet_since = Some(Instant::now()),
                Some(since) if since.elapsed() >= self.idle_window => return,
                Some(_) => {}
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl BrowserPage for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<(), EngineError> {
        self.inflight.lock().clear();

        self.page
            .goto(url)
            .await
            .map_err(|e| EngineError::Navigation(e.to_string()))?;

        self.wait_for_network_idle().await;
        Ok(())
    }

    async fn evaluate(&self, script: &str) -> Result<Value, EngineError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| EngineError::Evaluation(e.to_string()))?;
        Ok(result.value().cloned().unwrap_or(Value::Null))
    }

    async fn query_all(&self, selector: &str, attribute: &str) -> Result<Vec<String>, EngineError> {
        let script = format!(
            "Array.from(document.querySelectorAll({})).map(e => e.getAttribute({})).filter(v => v !== null)",
            js_string(selector),
            js_string(attribute)
        );
        let value = self.evaluate(&script).await?;
        serde_json::from_value(value).map_err(|e| EngineError::Evaluation(e.to_string()))
    }

    async fn query_single(
        &self,
        selector: &str,
        attribute: &str,
    ) -> Result<Option<String>, EngineError> {
        let script = format!(
            "(() => {{ const e = document.querySelector({}); return e ? e.getAttribute({}) : null; }})()",
            js_string(selector),
            js_string(attribute)
        );
        match self.evaluate(&script).await? {
            Value::String(value) => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn block_resources(&self, filter: &ResourceFilter) -> Result<(), EngineError> {
        if filter.is_empty() {
            return Ok(());
        }

        let mut paused = self
            .page
            .event_listener::<EventRequestPaused>()
            .await
            .map_err(|e| EngineError::Page(e.to_string()))?;

        let page = self.page.clone();
        let filter = filter.clone();
        let interceptor = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let outcome = if filter.blocks(resource_class(&event.resource_type)) {
                    page.execute(FailRequestParams::new(
                        event.request_id.clone(),
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(event.request_id.clone()))
                        .await
                        .map(|_| ())
                };
                if let Err(e) = outcome {
                    debug!("Failed to resolve intercepted request: {}", e);
                }
            }
        });
        self.tasks.lock().push(interceptor);

        self.page
            .execute(
                FetchEnableParams::builder()
                    .pattern(RequestPattern::builder().url_pattern("*").build())
                    .build(),
            )
            .await
            .map_err(|e| EngineError::Page(e.to_string()))?;

        Ok(())
    }

    async fn close(self: Box<Self>) -> Result<(), EngineError> {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
        if let Err(e) = self.page.clone().close().await {
            warn!("Failed to close page: {}", e);
            return Err(EngineError::Page(e.to_string()));
        }
        Ok(())
    }
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        for task in self.tasks.lock().drain(..) {
            task.abort();
        }
    }
}

/// CDP 资源类型到过滤器分类的映射
fn resource_class(resource_type: &ResourceType) -> ResourceClass {
    match resource_type {
        ResourceType::Document => ResourceClass::Document,
        ResourceType::Stylesheet => ResourceClass::Stylesheet,
        ResourceType::Image => ResourceClass::Image,
        ResourceType::Media => ResourceClass::Media,
        ResourceType::Font => ResourceClass::Font,
        ResourceType::Script => ResourceClass::Script,
        ResourceType::Xhr => ResourceClass::Xhr,
        ResourceType::Fetch => ResourceClass::Fetch,
        _ => ResourceClass::Other,
    }
}
