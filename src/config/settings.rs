// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::resource_filter::ResourceClass;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含服务器、浏览器、采集、日志和指标等所有配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 服务器配置
    pub server: ServerSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 采集流程配置
    pub harvest: HarvestSettings,
    /// 日志配置
    pub logging: LoggingSettings,
    /// 指标配置
    pub metrics: MetricsSettings,
}

/// 服务器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    /// 服务器监听主机地址
    pub host: String,
    /// 服务器监听端口
    pub port: u16,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 是否无头模式
    pub headless: bool,
    /// Chrome 可执行文件路径，未设置时自动探测
    pub executable: Option<String>,
    /// 远程调试地址，设置后连接已有实例而不是启动新进程
    pub remote_debugging_url: Option<String>,
    /// 自定义 User-Agent
    pub user_agent: Option<String>,
    /// CDP 命令超时（秒）
    pub request_timeout_secs: u64,
    /// 浏览器启动超时（秒）
    pub launch_timeout_secs: u64,
    /// 需要拦截的资源类型
    pub blocked_resources: Vec<ResourceClass>,
    /// 网络空闲判定：允许的最大进行中请求数
    pub max_inflight_requests: usize,
    /// 网络空闲判定：持续时间（毫秒）
    pub network_idle_ms: u64,
}

/// 采集流程配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct HarvestSettings {
    /// 滚动最大轮数
    pub max_rounds: u32,
    /// 滚动后停顿下限（毫秒）
    pub scroll_pause_min_ms: u64,
    /// 滚动后停顿上限（毫秒）
    pub scroll_pause_max_ms: u64,
    /// 每次滚动的视口高度倍数下限
    pub scroll_factor_min: f64,
    /// 每次滚动的视口高度倍数上限
    pub scroll_factor_max: f64,
    /// 导航失败后的重试次数
    pub retry_attempts: u32,
    /// 重试基础退避（毫秒）
    pub retry_base_delay_ms: u64,
    /// 单次导航超时（秒）
    pub navigation_timeout_secs: u64,
    /// 列表页加载后的稳定等待（毫秒）
    pub settle_delay_ms: u64,
}

/// 日志配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    /// 默认过滤器，`RUST_LOG` 优先
    pub filter: String,
    /// 是否输出 JSON 格式
    pub json: bool,
}

/// 指标配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启用 Prometheus 导出
    pub enabled: bool,
    /// 导出监听地址
    pub listen: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从配置文件和环境变量加载配置，支持默认值。`PORT` 环境变量覆盖监听端口。
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Self::defaults()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("REELRS").separator("__"))
            .set_override_option("server.port", std::env::var("PORT").ok())?;

        builder.build()?.try_deserialize()
    }

    /// 仅包含默认值的配置构建器
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            // Browser
            .set_default("browser.headless", true)?
            .set_default("browser.request_timeout_secs", 30)?
            .set_default("browser.launch_timeout_secs", 30)?
            .set_default(
                "browser.blocked_resources",
                vec!["image", "font", "stylesheet", "media"],
            )?
            .set_default("browser.max_inflight_requests", 2)?
            .set_default("browser.network_idle_ms", 500)?
            // Harvest
            .set_default("harvest.max_rounds", 16)?
            .set_default("harvest.scroll_pause_min_ms", 900)?
            .set_default("harvest.scroll_pause_max_ms", 1400)?
            .set_default("harvest.scroll_factor_min", 1.2)?
            .set_default("harvest.scroll_factor_max", 1.5)?
            .set_default("harvest.retry_attempts", 2)?
            .set_default("harvest.retry_base_delay_ms", 800)?
            .set_default("harvest.navigation_timeout_secs", 40)?
            .set_default("harvest.settle_delay_ms", 2000)?
            // Logging
            .set_default("logging.filter", "info,reelrs=debug")?
            .set_default("logging.json", false)?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen", "0.0.0.0:9000")
    }
}
