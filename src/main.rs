// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::Extension;
use reelrs::config::settings::Settings;
use reelrs::domain::services::harvest_service::{HarvestConfig, HarvestService};
use reelrs::engines::chromium_engine::ChromiumLauncher;
use reelrs::engines::traits::BrowserLauncher;
use reelrs::infrastructure::metrics;
use reelrs::presentation::routes;
use reelrs::utils::telemetry;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

/// 主函数
///
/// 应用程序入口点，负责初始化所有组件并启动服务
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Load configuration
    let settings = Settings::new()?;

    // 2. Initialize logging
    telemetry::init_telemetry(&settings.logging);
    info!("Starting reelrs...");

    // Initialize Prometheus Metrics
    metrics::init_metrics(&settings.metrics);

    // 3. Initialize Components
    let launcher: Arc<dyn BrowserLauncher> =
        Arc::new(ChromiumLauncher::new(settings.browser.clone()));
    let config = HarvestConfig::from_settings(&settings.harvest, &settings.browser);
    let service = Arc::new(HarvestService::new(launcher, config));
    info!("Harvest service initialized");

    let app = routes::routes()
        .layer(Extension(service))
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
