// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::presentation::handlers::reels_handler;
use axum::{routing::get, Router};

/// 创建应用路由
///
/// # 返回值
///
/// 返回配置好的路由，采集服务通过 `Extension` 注入
pub fn routes() -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/ig/reels", get(reels_handler::list_reels))
}

/// 存活确认端点
pub async fn root() -> &'static str {
    "reelrs is running"
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}
