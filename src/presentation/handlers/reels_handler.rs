// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::{
    application::dto::reels_request::ReelsQueryDto,
    domain::services::harvest_service::HarvestService,
    presentation::errors::AppError,
};

/// 采集账号的短视频列表
///
/// # 参数
///
/// * `service` - 采集服务实例
/// * `query` - `url` 和可选的 `limit`
///
/// # 返回值
///
/// - 200：采集结果（包括部分条目失败）
/// - 400：参数无效，`{ "error": ... }`
/// - 500：会话或列表页失败，结果中带 `error`
pub async fn list_reels(
    Extension(service): Extension<Arc<HarvestService>>,
    Query(query): Query<ReelsQueryDto>,
) -> Result<Response, AppError> {
    let request = query.into_request()?;
    info!(url = %request.address(), limit = request.limit(), "Reels request accepted");

    let result = service.harvest(&request).await;
    let status = if result.error.is_some() {
        StatusCode::INTERNAL_SERVER_ERROR
    } else {
        StatusCode::OK
    };

    Ok((status, Json(result)).into_response())
}
