// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// - 采集服务（harvest_service）：管理浏览器会话生命周期并驱动采集流程
pub mod harvest_service;
