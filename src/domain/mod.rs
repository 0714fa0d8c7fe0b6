// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含系统的核心业务逻辑，包括：
/// - 领域模型（models）：请求、条目记录和采集结果
/// - 采集组件（harvest）：导航、滚动、链接收集、提取与聚合
/// - 服务（services）：编排一次完整采集的领域服务
///
/// 浏览器只通过 `engines::traits` 中的能力接口访问。
pub mod harvest;
pub mod models;
pub mod services;
