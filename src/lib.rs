// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 负责请求参数的转换和校验
pub mod application;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含采集流程、数据模型和采集服务
pub mod domain;

/// 引擎模块
///
/// 浏览器能力接口及其 Chromium 实现
pub mod engines;

/// 基础设施模块
///
/// 提供指标导出等外部集成
pub mod infrastructure;

/// 表示层模块
///
/// 处理HTTP请求和响应，包括路由和处理器
pub mod presentation;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;
