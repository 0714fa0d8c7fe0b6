// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 采集引擎组件
///
/// 导航、滚动稳定、链接收集、条目提取和结果聚合
pub mod aggregator;
pub mod extractor;
pub mod links;
pub mod navigation;
pub mod scripts;
pub mod scroll;

pub use aggregator::ResultAggregator;
pub use extractor::{ItemExtractor, MediaElementStrategy, MetaTagStrategy, VideoUrlStrategy};
pub use links::LinkCollector;
pub use navigation::NavigationController;
pub use scroll::{ScrollConfig, ScrollOutcome, ScrollStabilizer, StopReason};
