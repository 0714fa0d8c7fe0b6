// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Deserialize;
use std::collections::HashSet;

/// 资源类型
///
/// 浏览器请求的资源分类，与具体的自动化协议无关
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceClass {
    Document,
    Stylesheet,
    Image,
    Media,
    Font,
    Script,
    Xhr,
    Fetch,
    Other,
}

impl ResourceClass {
    /// 页面渲染和数据加载依赖的资源类型，永远不拦截
    pub fn is_essential(self) -> bool {
        matches!(
            self,
            ResourceClass::Document | ResourceClass::Script | ResourceClass::Xhr | ResourceClass::Fetch
        )
    }
}

/// 资源过滤器
///
/// 拦截图片、字体、样式表和媒体等非必要资源以降低页面负载
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceFilter {
    blocked: HashSet<ResourceClass>,
}

impl Default for ResourceFilter {
    fn default() -> Self {
        Self::new([
            ResourceClass::Image,
            ResourceClass::Font,
            ResourceClass::Stylesheet,
            ResourceClass::Media,
        ])
    }
}

impl ResourceFilter {
    /// 使用指定的拦截类型创建过滤器，必要类型会被忽略
    pub fn new(classes: impl IntoIterator<Item = ResourceClass>) -> Self {
        let blocked = classes
            .into_iter()
            .filter(|class| {
                if class.is_essential() {
                    tracing::warn!("Refusing to block essential resource class {:?}", class);
                    false
                } else {
                    true
                }
            })
            .collect();
        Self { blocked }
    }

    /// 是否拦截该类型的请求
    pub fn blocks(&self, class: ResourceClass) -> bool {
        self.blocked.contains(&class)
    }

    /// 是否没有任何拦截规则
    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }
}
