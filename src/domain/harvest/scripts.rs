// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 在页面中执行的脚本

use crate::domain::harvest::links::ITEM_LINK_PATTERN;
use once_cell::sync::Lazy;
use serde_json::Value;

/// 当前已渲染的不同条目链接数量
///
/// 与链接收集器使用同一个地址格式，重复链接和其他站点的链接不计入
pub static LINK_PROBE: Lazy<String> = Lazy::new(|| {
    format!(
        "(() => {{ const pattern = new RegExp({}); \
         return new Set(Array.from(document.querySelectorAll('a[href]')) \
         .map(a => a.href).filter(href => pattern.test(href))).size; }})()",
        js_string(ITEM_LINK_PATTERN)
    )
});

/// 页面可见文本
pub const VISIBLE_TEXT: &str = "document.body ? document.body.innerText : ''";

/// 渲染后的完整文档源码
pub const DOCUMENT_SOURCE: &str =
    "document.documentElement ? document.documentElement.outerHTML : ''";

/// 所有带链接的锚点
pub const ANCHOR_SELECTOR: &str = "a[href]";

/// 生成 JS 字符串字面量
pub fn js_string(value: &str) -> String {
    Value::String(value.to_string()).to_string()
}

const SCROLL_PREFIX: &str = "window.scrollBy(0, window.innerHeight * ";

/// 向下滚动 `factor` 个视口高度
pub fn scroll_by(factor: f64) -> String {
    format!("{}{:.2})", SCROLL_PREFIX, factor)
}

/// 是否为滚动脚本
pub fn is_scroll(script: &str) -> bool {
    script.starts_with(SCROLL_PREFIX)
}
