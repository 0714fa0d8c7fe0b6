// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 测试辅助工具

pub mod fake_browser;

pub use fake_browser::{FakePage, FakeWeb};
