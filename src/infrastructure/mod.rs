// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施模块
///
/// 提供外部协作方集成：工作项跟踪服务、生成式AI提供商和浏览器驱动
pub mod genai;
pub mod page_driver;
pub mod workitem;
