// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 定义分析作业及其报告的核心数据结构
pub mod job;
pub mod report;
