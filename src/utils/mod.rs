// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
/// 包括轮询策略、输入验证和遥测监控等功能
pub mod poll_policy;
pub mod telemetry;
pub mod validators;
