// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 命令行接口模块
///
/// 定义子命令表面、命令分发和退出码映射
pub mod cli;

/// 客户端模块
///
/// 实现对本地分析服务的 提交 → 轮询 → 取报告 模式
pub mod client;

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体和报告提取逻辑
pub mod domain;

/// 基础设施模块
///
/// 提供外部协作方集成：工作项跟踪、生成式AI、浏览器驱动
pub mod infrastructure;

/// 服务托管模块
///
/// 作用域化的本地分析服务进程生命周期管理
pub mod supervisor;

/// 工具模块
///
/// 提供轮询策略、输入验证和遥测等通用功能
pub mod utils;
