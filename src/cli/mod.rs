// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 命令行接口模块
///
/// 定义子命令表面和错误分类到进程退出码的映射
pub mod commands;
pub mod exit_codes;

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// uxprobe - UX craft bug 分析工作流的命令行客户端
#[derive(Parser, Debug)]
#[command(
    name = "uxprobe",
    version,
    about = "Client toolkit for a local UX craft-bug analysis service",
    long_about = "Submits analysis jobs to a local UX analysis service, polls them to \
                  completion, and reports the findings. Also drives mock pages in a real \
                  browser, files craft bugs into a work item tracker, and calls a \
                  generative AI provider with rotating API keys."
)]
pub struct Cli {
    /// 覆盖分析服务基址
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// 输出格式
    #[arg(short, long, value_enum, default_value = "human", global = true)]
    pub format: OutputFormat,

    /// 只输出错误
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// 输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// 人类可读的状态行
    Human,
    /// 机读JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 探测分析服务是否存活
    Health,

    /// 提交分析作业并轮询到终态
    #[command(visible_alias = "a")]
    Analyze(AnalyzeArgs),

    /// 获取已有作业的完整报告
    #[command(visible_alias = "r")]
    Report(ReportArgs),

    /// 用真实浏览器执行mock页面交互脚本
    Exercise(ExerciseArgs),

    /// 工作项跟踪服务操作
    #[command(subcommand)]
    Workitem(WorkitemCommands),

    /// 调用生成式AI完成接口（带密钥轮换）
    Complete(CompleteArgs),
}

/// analyze 子命令参数
#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// 目标页面URL
    pub url: String,

    /// 场景标识符（例如 "1.4"）
    #[arg(short, long)]
    pub scenario: Option<String>,

    /// 启用的分析模块，可重复
    #[arg(short = 'm', long = "module")]
    pub modules: Vec<String>,

    /// 禁用的分析模块，可重复
    #[arg(long = "skip-module")]
    pub skip_modules: Vec<String>,

    /// 覆盖轮询间隔（秒）
    #[arg(long)]
    pub interval: Option<u64>,

    /// 覆盖最大轮询次数
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// 先托管启动本地分析服务，结束时终止它
    #[arg(long)]
    pub supervise: bool,
}

/// report 子命令参数
#[derive(clap::Args, Debug)]
pub struct ReportArgs {
    /// 作业标识符
    pub analysis_id: String,
}

/// exercise 子命令参数
#[derive(clap::Args, Debug)]
pub struct ExerciseArgs {
    /// 目标页面URL（缺省时取脚本内的url）
    pub url: Option<String>,

    /// YAML动作脚本路径
    #[arg(short = 's', long)]
    pub script: Option<PathBuf>,
}

/// workitem 子命令
#[derive(Subcommand, Debug)]
pub enum WorkitemCommands {
    /// 查询工作项
    Get {
        /// 工作项编号
        id: u64,
    },
    /// 创建工作项
    Create {
        /// 工作项类型（例如 Bug）
        #[arg(short = 't', long, default_value = "Bug")]
        item_type: String,
        /// 标题
        title: String,
        /// 描述
        #[arg(short, long)]
        description: Option<String>,
        /// 标签，可重复
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

/// complete 子命令参数
#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// 提示词
    pub prompt: String,
}
