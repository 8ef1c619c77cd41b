// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use validator::Validate;

/// 分析任务请求
///
/// 描述一次提交给本地分析服务的分析作业：目标页面URL、
/// 可选的场景标识符，以及各分析模块的开关。每次调用都新建
/// 一个请求，调用方不持久化它。
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobRequest {
    /// 目标URL，要分析的页面地址
    #[validate(custom(function = crate::utils::validators::validate_target_url))]
    pub url: String,
    /// 场景标识符，例如 "1.4"
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = crate::utils::validators::validate_scenario_id))]
    pub scenario_id: Option<String>,
    /// 分析模块开关，模块名到启用与否的映射
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub modules: HashMap<String, bool>,
}

impl JobRequest {
    /// 创建只指定URL的请求，所有模块使用服务端默认开关
    pub fn for_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            scenario_id: None,
            modules: HashMap::new(),
        }
    }

    /// 指定场景标识符
    pub fn with_scenario(mut self, scenario_id: impl Into<String>) -> Self {
        self.scenario_id = Some(scenario_id.into());
        self
    }

    /// 开启或关闭一个分析模块
    pub fn with_module(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.modules.insert(name.into(), enabled);
        self
    }
}

/// 作业句柄
///
/// 提交成功后由远程服务返回。`analysis_id` 是后续所有轮询
/// 调用唯一需要的关联键；每次提交都会得到一个新的标识符，
/// 不会跨提交复用。本地只持有只读副本，进程退出即丢弃。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobHandle {
    /// 作业标识符（对调用方不透明）
    pub analysis_id: String,
    /// 提交时观察到的初始状态
    pub status: JobStatus,
}

/// 作业状态枚举
///
/// 状态只由远程服务变更，本地只做观察。未识别的线上状态
/// 字符串一律映射为 Unknown，绝不作为解析失败处理。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// 已入队，尚未开始分析
    #[default]
    Queued,
    /// 分析进行中
    Processing,
    /// 已完成，结果可获取
    Completed,
    /// 已失败，远程服务报告了失败
    Failed,
    /// 未知状态，服务返回了无法识别的值
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    /// 判断状态是否为终态
    ///
    /// 终态之后不再有任何状态转换。
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "queued"),
            JobStatus::Processing => write!(f, "processing"),
            JobStatus::Completed => write!(f, "completed"),
            JobStatus::Failed => write!(f, "failed"),
            JobStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for JobStatus {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "queued" | "pending" => JobStatus::Queued,
            "processing" | "running" => JobStatus::Processing,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Unknown,
        })
    }
}

/// 提交响应（线上格式）
#[derive(Debug, Deserialize)]
pub struct SubmitResponse {
    /// 新建作业的标识符
    pub analysis_id: String,
    /// 初始状态
    #[serde(default)]
    pub status: JobStatus,
}

/// 状态摘要（线上格式）
///
/// 轻量端点 `/api/analysis/{id}/status` 的响应，只携带状态
/// 和少量进度信息，不含完整结果。
#[derive(Debug, Deserialize)]
pub struct StatusSummary {
    /// 当前状态
    #[serde(default)]
    pub status: JobStatus,
    /// 进度百分比（0-100），服务可能不提供
    #[serde(default)]
    pub progress: Option<u8>,
    /// 服务附带的提示信息
    #[serde(default)]
    pub message: Option<String>,
}

/// 作业结果
///
/// 完整报告端点 `/api/reports/{id}` 的响应。除 `status` 字段外
/// 整个负载对本地透明，按原样透传给报告提取逻辑。
#[derive(Debug, Clone, Deserialize)]
pub struct JobResult {
    /// 结果对应的终态
    #[serde(default)]
    pub status: JobStatus,
    /// 完整结果负载（模块得分、发现项等，结构不做假设）
    #[serde(flatten)]
    pub payload: serde_json::Value,
}

/// 健康检查信息（线上格式）
#[derive(Debug, Clone, Deserialize)]
pub struct HealthInfo {
    /// 服务自报的状态字符串
    pub status: String,
    /// 服务版本
    #[serde(default)]
    pub version: Option<String>,
    /// 服务启用的特性列表
    #[serde(default)]
    pub features: Vec<String>,
}
