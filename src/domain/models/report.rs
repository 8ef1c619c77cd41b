// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::Serialize;
use serde_json::Value;
use std::fmt::Write as _;

/// 展示的样例发现项数量上限
const MAX_SAMPLE_FINDINGS: usize = 3;

/// 报告摘要
///
/// 从任意形状的分析结果负载中提取出的固定字段集合。提取是
/// 全函数：负载缺失任何字段都用哨兵值（`None` / 0 / 空列表）
/// 兜底，绝不报错或panic。
#[derive(Debug, Clone, Serialize)]
pub struct ReportSummary {
    /// 总体得分，缺失时显示为 N/A
    pub overall_score: Option<f64>,
    /// 问题总数
    pub total_issues: u64,
    /// 各模块摘要
    pub modules: Vec<ModuleSummary>,
    /// 样例发现项，最多3条
    pub sample_findings: Vec<String>,
}

/// 单个分析模块的摘要
#[derive(Debug, Clone, Serialize)]
pub struct ModuleSummary {
    /// 模块名
    pub name: String,
    /// 模块得分，缺失时显示为 N/A
    pub score: Option<f64>,
    /// 模块发现项数量
    pub findings: u64,
}

impl ReportSummary {
    /// 从完整结果负载中提取摘要
    ///
    /// 负载的结构不做任何假设：模块子对象可能挂在 `modules` 或
    /// `results` 下，发现项可能叫 `findings` 或 `issues`，得分和
    /// 计数可能缺失。所有缺失都退化为哨兵值。
    pub fn extract(payload: &Value) -> Self {
        let overall_score = payload
            .get("overall_score")
            .or_else(|| payload.get("score"))
            .and_then(Value::as_f64);

        let modules = extract_modules(payload);

        let total_issues = payload
            .get("total_issues")
            .or_else(|| payload.get("issue_count"))
            .and_then(Value::as_u64)
            .unwrap_or_else(|| modules.iter().map(|m| m.findings).sum());

        let sample_findings = collect_findings(payload)
            .into_iter()
            .take(MAX_SAMPLE_FINDINGS)
            .collect();

        Self {
            overall_score,
            total_issues,
            modules,
            sample_findings,
        }
    }

    /// 渲染为人类可读的状态块
    pub fn render(&self) -> String {
        let mut out = String::new();

        match self.overall_score {
            Some(score) => {
                let _ = writeln!(out, "Overall score: {:.1}", score);
            }
            None => {
                let _ = writeln!(out, "Overall score: N/A");
            }
        }
        let _ = writeln!(out, "Total issues:  {}", self.total_issues);

        for module in &self.modules {
            let score = module
                .score
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(|| "N/A".to_string());
            let _ = writeln!(
                out,
                "  [{}] score: {}, findings: {}",
                module.name, score, module.findings
            );
        }

        if !self.sample_findings.is_empty() {
            let _ = writeln!(out, "Sample findings:");
            for finding in &self.sample_findings {
                let _ = writeln!(out, "  - {}", finding);
            }
        }

        out
    }
}

/// 提取各模块摘要
fn extract_modules(payload: &Value) -> Vec<ModuleSummary> {
    let modules_obj = payload
        .get("modules")
        .or_else(|| payload.get("results"))
        .and_then(Value::as_object);

    let Some(map) = modules_obj else {
        return Vec::new();
    };

    map.iter()
        .map(|(name, module)| {
            let score = module.get("score").and_then(Value::as_f64);
            let findings = module
                .get("finding_count")
                .and_then(Value::as_u64)
                .or_else(|| {
                    module
                        .get("findings")
                        .or_else(|| module.get("issues"))
                        .and_then(Value::as_array)
                        .map(|a| a.len() as u64)
                })
                .unwrap_or(0);

            ModuleSummary {
                name: name.clone(),
                score,
                findings,
            }
        })
        .collect()
}

/// 收集所有发现项的文本描述
///
/// 顶层 `findings` 数组优先，否则遍历各模块的发现项列表。
/// 发现项可以是纯字符串，也可以是带 `message`/`description`
/// 字段的对象。
fn collect_findings(payload: &Value) -> Vec<String> {
    if let Some(top) = payload.get("findings").and_then(Value::as_array) {
        return top.iter().filter_map(finding_text).collect();
    }

    let modules_obj = payload
        .get("modules")
        .or_else(|| payload.get("results"))
        .and_then(Value::as_object);

    let Some(map) = modules_obj else {
        return Vec::new();
    };

    map.values()
        .filter_map(|module| {
            module
                .get("findings")
                .or_else(|| module.get("issues"))
                .and_then(Value::as_array)
        })
        .flatten()
        .filter_map(finding_text)
        .collect()
}

fn finding_text(finding: &Value) -> Option<String> {
    if let Some(s) = finding.as_str() {
        return Some(s.to_string());
    }
    finding
        .get("message")
        .or_else(|| finding.get("description"))
        .or_else(|| finding.get("title"))
        .and_then(Value::as_str)
        .map(String::from)
}
