// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::AnalysisSettings;
use crate::domain::models::job::{
    HealthInfo, JobHandle, JobRequest, JobResult, StatusSummary, SubmitResponse,
};
use crate::domain::models::report::ReportSummary;
use crate::utils::poll_policy::PollPolicy;
use metrics::{counter, histogram};
use serde::de::DeserializeOwned;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, warn};
use validator::Validate;


/// 客户端错误类型
///
/// 五类错误一一对应可观察到的失败形态，调用方（尤其是CLI）
/// 依赖这些分类产生互相区分的退出码，任何一类都不会被吞掉
/// 或折叠进泛化的"错误"。
#[derive(Error, Debug)]
pub enum ClientError {
    /// 连接错误，分析服务不可达
    #[error("Analysis service unreachable: {0}")]
    Connection(String),
    /// HTTP错误，服务返回了非2xx状态码
    #[error("HTTP {status}: {body}")]
    Http {
        /// HTTP状态码
        status: u16,
        /// 原始响应体
        body: String,
    },
    /// 解析错误，响应不是预期的JSON
    #[error("Invalid response payload: {0}")]
    Parse(String),
    /// 远程失败，作业状态为failed
    #[error("Analysis job {0} reported failure")]
    RemoteFailure(String),
    /// 超时，轮询预算耗尽而作业未到终态
    #[error("Polling budget exhausted after {attempts} attempts")]
    Timeout {
        /// 已消耗的轮询次数
        attempts: u32,
    },
    /// 无效请求，提交前的本地校验失败
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            ClientError::Connection(e.to_string())
        } else if e.is_timeout() {
            ClientError::Connection(format!("request timed out: {}", e))
        } else if e.is_decode() {
            ClientError::Parse(e.to_string())
        } else {
            ClientError::Connection(e.to_string())
        }
    }
}

/// 轮询结果
///
/// Done、Failed、TimedOut 三种收束方式互相区分：只有远程状态
/// 字面等于失败哨兵才算 Failed，预算耗尽永远是 TimedOut。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// 作业完成，结果可获取
    Completed {
        /// 实际消耗的轮询次数
        attempts: u32,
    },
    /// 远程报告失败
    Failed {
        /// 实际消耗的轮询次数
        attempts: u32,
    },
    /// 轮询预算耗尽
    TimedOut {
        /// 已消耗的轮询次数
        attempts: u32,
    },
}

/// 分析服务客户端
///
/// 实现 提交 → 轮询 → 取报告 的完整模式。一个实例持有一个
/// 带单次调用超时的 `reqwest::Client`；所有配置在构造时显式
/// 注入，库代码不读环境变量。
///
/// 单次HTTP调用的超时独立于外层轮询预算：一次卡住的调用最多
/// 消耗一次预算，不会无限阻塞整个等待。
pub struct AnalysisClient {
    client: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    /// 创建客户端
    ///
    /// # 参数
    ///
    /// * `settings` - 分析服务配置（基址和单次调用超时）
    pub fn new(settings: &AnalysisSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// 服务基址
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// 健康检查
    ///
    /// 提交前的存活探测。服务未启动时连接被拒绝，立即返回
    /// 连接错误，不做重试。
    pub async fn health(&self) -> Result<HealthInfo, ClientError> {
        let url = format!("{}/health", self.base_url);
        self.request_json(self.client.get(&url)).await
    }

    /// 提交分析作业
    ///
    /// 恰好发起一次网络调用，失败永远上报给调用方，绝不静默
    /// 重试。2xx响应但作业标识符为空同样按错误处理，不产生
    /// 句柄。
    pub async fn submit(&self, request: &JobRequest) -> Result<JobHandle, ClientError> {
        request
            .validate()
            .map_err(|e| ClientError::InvalidRequest(e.to_string()))?;

        let url = format!("{}/api/analyze", self.base_url);
        debug!(url = %request.url, scenario = ?request.scenario_id, "Submitting analysis job");

        let response: SubmitResponse = self
            .request_json(self.client.post(&url).json(request))
            .await?;

        if response.analysis_id.is_empty() {
            return Err(ClientError::Parse(
                "submission response carried an empty analysis_id".to_string(),
            ));
        }

        counter!("analysis_jobs_submitted_total").increment(1);
        info!(analysis_id = %response.analysis_id, status = %response.status, "Analysis job submitted");

        Ok(JobHandle {
            analysis_id: response.analysis_id,
            status: response.status,
        })
    }

    /// 查询作业状态
    ///
    /// 轻量摘要端点，轮询循环只打这个端点，不拉完整报告。
    pub async fn status(&self, analysis_id: &str) -> Result<StatusSummary, ClientError> {
        let url = format!(
            "{}/api/analysis/{}/status",
            self.base_url,
            urlencoding::encode(analysis_id)
        );
        self.request_json(self.client.get(&url)).await
    }

    /// 获取完整结果负载
    pub async fn result(&self, analysis_id: &str) -> Result<JobResult, ClientError> {
        let url = format!(
            "{}/api/reports/{}",
            self.base_url,
            urlencoding::encode(analysis_id)
        );
        self.request_json(self.client.get(&url)).await
    }

    /// 等待作业到达终态
    ///
    /// 严格串行的有界轮询：sleep(间隔) → 查状态 → 判断，直到
    /// 观察到终态或预算耗尽。传输层错误消耗一次预算后继续，
    /// 因而无论远程表现如何，总耗时不超过
    /// N × (间隔 + 单次调用超时)。
    ///
    /// 未识别的状态值按非终态处理，继续轮询。
    pub async fn wait_for_completion(
        &self,
        handle: &JobHandle,
        policy: &PollPolicy,
    ) -> PollOutcome {
        use crate::domain::models::job::JobStatus;

        // 提交时已观察到终态则无需轮询
        match handle.status {
            JobStatus::Completed => return PollOutcome::Completed { attempts: 0 },
            JobStatus::Failed => return PollOutcome::Failed { attempts: 0 },
            _ => {}
        }

        let start = Instant::now();

        for attempt in 1..=policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
            counter!("analysis_poll_attempts_total").increment(1);

            match self.status(&handle.analysis_id).await {
                Ok(summary) => {
                    debug!(
                        analysis_id = %handle.analysis_id,
                        attempt,
                        status = %summary.status,
                        progress = ?summary.progress,
                        "Poll attempt"
                    );

                    match summary.status {
                        JobStatus::Completed => {
                            histogram!("analysis_wait_duration_seconds")
                                .record(start.elapsed().as_secs_f64());
                            info!(analysis_id = %handle.analysis_id, attempt, "Analysis completed");
                            return PollOutcome::Completed { attempts: attempt };
                        }
                        JobStatus::Failed => {
                            warn!(analysis_id = %handle.analysis_id, attempt, "Analysis reported failure");
                            return PollOutcome::Failed { attempts: attempt };
                        }
                        _ => {}
                    }
                }
                Err(e) => {
                    // 瞬时不可达与慢作业在这里无法区分，消耗一次预算后继续
                    warn!(
                        analysis_id = %handle.analysis_id,
                        attempt,
                        error = %e,
                        "Poll attempt failed"
                    );
                }
            }
        }

        counter!("analysis_poll_timeouts_total").increment(1);
        PollOutcome::TimedOut {
            attempts: policy.max_attempts,
        }
    }

    /// 提交并等待，完成后提取报告摘要
    ///
    /// 四种收束方式对调用方保持区分：成功返回摘要，远程失败
    /// 映射为 `RemoteFailure`，预算耗尽映射为 `Timeout`，提交
    /// 阶段的错误原样透传。
    pub async fn run_to_report(
        &self,
        request: &JobRequest,
        policy: &PollPolicy,
    ) -> Result<ReportSummary, ClientError> {
        let handle = self.submit(request).await?;

        match self.wait_for_completion(&handle, policy).await {
            PollOutcome::Completed { .. } => {
                let result = self.result(&handle.analysis_id).await?;
                Ok(ReportSummary::extract(&result.payload))
            }
            PollOutcome::Failed { .. } => {
                Err(ClientError::RemoteFailure(handle.analysis_id))
            }
            PollOutcome::TimedOut { attempts } => Err(ClientError::Timeout { attempts }),
        }
    }

    /// 发送请求并解析JSON响应
    ///
    /// 非2xx响应携带状态码和原始响应体上抛，JSON解析失败归类
    /// 为解析错误。
    async fn request_json<T: DeserializeOwned>(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = builder.send().await.map_err(ClientError::from)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(ClientError::from)?;
        serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))
    }
}
