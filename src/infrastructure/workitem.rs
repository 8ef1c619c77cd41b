// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::client::ClientError;
use crate::config::settings::WorkItemSettings;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

/// 工作项
///
/// 跟踪服务返回的工作项，字段集合对本地透明，按需取用。
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItem {
    /// 工作项编号
    pub id: u64,
    /// 字段集合（System.Title、System.State 等）
    #[serde(default)]
    pub fields: Value,
}

/// JSON-Patch操作
///
/// 跟踪服务的创建接口要求 `application/json-patch+json` 格式的
/// 字段操作列表。
#[derive(Debug, Serialize)]
struct PatchOp {
    op: &'static str,
    path: String,
    value: Value,
}

impl PatchOp {
    fn add(field: &str, value: impl Into<Value>) -> Self {
        Self {
            op: "add",
            path: format!("/fields/{}", field),
            value: value.into(),
        }
    }
}

/// 工作项跟踪服务客户端
///
/// 负责"craft bug"工作流里的缺陷查询与上报。凭据是个人访问
/// 令牌（PAT），按服务约定以空用户名的HTTP Basic方式携带。
/// 错误分类与分析客户端一致，所有失败直接上报，不做重试。
pub struct WorkItemClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
    auth_header: String,
}

impl WorkItemClient {
    /// 创建客户端
    pub fn new(settings: &WorkItemSettings) -> Result<Self, ClientError> {
        if settings.base_url.is_empty() {
            return Err(ClientError::InvalidRequest(
                "work item tracker base_url is not configured".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to build HTTP client: {}", e)))?;

        // Basic auth with empty user and the PAT as password
        let auth_header = format!("Basic {}", BASE64.encode(format!(":{}", settings.pat)));

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            api_version: settings.api_version.clone(),
            auth_header,
        })
    }

    /// 查询工作项
    pub async fn get_work_item(&self, id: u64) -> Result<WorkItem, ClientError> {
        let url = format!(
            "{}/_apis/wit/workitems/{}?api-version={}",
            self.base_url, id, self.api_version
        );
        debug!(id, "Fetching work item");

        let response = self
            .client
            .get(&url)
            .header("Authorization", &self.auth_header)
            .send()
            .await
            .map_err(ClientError::from)?;

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

    /// 创建工作项
    ///
    /// # 参数
    ///
    /// * `item_type` - 工作项类型（例如 "Bug"）
    /// * `title` - 标题
    /// * `description` - 描述，可为空
    /// * `tags` - 标签列表，以分号拼接
    pub async fn create_work_item(
        &self,
        item_type: &str,
        title: &str,
        description: Option<&str>,
        tags: &[String],
    ) -> Result<WorkItem, ClientError> {
        if title.is_empty() {
            return Err(ClientError::InvalidRequest(
                "work item title must not be empty".to_string(),
            ));
        }

        // 服务要求类型段带 "$" 前缀
        let url = format!(
            "{}/_apis/wit/workitems/${}?api-version={}",
            self.base_url,
            urlencoding::encode(item_type),
            self.api_version
        );

        let mut ops = vec![PatchOp::add("System.Title", title)];
        if let Some(desc) = description {
            ops.push(PatchOp::add("System.Description", desc));
        }
        if !tags.is_empty() {
            ops.push(PatchOp::add("System.Tags", tags.join("; ")));
        }

        let response = self
            .client
            .post(&url)
            .header("Authorization", &self.auth_header)
            .header("Content-Type", "application/json-patch+json")
            .json(&ops)
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClientError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = response.text().await.map_err(ClientError::from)?;
        let item: WorkItem =
            serde_json::from_str(&text).map_err(|e| ClientError::Parse(e.to_string()))?;

        info!(id = item.id, item_type, "Work item created");
        Ok(item)
    }
}
