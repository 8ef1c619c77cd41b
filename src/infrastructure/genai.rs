// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::client::ClientError;
use crate::config::settings::GenAiSettings;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, info, warn};

/// 令牌用量统计
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// 一次完成调用的结果
#[derive(Debug, Clone, Serialize)]
pub struct Completion {
    /// 模型输出文本
    pub content: String,
    /// 令牌用量
    pub usage: TokenUsage,
}

/// API密钥环
///
/// 有序的密钥集合加一个活动游标。配额或认证失败时向前轮换
/// （到末尾回绕）。日志里只出现密钥的SHA-256指纹前缀，绝不
/// 出现原始密钥。
pub struct KeyRing {
    keys: Vec<String>,
    cursor: Mutex<usize>,
}

impl KeyRing {
    /// 创建密钥环
    pub fn new(keys: Vec<String>) -> Self {
        Self {
            keys,
            cursor: Mutex::new(0),
        }
    }

    /// 密钥数量
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 当前活动密钥
    pub fn active(&self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let cursor = self.cursor.lock();
        Some(self.keys[*cursor % self.keys.len()].clone())
    }

    /// 轮换到下一个密钥（回绕）
    pub fn rotate(&self) {
        if self.keys.is_empty() {
            return;
        }
        let mut cursor = self.cursor.lock();
        let old = self.keys[*cursor % self.keys.len()].clone();
        *cursor = (*cursor + 1) % self.keys.len();
        let new = self.keys[*cursor].clone();
        drop(cursor);

        info!(
            from = %fingerprint(&old),
            to = %fingerprint(&new),
            "Rotated generative AI API key"
        );
    }
}

/// 计算密钥指纹（SHA-256前4字节的十六进制）
pub fn fingerprint(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    hex::encode(&digest[..4])
}

/// 生成式AI完成客户端
///
/// 聊天完成接口的薄客户端。认证失败（401/403）和配额超限
/// （429）触发密钥轮换并重试，每次调用对每个密钥至多尝试一
/// 次，因此总请求数有界；其他错误立即上报。
pub struct GenAiClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    ring: KeyRing,
}

impl GenAiClient {
    /// 创建客户端
    pub fn new(settings: &GenAiSettings) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout))
            .build()
            .map_err(|e| ClientError::Connection(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            ring: KeyRing::new(settings.api_keys.clone()),
        })
    }

    /// 密钥环
    pub fn ring(&self) -> &KeyRing {
        &self.ring
    }

    /// 发起一次文本完成调用
    pub async fn complete(&self, prompt: &str) -> Result<Completion, ClientError> {
        if self.ring.is_empty() {
            return Err(ClientError::InvalidRequest(
                "no generative AI API keys configured".to_string(),
            ));
        }

        let url = format!("{}/chat/completions", self.base_url);
        let request_body = json!({
            "model": self.model,
            "messages": [
                {"role": "user", "content": prompt}
            ],
            "temperature": 0.0
        });

        let mut last_error = None;

        // 每个密钥至多一次尝试
        for _ in 0..self.ring.len() {
            let key = self
                .ring
                .active()
                .ok_or_else(|| ClientError::InvalidRequest("key ring is empty".to_string()))?;
            debug!(key = %fingerprint(&key), "Calling completion endpoint");

            let response = self
                .client
                .post(&url)
                .header("Authorization", format!("Bearer {}", key))
                .json(&request_body)
                .send()
                .await
                .map_err(ClientError::from)?;

            let status = response.status().as_u16();
            if matches!(status, 401 | 403 | 429) {
                let body = response.text().await.unwrap_or_default();
                warn!(
                    key = %fingerprint(&key),
                    status,
                    "Completion call rejected, rotating key"
                );
                self.ring.rotate();
                last_error = Some(ClientError::Http { status, body });
                continue;
            }

            if !response.status().is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(ClientError::Http { status, body });
            }

            let body: Value = response
                .json()
                .await
                .map_err(|e| ClientError::Parse(e.to_string()))?;
            return parse_completion(&body);
        }

        // 所有密钥都被拒绝
        Err(last_error.unwrap_or_else(|| {
            ClientError::InvalidRequest("no generative AI API keys configured".to_string())
        }))
    }
}

/// 解析完成响应
fn parse_completion(body: &Value) -> Result<Completion, ClientError> {
    let content = body["choices"][0]["message"]["content"]
        .as_str()
        .ok_or_else(|| {
            ClientError::Parse("completion response carried no message content".to_string())
        })?;

    let usage = if let Some(usage_val) = body.get("usage") {
        TokenUsage {
            prompt_tokens: usage_val["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            completion_tokens: usage_val["completion_tokens"].as_u64().unwrap_or(0) as u32,
            total_tokens: usage_val["total_tokens"].as_u64().unwrap_or(0) as u32,
        }
    } else {
        TokenUsage::default()
    };

    Ok(Completion {
        content: content.to_string(),
        usage,
    })
}
