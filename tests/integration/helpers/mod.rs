// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::extract::State;
use axum::{routing::get, routing::post, Json, Router};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

/// 脚本化的假分析服务
///
/// 状态端点按预先写好的脚本逐次吐出状态字符串（最后一个状态
/// 粘住），并统计每个端点被调用的次数，供测试断言精确的轮询
/// 行为。
pub struct FakeAnalysisService {
    pub base_url: String,
    state: Arc<ServiceState>,
}

struct ServiceState {
    status_script: Mutex<Vec<String>>,
    report: Value,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    report_calls: AtomicUsize,
}

impl FakeAnalysisService {
    /// 启动假服务
    ///
    /// # 参数
    ///
    /// * `status_script` - 状态端点依次返回的状态值
    /// * `report` - 报告端点返回的完整负载
    pub async fn start(status_script: &[&str], report: Value) -> Self {
        let state = Arc::new(ServiceState {
            status_script: Mutex::new(status_script.iter().map(|s| s.to_string()).collect()),
            report,
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            report_calls: AtomicUsize::new(0),
        });

        let app = Router::new()
            .route(
                "/health",
                get(|| async { Json(json!({"status": "ok", "version": "test"})) }),
            )
            .route(
                "/api/analyze",
                post(|State(state): State<Arc<ServiceState>>, Json(body): Json<Value>| async move {
                    state.submit_calls.fetch_add(1, Ordering::SeqCst);
                    assert!(body.get("url").is_some(), "submit body must carry a url");
                    Json(json!({"analysis_id": "job-test-1", "status": "queued"}))
                }),
            )
            .route(
                "/api/analysis/{id}/status",
                get(|State(state): State<Arc<ServiceState>>| async move {
                    state.status_calls.fetch_add(1, Ordering::SeqCst);
                    let mut script = state.status_script.lock().unwrap();
                    let status = if script.len() > 1 {
                        script.remove(0)
                    } else {
                        script
                            .first()
                            .cloned()
                            .unwrap_or_else(|| "processing".to_string())
                    };
                    Json(json!({"status": status}))
                }),
            )
            .route(
                "/api/reports/{id}",
                get(|State(state): State<Arc<ServiceState>>| async move {
                    state.report_calls.fetch_add(1, Ordering::SeqCst);
                    let mut body = state.report.clone();
                    if let Some(obj) = body.as_object_mut() {
                        obj.entry("status").or_insert(json!("completed"));
                    }
                    Json(body)
                }),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}", addr),
            state,
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.state.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.state.status_calls.load(Ordering::SeqCst)
    }

    pub fn report_calls(&self) -> usize {
        self.state.report_calls.load(Ordering::SeqCst)
    }
}

/// 快速轮询策略，让测试在毫秒级完成
pub fn test_policy(max_attempts: u32) -> uxprobe::utils::poll_policy::PollPolicy {
    uxprobe::utils::poll_policy::PollPolicy::fixed(
        std::time::Duration::from_millis(10),
        max_attempts,
    )
}

/// 指向假服务的客户端
pub fn test_client(base_url: &str) -> uxprobe::client::AnalysisClient {
    uxprobe::client::AnalysisClient::new(&uxprobe::config::settings::AnalysisSettings {
        base_url: base_url.to_string(),
        request_timeout: 5,
    })
    .unwrap()
}
