// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::BrowserSettings;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info};

// Global browser instance to avoid re-launching Chrome for every page.
static BROWSER_INSTANCE: OnceCell<Browser> = OnceCell::const_new();

/// 页面驱动错误类型
#[derive(Error, Debug)]
pub enum DriverError {
    /// 浏览器启动或连接失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 页面操作超时
    #[error("Page exercise timed out")]
    Timeout,
    /// 动作脚本无效
    #[error("Invalid action script: {0}")]
    Script(String),
}

/// 页面交互动作
///
/// 模拟用户在mock页面上的操作序列，可以从YAML场景文件加载。
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageAction {
    /// 等待指定毫秒数
    Wait { milliseconds: u64 },
    /// 点击匹配选择器的元素
    Click { selector: String },
    /// 滚动页面（up/down）
    Scroll { direction: String },
    /// 向匹配选择器的输入框键入文本
    Input { selector: String, text: String },
}

/// 页面场景脚本
///
/// YAML文件格式：场景名、目标URL和动作列表。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageScenario {
    /// 场景名
    #[serde(default)]
    pub name: Option<String>,
    /// 目标URL，可被命令行覆盖
    #[serde(default)]
    pub url: Option<String>,
    /// 动作列表
    #[serde(default)]
    pub actions: Vec<PageAction>,
}

impl PageScenario {
    /// 从YAML文件加载场景脚本
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| DriverError::Script(format!("{}: {}", path.display(), e)))?;
        serde_yaml::from_str(&raw).map_err(|e| DriverError::Script(e.to_string()))
    }
}

/// 页面操作报告
#[derive(Debug, Clone, Serialize)]
pub struct PageExerciseReport {
    /// 实际访问的URL
    pub url: String,
    /// 最终页面标题
    pub title: Option<String>,
    /// 最终DOM内容长度（字节）
    pub content_length: usize,
    /// 执行的动作数
    pub actions_run: usize,
    /// 总耗时（毫秒）
    pub duration_ms: u64,
}

/// 页面驱动器
///
/// 在分析前用真实浏览器把mock页面"走一遍"：导航到目标页，
/// 执行脚本化的交互动作，收集最终的页面状态。浏览器实例全局
/// 共享，只启动一次。
pub struct PageDriver {
    settings: BrowserSettings,
}

impl PageDriver {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }

    // 获取或初始化共享浏览器实例
    async fn get_browser(&self) -> Result<&'static Browser, DriverError> {
        let remote_url = self.settings.remote_debugging_url.clone();

        BROWSER_INSTANCE
            .get_or_try_init(|| async move {
                let (browser, mut handler) = if let Some(ref url) = remote_url {
                    info!("Connecting to remote Chrome instance at: {}", url);
                    Browser::connect(url).await.map_err(|e| {
                        DriverError::Browser(format!("failed to connect to remote Chrome: {}", e))
                    })?
                } else {
                    let config = BrowserConfig::builder()
                        .no_sandbox()
                        .request_timeout(Duration::from_secs(30))
                        .arg("--disable-gpu")
                        .arg("--disable-dev-shm-usage")
                        .build()
                        .map_err(DriverError::Browser)?;

                    Browser::launch(config)
                        .await
                        .map_err(|e| DriverError::Browser(e.to_string()))?
                };

                // Spawn a handler to process browser events
                tokio::spawn(async move {
                    while let Some(h) = handler.next().await {
                        if h.is_err() {
                            break;
                        }
                    }
                });

                Ok(browser)
            })
            .await
    }

    /// 执行一组页面交互动作
    ///
    /// # 参数
    ///
    /// * `url` - 目标页面
    /// * `actions` - 动作序列，按顺序执行
    pub async fn exercise(
        &self,
        url: &str,
        actions: &[PageAction],
    ) -> Result<PageExerciseReport, DriverError> {
        let start = Instant::now();
        let timeout = Duration::from_secs(self.settings.exercise_timeout);

        tokio::time::timeout(timeout, self.exercise_inner(url, actions, start))
            .await
            .map_err(|_| DriverError::Timeout)?
    }

    async fn exercise_inner(
        &self,
        url: &str,
        actions: &[PageAction],
        start: Instant,
    ) -> Result<PageExerciseReport, DriverError> {
        let browser = self.get_browser().await?;

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;

        page.goto(url)
            .await
            .map_err(|e| DriverError::Browser(format!("navigation failed: {}", e)))?;

        for action in actions {
            debug!(?action, "Running page action");
            match action {
                PageAction::Wait { milliseconds } => {
                    tokio::time::sleep(Duration::from_millis(*milliseconds)).await;
                }
                PageAction::Click { selector } => {
                    page.find_element(selector.as_str())
                        .await
                        .map_err(|e| {
                            DriverError::Browser(format!("click failed, element not found: {}", e))
                        })?
                        .click()
                        .await
                        .map_err(|e| DriverError::Browser(format!("click failed: {}", e)))?;
                }
                PageAction::Scroll { direction } => {
                    let script = match direction.as_str() {
                        "up" => "window.scrollBy(0, -window.innerHeight);",
                        _ => "window.scrollBy(0, window.innerHeight);",
                    };
                    page.evaluate(script)
                        .await
                        .map_err(|e| DriverError::Browser(format!("scroll failed: {}", e)))?;
                }
                PageAction::Input { selector, text } => {
                    page.find_element(selector.as_str())
                        .await
                        .map_err(|e| {
                            DriverError::Browser(format!("input failed, element not found: {}", e))
                        })?
                        .type_str(text.as_str())
                        .await
                        .map_err(|e| DriverError::Browser(format!("input failed: {}", e)))?;
                }
            }
        }

        let title = page
            .get_title()
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;
        let content = page
            .content()
            .await
            .map_err(|e| DriverError::Browser(e.to_string()))?;

        let report = PageExerciseReport {
            url: url.to_string(),
            title,
            content_length: content.len(),
            actions_run: actions.len(),
            duration_ms: start.elapsed().as_millis() as u64,
        };
        info!(
            url,
            actions = report.actions_run,
            content_length = report.content_length,
            "Page exercise finished"
        );

        Ok(report)
    }
}
