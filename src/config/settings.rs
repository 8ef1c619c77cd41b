// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::time::Duration;

use crate::utils::poll_policy::PollPolicy;

/// 应用程序配置设置
///
/// 包含分析服务、轮询、工作项跟踪、生成式AI、浏览器和本地
/// 服务托管等所有配置项。在 main 中构造一次并显式注入，库
/// 代码不在任意位置读环境变量。
#[derive(Debug, Deserialize)]
pub struct Settings {
    /// 分析服务配置
    pub analysis: AnalysisSettings,
    /// 轮询配置
    pub polling: PollingSettings,
    /// 工作项跟踪配置
    pub workitem: WorkItemSettings,
    /// 生成式AI配置
    pub genai: GenAiSettings,
    /// 浏览器配置
    pub browser: BrowserSettings,
    /// 本地服务托管配置
    pub service: ServiceSettings,
}

/// 分析服务配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct AnalysisSettings {
    /// 分析服务基址
    pub base_url: String,
    /// 单次HTTP调用超时（秒），独立于轮询预算
    pub request_timeout: u64,
}

/// 轮询配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct PollingSettings {
    /// 轮询间隔（秒）
    pub interval_secs: u64,
    /// 最大轮询次数
    pub max_attempts: u32,
    /// 是否启用指数退避
    pub exponential_backoff: bool,
}

impl PollingSettings {
    /// 转换为轮询策略
    pub fn to_policy(&self) -> PollPolicy {
        if self.exponential_backoff {
            PollPolicy::with_backoff(
                Duration::from_secs(self.interval_secs),
                Duration::from_secs(30),
                self.max_attempts,
            )
        } else {
            PollPolicy::fixed(Duration::from_secs(self.interval_secs), self.max_attempts)
        }
    }
}

/// 工作项跟踪配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkItemSettings {
    /// 跟踪服务基址（含组织和项目路径）
    pub base_url: String,
    /// 个人访问令牌
    pub pat: String,
    /// REST API版本
    pub api_version: String,
    /// 单次HTTP调用超时（秒）
    pub request_timeout: u64,
}

/// 生成式AI配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct GenAiSettings {
    /// 完成接口基址
    pub base_url: String,
    /// 模型名称
    pub model: String,
    /// API密钥列表，按顺序轮换
    pub api_keys: Vec<String>,
    /// 单次HTTP调用超时（秒）
    pub request_timeout: u64,
}

/// 浏览器配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct BrowserSettings {
    /// 远程调试地址，为空时本地启动Chrome
    #[serde(default)]
    pub remote_debugging_url: Option<String>,
    /// 页面操作总超时（秒）
    pub exercise_timeout: u64,
}

/// 本地服务托管配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    /// 启动命令
    pub command: String,
    /// 命令参数
    pub args: Vec<String>,
    /// 服务监听端口
    pub port: u16,
    /// 就绪探测间隔（秒）
    pub startup_interval_secs: u64,
    /// 就绪探测最大次数
    pub startup_max_attempts: u32,
}

impl ServiceSettings {
    /// 就绪探测使用的轮询策略
    pub fn startup_policy(&self) -> PollPolicy {
        PollPolicy::fixed(
            Duration::from_secs(self.startup_interval_secs),
            self.startup_max_attempts,
        )
    }
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 从默认值、可选配置文件和环境变量加载配置
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        let builder = Config::builder()
            // Default analysis service settings
            .set_default("analysis.base_url", "http://127.0.0.1:8000")?
            .set_default("analysis.request_timeout", 10)?
            // Default polling settings (observed script parameters)
            .set_default("polling.interval_secs", 3)?
            .set_default("polling.max_attempts", 20)?
            .set_default("polling.exponential_backoff", false)?
            // Default work item tracker settings
            .set_default("workitem.base_url", "")?
            .set_default("workitem.pat", "")?
            .set_default("workitem.api_version", "7.1")?
            .set_default("workitem.request_timeout", 30)?
            // Default generative AI settings
            .set_default("genai.base_url", "https://api.openai.com/v1")?
            .set_default("genai.model", "gpt-4o-mini")?
            .set_default("genai.api_keys", Vec::<String>::new())?
            .set_default("genai.request_timeout", 60)?
            // Default browser settings
            .set_default("browser.exercise_timeout", 60)?
            // Default hosted service settings
            .set_default("service.command", "python")?
            .set_default("service.args", vec!["ux_analyzer.py".to_string()])?
            .set_default("service.port", 8000)?
            .set_default("service.startup_interval_secs", 2)?
            .set_default("service.startup_max_attempts", 15)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("UXPROBE").separator("__"));

        builder.build()?.try_deserialize()
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
