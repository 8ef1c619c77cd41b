// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::client::AnalysisClient;
use crate::config::settings::ServiceSettings;
use crate::utils::poll_policy::PollPolicy;
use std::net::TcpListener;
use std::process::Stdio;
use thiserror::Error;
use tokio::process::{Child, Command};
use tracing::{info, warn};

/// 服务托管错误类型
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// 端口已被占用，疑似服务已在运行
    #[error("Port {0} is already in use, analysis service appears to be running")]
    PortOccupied(u16),
    /// 子进程启动失败
    #[error("Failed to spawn analysis service: {0}")]
    Spawn(#[from] std::io::Error),
    /// 就绪探测预算耗尽
    #[error("Analysis service did not become healthy within {attempts} probes")]
    StartupTimeout {
        /// 已消耗的探测次数
        attempts: u32,
    },
}

/// 本地分析服务宿主
///
/// 把"后台起服务、前台打请求"的模式收敛为作用域化的进程
/// 生命周期：进入时启动，就绪探测通过后交还控制权，退出时
/// 必定终止子进程。不使用游离线程。
///
/// 子进程带 `kill_on_drop`，即使调用方忘记 `shutdown` 或提前
/// panic，进程也会随宿主一起被回收。
#[derive(Debug)]
pub struct ServiceHost {
    child: Option<Child>,
    port: u16,
}

impl ServiceHost {
    /// 检查指定端口是否已被占用
    pub fn is_port_in_use(port: u16) -> bool {
        TcpListener::bind(("127.0.0.1", port)).is_err()
    }

    /// 启动本地分析服务并等待其就绪
    ///
    /// 端口已被占用时拒绝启动，大概率服务已在运行，直接复用
    /// 即可。就绪判定是对 `client.health()` 的有界轮询；预算
    /// 耗尽时回滚（杀掉刚启动的子进程）并报超时。
    pub async fn start(
        settings: &ServiceSettings,
        client: &AnalysisClient,
    ) -> Result<Self, SupervisorError> {
        if Self::is_port_in_use(settings.port) {
            return Err(SupervisorError::PortOccupied(settings.port));
        }

        info!(
            command = %settings.command,
            args = ?settings.args,
            port = settings.port,
            "Starting local analysis service"
        );

        let child = Command::new(&settings.command)
            .args(&settings.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut host = Self {
            child: Some(child),
            port: settings.port,
        };

        let policy = settings.startup_policy();
        if host.wait_until_healthy(client, &policy).await {
            info!(port = host.port, "Analysis service is healthy");
            Ok(host)
        } else {
            warn!("Analysis service never became healthy, rolling back");
            host.shutdown().await;
            Err(SupervisorError::StartupTimeout {
                attempts: policy.max_attempts,
            })
        }
    }

    /// 有界就绪探测
    async fn wait_until_healthy(&self, client: &AnalysisClient, policy: &PollPolicy) -> bool {
        for attempt in 1..=policy.max_attempts {
            tokio::time::sleep(policy.delay_for(attempt)).await;
            match client.health().await {
                Ok(health) => {
                    info!(attempt, status = %health.status, "Health probe succeeded");
                    return true;
                }
                Err(e) => {
                    warn!(attempt, error = %e, "Health probe failed");
                }
            }
        }
        false
    }

    /// 服务监听端口
    pub fn port(&self) -> u16 {
        self.port
    }

    /// 显式终止并回收子进程
    pub async fn shutdown(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill().await {
                warn!(error = %e, "Failed to kill analysis service");
            }
            match child.wait().await {
                Ok(status) => info!(%status, "Analysis service stopped"),
                Err(e) => warn!(error = %e, "Failed to reap analysis service"),
            }
        }
    }
}

impl Drop for ServiceHost {
    fn drop(&mut self) {
        // kill_on_drop 兜底；这里同步发一次kill信号加快回收
        if let Some(child) = self.child.as_mut() {
            let _ = child.start_kill();
        }
    }
}
