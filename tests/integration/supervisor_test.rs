// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::test_client;
use std::net::TcpListener;
use uxprobe::config::settings::ServiceSettings;
use uxprobe::supervisor::{ServiceHost, SupervisorError};

fn reserve_port() -> u16 {
    // 绑定后立刻释放，拿到一个大概率空闲的端口号
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[tokio::test]
async fn test_occupied_port_means_service_already_running() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let settings = ServiceSettings {
        command: "sleep".to_string(),
        args: vec!["30".to_string()],
        port,
        startup_interval_secs: 0,
        startup_max_attempts: 1,
    };
    let client = test_client(&format!("http://127.0.0.1:{}", port));

    let err = ServiceHost::start(&settings, &client).await.unwrap_err();
    assert!(matches!(err, SupervisorError::PortOccupied(p) if p == port));
}

#[cfg(unix)]
#[tokio::test]
async fn test_unhealthy_service_is_rolled_back() {
    let port = reserve_port();
    // 子进程永远不开HTTP端口，就绪探测注定耗尽预算
    let settings = ServiceSettings {
        command: "sleep".to_string(),
        args: vec!["30".to_string()],
        port,
        startup_interval_secs: 0,
        startup_max_attempts: 3,
    };
    let client = test_client(&format!("http://127.0.0.1:{}", port));

    let err = ServiceHost::start(&settings, &client).await.unwrap_err();
    assert!(matches!(err, SupervisorError::StartupTimeout { attempts: 3 }));
}

#[cfg(unix)]
#[tokio::test]
async fn test_shutdown_reaps_the_child() {
    let port = reserve_port();
    let settings = ServiceSettings {
        command: "sleep".to_string(),
        args: vec!["30".to_string()],
        port,
        startup_interval_secs: 0,
        startup_max_attempts: 1,
    };
    let client = test_client(&format!("http://127.0.0.1:{}", port));

    // 启动失败路径内部已调用 shutdown；这里只验证它不会挂起或panic
    let started = ServiceHost::start(&settings, &client).await;
    assert!(started.is_err());
}
