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

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};
use uuid::Uuid;
use uxprobe::cli::{commands, exit_codes, Cli};
use uxprobe::config::settings::Settings;
use uxprobe::utils::telemetry;

/// 主函数
///
/// 应用程序入口点：初始化遥测、加载一次配置、分发子命令，
/// 并以分类后的退出码结束进程。
#[tokio::main]
async fn main() {
    // 1. Initialize logging
    telemetry::init_telemetry();

    let cli = Cli::parse();

    // 每次调用一个关联ID，便于把日志串回同一次运行
    let run_id = Uuid::new_v4();
    info!(%run_id, "Starting uxprobe");

    // 2. Load configuration once; everything downstream gets it injected
    let settings = match Settings::new().context("failed to load configuration") {
        Ok(s) => s,
        Err(e) => {
            error!("{:#}", e);
            std::process::exit(exit_codes::INVALID_INPUT);
        }
    };

    // 3. Dispatch
    let code = commands::run(cli, settings).await;
    std::process::exit(code);
}
