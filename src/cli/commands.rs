// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::cli::{
    exit_codes, AnalyzeArgs, Cli, Commands, CompleteArgs, ExerciseArgs, OutputFormat, ReportArgs,
    WorkitemCommands,
};
use crate::client::AnalysisClient;
use crate::config::settings::Settings;
use crate::domain::models::job::JobRequest;
use crate::domain::models::report::ReportSummary;
use crate::infrastructure::genai::GenAiClient;
use crate::infrastructure::page_driver::{DriverError, PageAction, PageDriver, PageScenario};
use crate::infrastructure::workitem::WorkItemClient;
use crate::supervisor::{ServiceHost, SupervisorError};
use crate::utils::poll_policy::PollPolicy;
use std::time::Duration;
use tracing::{error, warn};

/// 解析命令行并执行对应操作
///
/// 返回值是进程退出码；所有错误分类在这里收束为互相区分的
/// 退出码，绝不折叠成单一的"失败"。
pub async fn run(cli: Cli, mut settings: Settings) -> i32 {
    if let Some(base_url) = cli.base_url.clone() {
        settings.analysis.base_url = base_url;
    }

    match cli.command {
        Commands::Health => run_health(&settings, cli.format).await,
        Commands::Analyze(ref args) => run_analyze(args, &settings, cli.format, cli.quiet).await,
        Commands::Report(ref args) => run_report(args, &settings, cli.format).await,
        Commands::Exercise(ref args) => run_exercise(args, &settings, cli.format).await,
        Commands::Workitem(ref command) => run_workitem(command, &settings, cli.format).await,
        Commands::Complete(ref args) => run_complete(args, &settings, cli.format).await,
    }
}

async fn run_health(settings: &Settings, format: OutputFormat) -> i32 {
    let client = match AnalysisClient::new(&settings.analysis) {
        Ok(c) => c,
        Err(e) => return report_client_error(&e),
    };

    match client.health().await {
        Ok(health) => {
            match format {
                OutputFormat::Json => {
                    println!(
                        "{}",
                        serde_json::json!({
                            "status": health.status,
                            "version": health.version,
                            "features": health.features,
                        })
                    );
                }
                OutputFormat::Human => {
                    let version = health.version.as_deref().unwrap_or("unknown");
                    println!(
                        "Analysis service at {}: {} (version {})",
                        client.base_url(),
                        health.status,
                        version
                    );
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_client_error(&e),
    }
}

async fn run_analyze(
    args: &AnalyzeArgs,
    settings: &Settings,
    format: OutputFormat,
    quiet: bool,
) -> i32 {
    let client = match AnalysisClient::new(&settings.analysis) {
        Ok(c) => c,
        Err(e) => return report_client_error(&e),
    };

    // 可选的本地服务托管：端口被占视为服务已在运行
    let mut host = None;
    if args.supervise {
        match ServiceHost::start(&settings.service, &client).await {
            Ok(h) => host = Some(h),
            Err(SupervisorError::PortOccupied(port)) => {
                warn!(port, "Analysis service appears to be running already, reusing it");
            }
            Err(e) => {
                error!("Failed to host analysis service: {}", e);
                return match e {
                    SupervisorError::StartupTimeout { .. } => exit_codes::CONNECTION_ERROR,
                    _ => exit_codes::INTERNAL,
                };
            }
        }
    }

    let mut request = JobRequest::for_url(&args.url);
    if let Some(scenario) = &args.scenario {
        request = request.with_scenario(scenario.as_str());
    }
    for module in &args.modules {
        request = request.with_module(module.as_str(), true);
    }
    for module in &args.skip_modules {
        request = request.with_module(module.as_str(), false);
    }

    let mut policy = settings.polling.to_policy();
    if let Some(interval) = args.interval {
        policy = PollPolicy {
            interval: Duration::from_secs(interval),
            ..policy
        };
    }
    if let Some(max_attempts) = args.max_attempts {
        policy.max_attempts = max_attempts;
    }

    let code = match client.run_to_report(&request, &policy).await {
        Ok(summary) => {
            if !quiet {
                print_summary(&summary, format);
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_client_error(&e),
    };

    if let Some(mut h) = host {
        h.shutdown().await;
    }

    code
}

async fn run_report(args: &ReportArgs, settings: &Settings, format: OutputFormat) -> i32 {
    let client = match AnalysisClient::new(&settings.analysis) {
        Ok(c) => c,
        Err(e) => return report_client_error(&e),
    };

    match client.result(&args.analysis_id).await {
        Ok(result) => {
            let summary = ReportSummary::extract(&result.payload);
            print_summary(&summary, format);
            exit_codes::SUCCESS
        }
        Err(e) => report_client_error(&e),
    }
}

async fn run_exercise(args: &ExerciseArgs, settings: &Settings, format: OutputFormat) -> i32 {
    let scenario = match &args.script {
        Some(path) => match PageScenario::load(path) {
            Ok(s) => s,
            Err(e) => {
                error!("Failed to load action script: {}", e);
                return exit_codes::INVALID_INPUT;
            }
        },
        None => PageScenario {
            name: None,
            url: None,
            // 无脚本时只做一次短暂停留，让页面完成渲染
            actions: vec![PageAction::Wait { milliseconds: 1000 }],
        },
    };

    let url = match args.url.as_deref().or(scenario.url.as_deref()) {
        Some(u) => u.to_string(),
        None => {
            error!("No target URL: pass one on the command line or in the script");
            return exit_codes::INVALID_INPUT;
        }
    };

    let driver = PageDriver::new(settings.browser.clone());
    match driver.exercise(&url, &scenario.actions).await {
        Ok(report) => {
            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&report) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to encode report: {}", e);
                        return exit_codes::INTERNAL;
                    }
                },
                OutputFormat::Human => {
                    let title = report.title.as_deref().unwrap_or("N/A");
                    println!(
                        "Exercised {} ({} actions in {} ms), title: {}, content: {} bytes",
                        report.url,
                        report.actions_run,
                        report.duration_ms,
                        title,
                        report.content_length
                    );
                }
            }
            exit_codes::SUCCESS
        }
        Err(e) => {
            error!("Page exercise failed: {}", e);
            match e {
                DriverError::Script(_) => exit_codes::INVALID_INPUT,
                DriverError::Timeout => exit_codes::POLL_TIMEOUT,
                DriverError::Browser(_) => exit_codes::INTERNAL,
            }
        }
    }
}

async fn run_workitem(
    command: &WorkitemCommands,
    settings: &Settings,
    format: OutputFormat,
) -> i32 {
    let client = match WorkItemClient::new(&settings.workitem) {
        Ok(c) => c,
        Err(e) => return report_client_error(&e),
    };

    match command {
        WorkitemCommands::Get { id } => match client.get_work_item(*id).await {
            Ok(item) => {
                match format {
                    OutputFormat::Json => println!("{}", item.fields),
                    OutputFormat::Human => {
                        let title = item.fields["System.Title"].as_str().unwrap_or("N/A");
                        let state = item.fields["System.State"].as_str().unwrap_or("N/A");
                        println!("Work item {}: [{}] {}", item.id, state, title);
                    }
                }
                exit_codes::SUCCESS
            }
            Err(e) => report_client_error(&e),
        },
        WorkitemCommands::Create {
            item_type,
            title,
            description,
            tags,
        } => {
            match client
                .create_work_item(item_type, title, description.as_deref(), tags)
                .await
            {
                Ok(item) => {
                    match format {
                        OutputFormat::Json => {
                            println!("{}", serde_json::json!({"id": item.id}));
                        }
                        OutputFormat::Human => {
                            println!("Created work item {}", item.id);
                        }
                    }
                    exit_codes::SUCCESS
                }
                Err(e) => report_client_error(&e),
            }
        }
    }
}

async fn run_complete(args: &CompleteArgs, settings: &Settings, format: OutputFormat) -> i32 {
    let client = match GenAiClient::new(&settings.genai) {
        Ok(c) => c,
        Err(e) => return report_client_error(&e),
    };

    match client.complete(&args.prompt).await {
        Ok(completion) => {
            match format {
                OutputFormat::Json => match serde_json::to_string_pretty(&completion) {
                    Ok(json) => println!("{}", json),
                    Err(e) => {
                        error!("Failed to encode completion: {}", e);
                        return exit_codes::INTERNAL;
                    }
                },
                OutputFormat::Human => println!("{}", completion.content),
            }
            exit_codes::SUCCESS
        }
        Err(e) => report_client_error(&e),
    }
}

fn print_summary(summary: &ReportSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(summary) {
            Ok(json) => println!("{}", json),
            Err(e) => error!("Failed to encode summary: {}", e),
        },
        OutputFormat::Human => print!("{}", summary.render()),
    }
}

fn report_client_error(error: &crate::client::ClientError) -> i32 {
    error!("{}", error);
    exit_codes::for_client_error(error)
}
