// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::client::ClientError;

/// 进程退出码
///
/// 错误分类到退出码的映射是稳定契约：自动化调用方靠它区分
/// "远程作业失败"、"轮询超时"和各类本地错误，任何一类都不会
/// 折叠进泛化的非零值。
pub const SUCCESS: i32 = 0;
/// 远程作业报告失败
pub const REMOTE_FAILURE: i32 = 1;
/// 输入或配置无效
pub const INVALID_INPUT: i32 = 2;
/// 服务不可达
pub const CONNECTION_ERROR: i32 = 3;
/// 服务返回非2xx
pub const HTTP_ERROR: i32 = 4;
/// 响应无法解析
pub const PARSE_ERROR: i32 = 5;
/// 轮询预算耗尽
pub const POLL_TIMEOUT: i32 = 6;
/// 内部错误
pub const INTERNAL: i32 = 99;

/// 客户端错误到退出码的映射
pub fn for_client_error(error: &ClientError) -> i32 {
    match error {
        ClientError::Connection(_) => CONNECTION_ERROR,
        ClientError::Http { .. } => HTTP_ERROR,
        ClientError::Parse(_) => PARSE_ERROR,
        ClientError::RemoteFailure(_) => REMOTE_FAILURE,
        ClientError::Timeout { .. } => POLL_TIMEOUT,
        ClientError::InvalidRequest(_) => INVALID_INPUT,
    }
}
