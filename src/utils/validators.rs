// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use url::Url;
use validator::ValidationError;

/// 验证目标URL
///
/// 分析服务只接受绝对的 http/https 地址，相对路径和其他协议
/// （file、ftp 等）一律拒绝。
///
/// # 参数
///
/// * `value` - 待验证的URL字符串
///
/// # 返回值
///
/// * `Ok(())` - URL有效
/// * `Err(ValidationError)` - URL无效或协议不受支持
pub fn validate_target_url(value: &str) -> Result<(), ValidationError> {
    let parsed = Url::parse(value).map_err(|_| ValidationError::new("invalid_url"))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(ValidationError::new("unsupported_scheme"));
    }

    if parsed.host_str().is_none() {
        return Err(ValidationError::new("missing_host"));
    }

    Ok(())
}

/// 验证场景标识符
///
/// 场景ID形如 "1.4" 或 "checkout-flow"，只允许字母、数字、点、
/// 下划线和连字符。
pub fn validate_scenario_id(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("empty_scenario_id"));
    }

    let valid = value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if !valid {
        return Err(ValidationError::new("invalid_scenario_id"));
    }

    Ok(())
}
