// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// 轮询策略配置
///
/// 描述"等待远程异步状态转换"的节奏：每次轮询前的停顿时长
/// 以及总的尝试预算。默认是固定间隔（与历史脚本行为一致），
/// 可以按需启用带上限和抖动的指数退避。
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// 最大轮询次数
    pub max_attempts: u32,
    /// 初始轮询间隔
    pub interval: Duration,
    /// 最大轮询间隔
    pub max_interval: Duration,
    /// 退避乘数
    pub backoff_multiplier: f64,
    /// 抖动因子 (0.0-1.0)
    pub jitter_factor: f64,
    /// 是否启用指数退避
    pub exponential_backoff: bool,
    /// 是否启用抖动
    pub enable_jitter: bool,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            interval: Duration::from_secs(3),
            max_interval: Duration::from_secs(30),
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
            exponential_backoff: false,
            enable_jitter: false,
        }
    }
}

impl PollPolicy {
    /// 创建固定间隔策略
    pub fn fixed(interval: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval,
            exponential_backoff: false,
            enable_jitter: false,
            ..Self::default()
        }
    }

    /// 创建快速策略（短间隔、小预算，适合轻量页面）
    pub fn quick() -> Self {
        Self::fixed(Duration::from_secs(2), 10)
    }

    /// 创建耐心策略（长间隔、大预算，适合多模块全量分析）
    pub fn patient() -> Self {
        Self::fixed(Duration::from_secs(6), 30)
    }

    /// 创建带退避的策略
    pub fn with_backoff(initial: Duration, cap: Duration, max_attempts: u32) -> Self {
        Self {
            max_attempts,
            interval: initial,
            max_interval: cap,
            exponential_backoff: true,
            enable_jitter: true,
            ..Self::default()
        }
    }

    /// 计算第attempt次轮询前的停顿时长
    ///
    /// attempt 从 1 开始计数。
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential_backoff {
            return self.interval;
        }

        // 计算指数退避
        let delay_secs =
            self.interval.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32 - 1);

        // 限制最大间隔
        let capped = delay_secs.min(self.max_interval.as_secs_f64());

        // 添加抖动（区间为空时跳过，零间隔下随机采样会 panic）
        let jitter_range = capped * self.jitter_factor;
        let final_delay = if self.enable_jitter && jitter_range > 0.0 {
            let jitter = rand::random_range(-jitter_range..jitter_range);
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_secs_f64(final_delay)
    }

    /// 计算下一次轮询的时间点
    pub fn next_attempt_time(&self, attempt: u32, base_time: DateTime<Utc>) -> DateTime<Utc> {
        let delay = self.delay_for(attempt);
        base_time + chrono::Duration::milliseconds(delay.as_millis() as i64)
    }

    /// 是否还有轮询预算
    pub fn has_budget(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}
