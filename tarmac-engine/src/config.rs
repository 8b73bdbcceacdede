//! 协调器运行配置与重试策略
//!
use std::time::Duration;

/// 指数退避重试策略（附加抖动，避免并发重试扎堆）
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    /// 最大尝试次数（含首次）
    pub max_attempts: u32,
    /// 首次重试前的基础等待
    pub base_delay: Duration,
    /// 单次等待上限
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// 第 `attempt` 次失败后的等待时长（attempt 从 1 起）
    pub fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_delay);
        exp + Duration::from_millis(rand_jitter())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(50),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// 为退避生成 0-50ms 的随机抖动
pub(crate) fn rand_jitter() -> u64 {
    // 以时间为种子的线性同余发生器，避免为此引入完整的 rand 依赖
    use std::time::SystemTime;
    let seed = u64::from(
        SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos(),
    );
    (seed.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407) >> 33) % 50
}

/// 分配协调器配置
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// 排程请求主题（输入）
    pub input_topic: String,
    /// 分配结论主题（输出，按 flightId 作键）
    pub outcome_topic: String,
    /// 死信主题：格式错误等永久失败的输入
    pub dead_letter_topic: String,
    /// 挂起主题：重试预算耗尽、待人工重放的输入
    pub parked_topic: String,
    /// 消费组名
    pub consumer_group: String,
    /// 同一跑道上版本冲突的就地重试上限
    pub cas_retry_limit: u32,
    /// 基础设施瞬时故障的退避重试策略
    pub infra_retry: RetryPolicy,
    /// 台账条目保留时长（须超过传输层最大重投延迟）
    pub ledger_retention: chrono::Duration,
    /// 台账清理周期
    pub ledger_sweep_interval: Duration,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            input_topic: "flight.schedule".to_string(),
            outcome_topic: "runway.status".to_string(),
            dead_letter_topic: "flight.schedule.dlq".to_string(),
            parked_topic: "flight.schedule.parked".to_string(),
            consumer_group: "runway-allocator".to_string(),
            cas_retry_limit: 5,
            infra_retry: RetryPolicy::default(),
            ledger_retention: chrono::Duration::hours(24),
            ledger_sweep_interval: Duration::from_secs(60),
        }
    }
}
