//! 幂等台账（IdempotencyLedger）协议
//!
//! 按入口事件标识记录“已处理”的台账，是任何状态变更前的准入门：
//! - `find` 命中即说明该事件已有结论，只需重发既有结果；
//! - `record_if_absent` 必须以单次原子 compare-and-set 实现，
//!   避免两个并发工作单元同时自认为首个处理者；
//! - 条目保留时长须超过传输层最大重投延迟，过期清理在热路径之外进行。
//!
use crate::error::DomainResult as Result;
use crate::outcome::Decision;
use async_trait::async_trait;
use bon::Builder;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 已记录结论的引用：足以在重投时重发完全相同的负载
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
pub struct OutcomeRef {
    /// 结论所属航班
    flight_id: String,
    /// 分配决定
    decision: Decision,
    /// 结论的线格式负载（逐字节重发以保证幂等可观测性）
    payload: Value,
    /// 记录时间（用于保留期清理）
    recorded_at: DateTime<Utc>,
}

impl OutcomeRef {
    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }
}

/// record-if-absent 的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerStatus {
    /// 本次调用完成了首次记录
    Recorded,
    /// 该事件已有记录：返回既有结论，调用方应重发它而非另做决定
    AlreadyPresent(OutcomeRef),
}

/// 幂等台账：事件标识到结论引用的一次性映射
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// 查询某事件是否已有结论
    async fn find(&self, event_id: &str) -> Result<Option<OutcomeRef>>;

    /// 原子地记录结论；已存在时返回既有条目，永不覆盖
    async fn record_if_absent(&self, event_id: &str, outcome: OutcomeRef)
    -> Result<LedgerStatus>;

    /// 清理早于保留期的条目，返回清理数量（后台维护任务调用）
    async fn sweep_expired(&self, retention: Duration) -> Result<usize>;
}
