//! 分配结果（AllocationOutcome）
//!
//! 出口主题上的线格式事件：每个独立 `event_id` 在逻辑上恰好产生一次，
//! 即便传输层重投触发事件也只会重发完全相同的负载（由幂等台账抑制重复决策）。
//!
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 分配决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    /// 已分配到某条跑道
    Assigned,
    /// 无可用跑道（合法的终态，不是错误）
    Rejected,
    /// 重试预算耗尽后挂起待人工重放（仅用于告警通道，不入台账）
    Deferred,
}

/// 分配结果（出口事件）
#[derive(Debug, Clone, PartialEq, Eq, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationOutcome {
    /// 航班唯一标识符
    flight_id: String,
    /// 分配到的跑道；`None` 表示无可用跑道
    runway_id: Option<String>,
    /// 分配决定
    decision: Decision,
    /// 决定时间
    decided_at: DateTime<Utc>,
    /// 触发本次决定的入口事件标识（幂等与追踪）
    causation_event_id: String,
}

impl AllocationOutcome {
    /// 构造 Assigned 结果
    pub fn assigned(
        flight_id: impl Into<String>,
        runway_id: impl Into<String>,
        causation_event_id: impl Into<String>,
    ) -> Self {
        Self {
            flight_id: flight_id.into(),
            runway_id: Some(runway_id.into()),
            decision: Decision::Assigned,
            decided_at: Utc::now(),
            causation_event_id: causation_event_id.into(),
        }
    }

    /// 构造 Rejected 结果（runway_id 为空）
    pub fn rejected(
        flight_id: impl Into<String>,
        causation_event_id: impl Into<String>,
    ) -> Self {
        Self {
            flight_id: flight_id.into(),
            runway_id: None,
            decision: Decision::Rejected,
            decided_at: Utc::now(),
            causation_event_id: causation_event_id.into(),
        }
    }

    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    pub fn runway_id(&self) -> Option<&str> {
        self.runway_id.as_deref()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    pub fn decided_at(&self) -> DateTime<Utc> {
        self.decided_at
    }

    pub fn causation_event_id(&self) -> &str {
        &self.causation_event_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigned_carries_runway() {
        let outcome = AllocationOutcome::assigned("AI101", "R1", "e-1");
        assert_eq!(outcome.decision(), Decision::Assigned);
        assert_eq!(outcome.runway_id(), Some("R1"));
        assert_eq!(outcome.causation_event_id(), "e-1");
    }

    #[test]
    fn rejected_has_null_runway_on_the_wire() {
        let outcome = AllocationOutcome::rejected("AI202", "e-2");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["decision"], "REJECTED");
        assert!(json["runwayId"].is_null());
        assert_eq!(json["flightId"], "AI202");
        assert_eq!(json["causationEventId"], "e-2");
    }

    #[test]
    fn wire_roundtrip() {
        let outcome = AllocationOutcome::assigned("AI101", "R1", "e-1");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["decision"], "ASSIGNED");
        let back: AllocationOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
