//! 结论与死信发布
//!
//! - `OutcomePublisher`：将分配结论（或台账中既有结论的原始负载）发布到
//!   结论主题，以 `flightId` 作键保证单航班的下游顺序；
//! - `DeadLetterPublisher`：永久失败的输入连同 `failureReason` 进入死信主题，
//!   重试预算耗尽的输入进入挂起主题待人工重放——两者都绝不静默丢弃。
//!
//! 所有发布都对瞬时总线故障做有界退避重试，预算耗尽后以 `Transient` 上抛。
//!
use crate::config::RetryPolicy;
use crate::error::{EngineError, EngineResult};
use chrono::Utc;
use serde_json::{Value, json};
use std::sync::Arc;
use tarmac_domain::eventing::EventBus;
use tarmac_domain::outcome::{AllocationOutcome, Decision};

/// 带退避重试的发布；所有出站路径共用
async fn publish_with_retry(
    bus: &Arc<dyn EventBus>,
    retry: &RetryPolicy,
    topic: &str,
    key: &str,
    payload: &Value,
) -> EngineResult<()> {
    let mut attempt = 0u32;
    loop {
        match bus.publish(topic, key, payload.clone()).await {
            Ok(()) => return Ok(()),
            Err(err) => {
                attempt += 1;
                if attempt >= retry.max_attempts {
                    return Err(EngineError::transient(format!(
                        "publish to {topic} failed after {attempt} attempts: {err}"
                    )));
                }
                tokio::time::sleep(retry.delay(attempt)).await;
            }
        }
    }
}

/// 结论发布器
pub struct OutcomePublisher {
    bus: Arc<dyn EventBus>,
    topic: String,
    retry: RetryPolicy,
}

impl OutcomePublisher {
    pub fn new(bus: Arc<dyn EventBus>, topic: impl Into<String>, retry: RetryPolicy) -> Self {
        Self {
            bus,
            topic: topic.into(),
            retry,
        }
    }

    /// 序列化并发布一条分配结论，键为 `flightId`
    pub async fn publish(&self, outcome: &AllocationOutcome) -> EngineResult<Value> {
        let payload = serde_json::to_value(outcome).map_err(EngineError::transient)?;
        self.publish_payload(outcome.flight_id(), &payload).await?;
        Ok(payload)
    }

    /// 逐字节重发既有负载（幂等重投路径）
    pub async fn publish_payload(&self, flight_id: &str, payload: &Value) -> EngineResult<()> {
        publish_with_retry(&self.bus, &self.retry, &self.topic, flight_id, payload).await
    }
}

/// 死信与挂起发布器
pub struct DeadLetterPublisher {
    bus: Arc<dyn EventBus>,
    dead_letter_topic: String,
    parked_topic: String,
    retry: RetryPolicy,
}

impl DeadLetterPublisher {
    pub fn new(
        bus: Arc<dyn EventBus>,
        dead_letter_topic: impl Into<String>,
        parked_topic: impl Into<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            bus,
            dead_letter_topic: dead_letter_topic.into(),
            parked_topic: parked_topic.into(),
            retry,
        }
    }

    /// 永久失败：原始负载 + 失败原因进入死信主题
    pub async fn dead_letter(
        &self,
        key: &str,
        original: &Value,
        failure_reason: &str,
    ) -> EngineResult<()> {
        let envelope = json!({
            "original": original,
            "failureReason": failure_reason,
            "deadLetteredAt": Utc::now(),
        });
        publish_with_retry(&self.bus, &self.retry, &self.dead_letter_topic, key, &envelope).await
    }

    /// 瞬时故障预算耗尽：原始负载标记为 `DEFERRED` 进入挂起主题待人工重放
    pub async fn park(&self, key: &str, original: &Value, reason: &str) -> EngineResult<()> {
        let envelope = json!({
            "original": original,
            "decision": Decision::Deferred,
            "failureReason": reason,
            "parkedAt": Utc::now(),
        });
        publish_with_retry(&self.bus, &self.retry, &self.parked_topic, key, &envelope).await
    }
}
