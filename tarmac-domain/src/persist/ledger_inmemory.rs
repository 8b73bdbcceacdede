//! 内存版幂等台账（InMemoryIdempotencyLedger）
//!
//! 基于 `DashMap` entry API 的原子 record-if-absent 实现，
//! 并提供基于记录时间的保留期清理。
//!
use crate::error::DomainResult as Result;
use crate::persist::{IdempotencyLedger, LedgerStatus, OutcomeRef};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// 简单的内存台账实现
#[derive(Default)]
pub struct InMemoryIdempotencyLedger {
    entries: DashMap<String, OutcomeRef>,
}

impl InMemoryIdempotencyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// 当前条目数（测试与运维观测用）
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl IdempotencyLedger for InMemoryIdempotencyLedger {
    async fn find(&self, event_id: &str) -> Result<Option<OutcomeRef>> {
        Ok(self.entries.get(event_id).map(|e| e.clone()))
    }

    async fn record_if_absent(
        &self,
        event_id: &str,
        outcome: OutcomeRef,
    ) -> Result<LedgerStatus> {
        match self.entries.entry(event_id.to_string()) {
            Entry::Occupied(entry) => Ok(LedgerStatus::AlreadyPresent(entry.get().clone())),
            Entry::Vacant(entry) => {
                entry.insert(outcome);
                Ok(LedgerStatus::Recorded)
            }
        }
    }

    async fn sweep_expired(&self, retention: Duration) -> Result<usize> {
        let cutoff = Utc::now() - retention;
        let before = self.entries.len();
        self.entries.retain(|_, v| v.recorded_at() >= cutoff);
        Ok(before - self.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Decision;
    use serde_json::json;
    use std::sync::Arc;

    fn outcome_ref(flight_id: &str) -> OutcomeRef {
        OutcomeRef::builder()
            .flight_id(flight_id.to_string())
            .decision(Decision::Assigned)
            .payload(json!({"flightId": flight_id, "decision": "ASSIGNED"}))
            .recorded_at(Utc::now())
            .build()
    }

    #[tokio::test]
    async fn first_record_wins_second_sees_existing() {
        let ledger = InMemoryIdempotencyLedger::new();
        assert!(ledger.find("e-1").await.unwrap().is_none());

        let status = ledger
            .record_if_absent("e-1", outcome_ref("AI101"))
            .await
            .unwrap();
        assert_eq!(status, LedgerStatus::Recorded);

        let status = ledger
            .record_if_absent("e-1", outcome_ref("AI999"))
            .await
            .unwrap();
        match status {
            LedgerStatus::AlreadyPresent(existing) => {
                // 既有条目永不被覆盖
                assert_eq!(existing.flight_id(), "AI101");
            }
            other => panic!("unexpected {other:?}"),
        }

        let found = ledger.find("e-1").await.unwrap().unwrap();
        assert_eq!(found.flight_id(), "AI101");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn concurrent_record_admits_exactly_one() {
        let ledger = Arc::new(InMemoryIdempotencyLedger::new());
        let mut tasks = Vec::new();
        for n in 0..8 {
            let ledger = Arc::clone(&ledger);
            tasks.push(tokio::spawn(async move {
                ledger
                    .record_if_absent("e-1", outcome_ref(&format!("AI{n:03}")))
                    .await
                    .unwrap()
            }));
        }

        let mut recorded = 0;
        for task in tasks {
            if matches!(task.await.unwrap(), LedgerStatus::Recorded) {
                recorded += 1;
            }
        }
        assert_eq!(recorded, 1);
        assert_eq!(ledger.len(), 1);
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let ledger = InMemoryIdempotencyLedger::new();
        let old = OutcomeRef::builder()
            .flight_id("AI101".to_string())
            .decision(Decision::Rejected)
            .payload(json!({}))
            .recorded_at(Utc::now() - Duration::hours(48))
            .build();
        ledger.record_if_absent("e-old", old).await.unwrap();
        ledger
            .record_if_absent("e-new", outcome_ref("AI202"))
            .await
            .unwrap();

        let removed = ledger.sweep_expired(Duration::hours(24)).await.unwrap();
        assert_eq!(removed, 1);
        assert!(ledger.find("e-old").await.unwrap().is_none());
        assert!(ledger.find("e-new").await.unwrap().is_some());
    }
}
