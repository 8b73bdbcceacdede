//! 内存版跑道状态存储（InMemoryRunwayStore）
//!
//! 基于 `DashMap` entry API 的条件写实现：版本比较与写入在同一分片锁内完成，
//! 两个并发写入方持相同期望版本时恰有一个成功。
//!
use crate::error::DomainResult as Result;
use crate::persist::{PutOutcome, RunwayStateStore};
use crate::runway::RunwayRecord;
use crate::value_object::Version;
use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

/// 简单的内存状态存储实现
#[derive(Default)]
pub struct InMemoryRunwayStore {
    records: DashMap<String, RunwayRecord>,
}

impl InMemoryRunwayStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunwayStateStore for InMemoryRunwayStore {
    async fn get(&self, runway_id: &str) -> Result<RunwayRecord> {
        Ok(self
            .records
            .get(runway_id)
            .map(|r| r.clone())
            .unwrap_or_else(|| RunwayRecord::empty(runway_id)))
    }

    async fn conditional_put(
        &self,
        record: RunwayRecord,
        expected: Version,
    ) -> Result<PutOutcome> {
        match self.records.entry(record.runway_id().to_string()) {
            Entry::Occupied(mut entry) => {
                let actual = entry.get().version();
                if actual != expected {
                    return Ok(PutOutcome::VersionConflict { actual });
                }
                let next = expected.next();
                entry.insert(record.with_version(next));
                Ok(PutOutcome::Stored(next))
            }
            Entry::Vacant(entry) => {
                // 未知跑道的当前版本即 0
                if !expected.is_new() {
                    return Ok(PutOutcome::VersionConflict {
                        actual: Version::new(),
                    });
                }
                let next = expected.next();
                entry.insert(record.with_version(next));
                Ok(PutOutcome::Stored(next))
            }
        }
    }
}
