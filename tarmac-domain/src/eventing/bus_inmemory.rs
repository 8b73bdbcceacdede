//! 内存版事件总线（InMemoryEventBus）
//!
//! 满足 `EventBus` 协议的轻量实现：
//! - 每主题固定分区数，键经哈希映射到分区，分区内为追加日志；
//! - `subscribe` 从消费组已提交位点重放，未提交的消息在重新订阅后再次投递
//!   （“至少一次”语义）；
//! - 位点提交单调递增，重复提交取较大值；
//! - 典型用途：测试环境、示例与本地开发。
//!
use crate::error::{DomainError, DomainResult as Result};
use crate::eventing::{Delivered, EventBus};
use async_trait::async_trait;
use dashmap::DashMap;
use futures_core::stream::BoxStream;
use futures_util::stream;
use serde_json::Value;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// 分区日志：消息与“已写入长度”水位
struct PartitionLog {
    entries: Mutex<Vec<(String, Value)>>,
    len_tx: watch::Sender<u64>,
}

impl PartitionLog {
    fn new() -> Self {
        let (len_tx, _len_rx) = watch::channel(0);
        Self {
            entries: Mutex::new(Vec::new()),
            len_tx,
        }
    }
}

struct TopicState {
    partitions: Vec<Arc<PartitionLog>>,
}

impl TopicState {
    fn new(partition_count: u32) -> Self {
        Self {
            partitions: (0..partition_count).map(|_| Arc::new(PartitionLog::new())).collect(),
        }
    }
}

/// 简单的内存事件总线实现
pub struct InMemoryEventBus {
    partition_count: u32,
    topics: DashMap<String, Arc<TopicState>>,
    // (topic, group, partition) -> 下一个待消费位点
    committed: DashMap<(String, String, u32), u64>,
}

impl InMemoryEventBus {
    /// 创建内存总线，每个主题固定 `partition_count` 个分区
    pub fn new(partition_count: u32) -> Self {
        Self {
            partition_count: partition_count.max(1),
            topics: DashMap::new(),
            committed: DashMap::new(),
        }
    }

    fn topic(&self, topic: &str) -> Arc<TopicState> {
        self.topics
            .entry(topic.to_string())
            .or_insert_with(|| Arc::new(TopicState::new(self.partition_count)))
            .clone()
    }

    fn partition_for(&self, key: &str) -> u32 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % u64::from(self.partition_count)) as u32
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<()> {
        let state = self.topic(topic);
        let partition = self.partition_for(key);
        let log = Arc::clone(&state.partitions[partition as usize]);

        let mut entries = log.entries.lock().await;
        entries.push((key.to_string(), payload));
        // 水位推进即视为持久化完成；send_replace 在暂无订阅者时依然生效
        log.len_tx.send_replace(entries.len() as u64);
        Ok(())
    }

    fn partitions(&self, _topic: &str) -> u32 {
        self.partition_count
    }

    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
    ) -> BoxStream<'static, Result<Delivered>> {
        if partition >= self.partition_count {
            let err = DomainError::event_bus(format!(
                "partition {partition} out of range for topic {topic} (count={})",
                self.partition_count
            ));
            return Box::pin(stream::iter(vec![Err(err)]));
        }

        let state = self.topic(topic);
        let log = Arc::clone(&state.partitions[partition as usize]);
        let len_rx = log.len_tx.subscribe();
        let start = self
            .committed
            .get(&(topic.to_string(), group.to_string(), partition))
            .map(|v| *v)
            .unwrap_or(0);

        Box::pin(stream::unfold(
            (log, len_rx, start, partition),
            |(log, mut len_rx, next, partition)| async move {
                loop {
                    // 先克隆出条目再释放锁，日志句柄随后才能移入下一轮状态
                    let entry = {
                        let entries = log.entries.lock().await;
                        entries.get(next as usize).cloned()
                    };
                    if let Some((key, payload)) = entry {
                        let delivered = Delivered::builder()
                            .key(key)
                            .payload(payload)
                            .partition(partition)
                            .offset(next)
                            .build();
                        return Some((Ok(delivered), (log, len_rx, next + 1, partition)));
                    }
                    if len_rx.changed().await.is_err() {
                        return None;
                    }
                }
            },
        ))
    }

    async fn commit(&self, topic: &str, group: &str, partition: u32, offset: u64) -> Result<()> {
        self.committed
            .entry((topic.to_string(), group.to_string(), partition))
            .and_modify(|v| *v = (*v).max(offset + 1))
            .or_insert(offset + 1);
        Ok(())
    }
}
