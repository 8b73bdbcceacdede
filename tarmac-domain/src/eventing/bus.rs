//! 事件总线（EventBus）协议
//!
//! 定义发布与订阅的统一抽象：
//! - `publish` 在返回 `Ok` 前必须保证消息已被传输层持久化，否则报错由调用方重试；
//! - `subscribe` 返回 'static 生命周期的分区事件流，从消费组已提交位点恢复，
//!   投递语义为“至少一次”，顺序仅在分区内有保证；
//! - `commit` 持久化消费组在某分区的处理进度。
//!
use crate::{error::DomainResult as Result, eventing::Delivered};
use async_trait::async_trait;
use futures_core::stream::BoxStream;
use serde_json::Value;

/// 事件总线：按键分区的发布/订阅与位点提交
#[async_trait]
pub trait EventBus: Send + Sync {
    /// 发布一条消息到主题，分区由 `key` 决定；返回 `Ok` 即已持久化
    async fn publish(&self, topic: &str, key: &str, payload: Value) -> Result<()>;

    /// 主题的分区数（消费组并行度的上界）
    fn partitions(&self, topic: &str) -> u32;

    /// 订阅某分区，从 `group` 已提交位点开始产出消息流
    async fn subscribe(
        &self,
        topic: &str,
        group: &str,
        partition: u32,
    ) -> BoxStream<'static, Result<Delivered>>;

    /// 提交 `group` 在某分区的位点：`offset` 及之前的消息不再重放
    async fn commit(&self, topic: &str, group: &str, partition: u32, offset: u64) -> Result<()>;
}
