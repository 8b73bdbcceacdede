//! 投递消息（Delivered）
//!
//! 订阅流中产出的单条消息：携带分区与位点，供消费方处理完成后提交。
//!
use bon::Builder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 一次投递：键、负载与其在分区日志中的位置
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct Delivered {
    /// 消息键（决定分区，亦即分区内顺序的单位）
    key: String,
    /// 消息负载（JSON 线格式）
    payload: Value,
    /// 所在分区
    partition: u32,
    /// 分区内位点（由传输层在持久化后赋值）
    offset: u64,
}

impl Delivered {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn partition(&self) -> u32 {
        self.partition
    }

    pub fn offset(&self) -> u64 {
        self.offset
    }
}
