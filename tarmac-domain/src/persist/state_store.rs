//! 跑道状态存储（RunwayStateStore）协议
//!
//! 占用状态的唯一权威来源：
//! - `get` 对未知跑道返回版本 0 的空记录（首次引用即隐式创建，无需预置）；
//! - `conditional_put` 仅在版本匹配时接受写入，冲突由调用方重读重试；
//! - 任何组件不得绕过版本校验做读改写。
//!
use crate::error::DomainResult as Result;
use crate::runway::RunwayRecord;
use crate::value_object::Version;
use async_trait::async_trait;

/// 条件写结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// 写入成功，携带存储赋予的新版本
    Stored(Version),
    /// 版本不匹配：并发写入方赢得竞争，调用方应重读后重试
    VersionConflict { actual: Version },
}

/// 跑道状态存储：读与条件写
#[async_trait]
pub trait RunwayStateStore: Send + Sync {
    /// 读取跑道当前记录；未知跑道返回版本 0 的空记录
    async fn get(&self, runway_id: &str) -> Result<RunwayRecord>;

    /// 条件写：仅当当前版本等于 `expected` 时写入，成功后版本递增
    async fn conditional_put(
        &self,
        record: RunwayRecord,
        expected: Version,
    ) -> Result<PutOutcome>;
}
