//! 持久化协议（persist）
//!
//! 定义跑道占用状态与幂等台账的存取协议及内存实现：
//! - `RunwayStateStore`：占用状态的唯一权威来源，仅支持条件写（乐观并发）；
//! - `IdempotencyLedger`：按事件标识去重的台账，record-if-absent 原子语义；
//! - 对应的内存实现用于测试、示例与本地开发。
//!
//! 该模块聚焦协议与装配逻辑，具体存储后端由上层提供实现并注入。
//!
mod ledger;
mod ledger_inmemory;
mod state_inmemory;
mod state_store;

pub use ledger::{IdempotencyLedger, LedgerStatus, OutcomeRef};
pub use ledger_inmemory::InMemoryIdempotencyLedger;
pub use state_inmemory::InMemoryRunwayStore;
pub use state_store::{PutOutcome, RunwayStateStore};
