//! 跑道分配引擎应用层（tarmac-engine）
//!
//! 在 `tarmac-domain` 的协议之上编排完整的分配流程：
//! - 分配协调器（`coordinator`）：消费排程事件、驱动裁决与条件写、
//!   保证恰好一次的可观测结论；
//! - 跑道候选策略（`strategy`）：可插拔的候选顺序来源；
//! - 结论与死信发布（`publisher`）；
//! - 重试策略与运行配置（`config`）。
//!
pub mod config;
pub mod coordinator;
pub mod error;
pub mod publisher;
pub mod strategy;

pub use config::{CoordinatorConfig, RetryPolicy};
pub use coordinator::{AllocationCoordinator, EngineHandle};
pub use strategy::{FixedPrioritySelector, RunwaySelector};
