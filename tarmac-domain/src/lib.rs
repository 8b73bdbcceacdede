//! 跑道分配领域层基础库（tarmac-domain）
//!
//! 提供跑道分配引擎的领域抽象与基础构件：
//! - 值对象（`value_object`）：版本号与半开时间窗；
//! - 航班排程请求（`flight`）与分配结果（`outcome`）；
//! - 跑道占用记录（`runway`）与纯函数冲突裁决（`resolver`）；
//! - 事件系统（`eventing`）：分区化总线协议与内存实现；
//! - 持久化协议（`persist`）：跑道状态存储与幂等台账。
//!
//! 本 crate 尽量保持与存储与传输实现解耦，仅定义领域层接口与最小必要的错误类型，
//! 以便在不同基础设施（例如消息中间件、KV 存储等）上进行适配实现。
//!
pub mod error;
pub mod eventing;
pub mod flight;
pub mod outcome;
pub mod persist;
pub mod resolver;
pub mod runway;
pub mod value_object;
