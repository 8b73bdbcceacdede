//! 事件子系统（eventing）
//!
//! 提供事件发布/订阅的基础抽象与内存实现：
//! - `EventBus`：按主题与键发布、按分区订阅与位点提交的统一协议；
//! - `Delivered`：一次投递的消息（键、负载、分区、位点）；
//! - `InMemoryEventBus`：分区化、可从已提交位点重放的内存实现。
//!
//! 投递语义为“至少一次”，顺序仅在单个分区内有保证；
//! 该模块仅定义协议与内存实现，不绑定具体消息系统。
//!
pub mod bus;
pub mod bus_inmemory;
pub mod message;

pub use bus::EventBus;
pub use bus_inmemory::InMemoryEventBus;
pub use message::Delivered;
