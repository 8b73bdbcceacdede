//! 领域层统一错误定义
//!
//! 聚焦序列化、事件总线、状态存储与幂等台账等最小必要集合，
//! 便于在各实现层统一转换为 `DomainError`。
//!
use crate::value_object::Version;
use thiserror::Error;

/// 统一错误类型（基础库最小必要集）
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum DomainError {
    // --- 序列化 ---
    #[error("serialization error: {source}")]
    Serde {
        #[from]
        source: serde_json::Error,
    },

    // --- 领域规则/值校验 ---
    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },
    #[error("invalid state: {reason}")]
    InvalidState { reason: String },

    // --- 事件系统 ---
    #[error("event bus error: {reason}")]
    EventBus { reason: String },

    // --- 持久化 ---
    #[error("state store error: {reason}")]
    StateStore { reason: String },
    #[error("idempotency ledger error: {reason}")]
    Ledger { reason: String },
    #[error("version conflict: expected={expected}, actual={actual}")]
    VersionConflict { expected: Version, actual: Version },
}

impl DomainError {
    pub fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            reason: reason.into(),
        }
    }

    pub fn event_bus(reason: impl Into<String>) -> Self {
        Self::EventBus {
            reason: reason.into(),
        }
    }
}

/// 统一 Result 类型别名
pub type DomainResult<T> = Result<T, DomainError>;
