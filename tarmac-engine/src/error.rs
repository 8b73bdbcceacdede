//! 应用层错误分类
//!
//! 按可恢复性划分：
//! - `Validation`：永久性错误，路由至死信通道，不重试；
//! - `Transient`：基础设施瞬时故障，按退避策略重试，预算耗尽后挂起待重放；
//! - 版本冲突不在此出现——它是 CAS 循环内的预期竞争，由协调器就地处理。
//!
use tarmac_domain::error::DomainError;

#[non_exhaustive]
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    #[error("domain: {0}")]
    Domain(#[from] DomainError),

    #[error("validation: {reason}")]
    Validation { reason: String },

    #[error("transient: {reason}")]
    Transient { reason: String },
}

impl EngineError {
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    pub fn transient(reason: impl std::fmt::Display) -> Self {
        Self::Transient {
            reason: reason.to_string(),
        }
    }

    /// 永久性错误不重试，直接进入死信通道
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::Domain(DomainError::InvalidValue { .. })
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
