//! 值对象（Value Object）
//!
//! 无标识、以值相等为准的对象，用于封装不可变的概念性值与校验逻辑。
//!

use crate::error::{DomainError, DomainResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 值对象抽象
pub trait ValueObject {
    /// 业务校验失败时的错误类型
    type Error;

    /// 创建值对象时进行验证
    fn validate(&self) -> Result<(), Self::Error>;
}

/// 版本号（用于乐观锁和并发控制）
///
/// 提供类型安全的版本号操作，避免直接使用 usize 导致的语义不明确问题。
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Version(usize);

impl Version {
    /// 创建初始版本（版本号为 0）
    pub const fn new() -> Self {
        Self(0)
    }

    /// 从值创建版本号
    pub const fn from_value(value: usize) -> Self {
        Self(value)
    }

    /// 获取下一个版本号
    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }

    /// 获取版本号的值
    pub const fn value(&self) -> usize {
        self.0
    }

    /// 检查是否为初始版本
    pub fn is_new(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl From<usize> for Version {
    fn from(value: usize) -> Self {
        Self::from_value(value)
    }
}

impl From<Version> for usize {
    fn from(version: Version) -> Self {
        version.value()
    }
}

/// 半开时间窗 `[start, end)`
///
/// 跑道占用的基本时间单位：构造即校验 `end > start`；
/// 重叠判定采用半开区间规则，首尾相接（`end1 == start2`）不算冲突。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl Window {
    /// 创建时间窗，`end <= start` 时返回 `InvalidValue`
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<Self> {
        let window = Self { start, end };
        window.validate()?;
        Ok(window)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// 半开区间重叠判定：`start1 < end2 && start2 < end1`
    pub fn overlaps(&self, other: &Window) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl ValueObject for Window {
    type Error = DomainError;

    fn validate(&self) -> Result<(), Self::Error> {
        if self.end <= self.start {
            return Err(DomainError::invalid_value(format!(
                "window end must be after start: start={}, end={}",
                self.start, self.end
            )));
        }
        Ok(())
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
