//! 跑道占用记录（RunwayRecord）
//!
//! 状态存储中的权威占用状态：
//! - `occupied_intervals` 按起点排序且两两互不重叠（安全不变式）；
//! - `version` 在每次成功写入时递增，是条件写的唯一依据；
//! - 记录仅通过协调器的条件更新协议修改，禁止无版本校验的读改写。
//!
use crate::value_object::{Version, Window};
use serde::{Deserialize, Serialize};

/// 单个占用区间：某航班对跑道的一次预留
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupiedInterval {
    flight_id: String,
    window: Window,
}

impl OccupiedInterval {
    pub fn new(flight_id: impl Into<String>, window: Window) -> Self {
        Self {
            flight_id: flight_id.into(),
            window,
        }
    }

    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    pub fn window(&self) -> &Window {
        &self.window
    }
}

/// 跑道占用记录（状态存储的值）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunwayRecord {
    runway_id: String,
    occupied_intervals: Vec<OccupiedInterval>,
    version: Version,
}

impl RunwayRecord {
    /// 空记录（版本 0）：未知跑道在首次引用时的隐式形态
    pub fn empty(runway_id: impl Into<String>) -> Self {
        Self {
            runway_id: runway_id.into(),
            occupied_intervals: Vec::new(),
            version: Version::new(),
        }
    }

    pub fn runway_id(&self) -> &str {
        &self.runway_id
    }

    pub fn occupied_intervals(&self) -> &[OccupiedInterval] {
        &self.occupied_intervals
    }

    pub fn version(&self) -> Version {
        self.version
    }

    /// 以新的区间集合构造候选记录（版本不变，由存储在写入成功后赋值）
    pub fn with_intervals(&self, intervals: Vec<OccupiedInterval>) -> Self {
        Self {
            runway_id: self.runway_id.clone(),
            occupied_intervals: intervals,
            version: self.version,
        }
    }

    pub(crate) fn with_version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    /// 是否已包含某航班在完全相同窗口下的占用
    pub fn contains(&self, flight_id: &str, window: &Window) -> bool {
        self.occupied_intervals
            .iter()
            .any(|i| i.flight_id() == flight_id && i.window() == window)
    }

    /// 校验安全不变式：按起点有序且两两互不重叠
    pub fn is_consistent(&self) -> bool {
        self.occupied_intervals
            .windows(2)
            .all(|pair| {
                pair[0].window().start() <= pair[1].window().start()
                    && !pair[0].window().overlaps(pair[1].window())
            })
    }
}
