//! 冲突裁决（Conflict Resolver）
//!
//! 纯函数：给定既有占用区间与候选窗口，判定是否可放置并产出应写入的新区间集合。
//! 无副作用、无 I/O、输入确定则输出确定——这一确定性是重试安全的前提。
//!
use crate::runway::OccupiedInterval;
use crate::value_object::Window;

/// 裁决结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// 可放置：返回插入候选后按起点排序的新区间集合
    Fits(Vec<OccupiedInterval>),
    /// 与既有占用冲突：携带首个冲突航班以便诊断
    Conflicts { flight_id: String },
}

/// 对候选窗口做冲突裁决
///
/// 半开区间规则：`end1 == start2` 的首尾相接不算冲突。
/// 若 `(flight_id, candidate)` 已存在于 `existing`，返回原集合的 `Fits`——
/// 崩溃后重投的请求会被重新确认而不是与自己的占用相撞。
pub fn resolve(existing: &[OccupiedInterval], flight_id: &str, candidate: Window) -> Placement {
    for interval in existing {
        if interval.flight_id() == flight_id && interval.window() == &candidate {
            return Placement::Fits(existing.to_vec());
        }
    }

    for interval in existing {
        if interval.window().overlaps(&candidate) {
            return Placement::Conflicts {
                flight_id: interval.flight_id().to_string(),
            };
        }
    }

    let mut updated = existing.to_vec();
    let insert_at = updated
        .iter()
        .position(|i| i.window().start() > candidate.start())
        .unwrap_or(updated.len());
    updated.insert(insert_at, OccupiedInterval::new(flight_id, candidate));
    Placement::Fits(updated)
}
