//! 跑道候选策略（RunwaySelector）
//!
//! 协调器按策略给出的优先顺序逐一尝试候选跑道；
//! 策略是可插拔能力而非固定常量，便于接入真实的排班/偏好逻辑。
//!
use tarmac_domain::flight::FlightScheduleRequest;

/// 候选跑道来源：按优先级降序返回
pub trait RunwaySelector: Send + Sync {
    fn candidates(&self, request: &FlightScheduleRequest) -> Vec<String>;
}

/// 固定优先级策略：对所有请求返回同一候选序列
pub struct FixedPrioritySelector {
    runways: Vec<String>,
}

impl FixedPrioritySelector {
    pub fn new(runways: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            runways: runways.into_iter().map(Into::into).collect(),
        }
    }
}

impl RunwaySelector for FixedPrioritySelector {
    fn candidates(&self, _request: &FlightScheduleRequest) -> Vec<String> {
        self.runways.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn fixed_priority_preserves_order() {
        let selector = FixedPrioritySelector::new(["R1", "R2", "R3"]);
        let request = FlightScheduleRequest::builder()
            .event_id("e-1".to_string())
            .flight_id("AI101".to_string())
            .origin_code("DEL".to_string())
            .destination_code("BOM".to_string())
            .window_start(Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap())
            .window_end(Utc.with_ymd_and_hms(2026, 3, 1, 10, 30, 0).unwrap())
            .submitted_at(Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap())
            .build();
        assert_eq!(selector.candidates(&request), vec!["R1", "R2", "R3"]);
    }
}
