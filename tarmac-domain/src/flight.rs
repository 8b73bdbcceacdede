//! 航班排程请求（FlightScheduleRequest）
//!
//! 入口主题上的线格式事件：由接入层发布、协调器消费，发布后不可变。
//! `event_id` 与 `flight_id` 分离：同一航班可在新的 `event_id` 下合法重新申请，
//! 而传输层对同一 `event_id` 的重投仍能被幂等台账去重。
//!
use crate::error::{DomainError, DomainResult};
use crate::value_object::Window;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 航班排程请求（入口事件）
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightScheduleRequest {
    /// 事件唯一标识符（幂等键，区别于 flight_id）
    event_id: String,
    /// 航班唯一标识符（生产方分配）
    flight_id: String,
    /// 出发机场代码（IATA 风格，三位大写字母）
    origin_code: String,
    /// 到达机场代码（IATA 风格，三位大写字母）
    destination_code: String,
    /// 申请占用窗口起点
    window_start: DateTime<Utc>,
    /// 申请占用窗口终点（必须晚于起点）
    window_end: DateTime<Utc>,
    /// 请求提交时间
    submitted_at: DateTime<Utc>,
}

impl FlightScheduleRequest {
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    pub fn flight_id(&self) -> &str {
        &self.flight_id
    }

    pub fn origin_code(&self) -> &str {
        &self.origin_code
    }

    pub fn destination_code(&self) -> &str {
        &self.destination_code
    }

    pub fn window_start(&self) -> DateTime<Utc> {
        self.window_start
    }

    pub fn window_end(&self) -> DateTime<Utc> {
        self.window_end
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// 校验请求是否为合法输入；失败属于永久性错误（应路由至死信通道）
    pub fn validate(&self) -> DomainResult<()> {
        if self.event_id.trim().is_empty() {
            return Err(DomainError::invalid_value("eventId must not be blank"));
        }
        if self.flight_id.trim().is_empty() {
            return Err(DomainError::invalid_value("flightId must not be blank"));
        }
        validate_airport_code("originCode", &self.origin_code)?;
        validate_airport_code("destinationCode", &self.destination_code)?;
        if self.window_end <= self.window_start {
            return Err(DomainError::invalid_value(format!(
                "windowEnd must be after windowStart: start={}, end={}",
                self.window_start, self.window_end
            )));
        }
        Ok(())
    }

    /// 返回已校验的占用窗口
    pub fn window(&self) -> DomainResult<Window> {
        Window::new(self.window_start, self.window_end)
    }
}

fn validate_airport_code(field: &str, code: &str) -> DomainResult<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(DomainError::invalid_value(format!(
            "{field} must be a 3-letter uppercase IATA code, got {code:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 10, minute, 0).unwrap()
    }

    fn request() -> FlightScheduleRequest {
        FlightScheduleRequest::builder()
            .event_id(ulid::Ulid::new().to_string())
            .flight_id("AI101".to_string())
            .origin_code("DEL".to_string())
            .destination_code("BOM".to_string())
            .window_start(ts(0))
            .window_end(ts(30))
            .submitted_at(ts(0))
            .build()
    }

    #[test]
    fn valid_request_passes() {
        let req = request();
        assert!(req.validate().is_ok());
        let w = req.window().unwrap();
        assert_eq!(w.start(), ts(0));
        assert_eq!(w.end(), ts(30));
    }

    #[test]
    fn inverted_window_is_invalid() {
        let req = FlightScheduleRequest::builder()
            .event_id("e-1".to_string())
            .flight_id("AI101".to_string())
            .origin_code("DEL".to_string())
            .destination_code("BOM".to_string())
            .window_start(ts(30))
            .window_end(ts(30))
            .submitted_at(ts(0))
            .build();
        let err = req.validate().unwrap_err();
        match err {
            DomainError::InvalidValue { .. } => {}
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn airport_codes_must_be_iata_style() {
        let req = FlightScheduleRequest::builder()
            .event_id("e-1".to_string())
            .flight_id("AI101".to_string())
            .origin_code("del".to_string())
            .destination_code("BOM".to_string())
            .window_start(ts(0))
            .window_end(ts(30))
            .submitted_at(ts(0))
            .build();
        assert!(req.validate().is_err());
    }

    #[test]
    fn wire_format_is_camel_case() {
        let json = serde_json::to_value(request()).unwrap();
        let obj = json.as_object().unwrap();
        assert!(obj.contains_key("eventId"));
        assert!(obj.contains_key("flightId"));
        assert!(obj.contains_key("originCode"));
        assert!(obj.contains_key("windowStart"));
        assert!(obj.contains_key("submittedAt"));
    }
}
