//! OHLCV 캔들 타입.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// 하나의 시간 구간에 대한 OHLCV 캔들.
///
/// `timestamp`는 구간 시작 시각(UTC)입니다.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 구간 시작 시각
    pub timestamp: DateTime<Utc>,
    /// 시가
    pub open: f64,
    /// 고가
    pub high: f64,
    /// 저가
    pub low: f64,
    /// 종가
    pub close: f64,
    /// 거래량
    pub volume: f64,
}

impl Candle {
    /// 새 캔들을 생성합니다.
    pub fn new(
        timestamp: DateTime<Utc>,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Self {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    /// 캔들이 속한 거래 세션 날짜 (UTC 기준).
    pub fn session_date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// 고가/저가가 시가·종가를 감싸는지 확인합니다.
    pub fn is_consistent(&self) -> bool {
        self.low <= self.high
            && self.low <= self.open.min(self.close)
            && self.high >= self.open.max(self.close)
            && self.volume >= 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_session_date_uses_utc_day() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 23, 59, 0).unwrap();
        let candle = Candle::new(ts, 10.0, 11.0, 9.5, 10.5, 1_000.0);
        assert_eq!(
            candle.session_date(),
            NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
        );
    }

    #[test]
    fn test_consistency() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 14, 30, 0).unwrap();
        assert!(Candle::new(ts, 10.0, 11.0, 9.5, 10.5, 1_000.0).is_consistent());
        assert!(!Candle::new(ts, 10.0, 9.0, 9.5, 10.5, 1_000.0).is_consistent());
        assert!(!Candle::new(ts, 10.0, 11.0, 9.5, 10.5, -1.0).is_consistent());
    }
}
