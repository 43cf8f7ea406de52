//! 개별 품질 검사.
//!
//! 모든 검사는 타임스탬프 오름차순으로 정렬된 레코드를 입력으로 받는
//! 순수 함수이며 서로 독립적입니다.

use std::collections::{BTreeMap, BTreeSet};

use backfill_core::TradingCalendar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::record::CandleRow;
use crate::requirements::ValidationRequirements;
use crate::result::CheckName;

/// 파일 하나의 시계열 지표.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeriesMetrics {
    /// 첫 레코드 시각
    pub first: Option<DateTime<Utc>>,
    /// 마지막 레코드 시각
    pub last: Option<DateTime<Utc>>,
    /// 연속 레코드 사이 최대 공백 (시간)
    pub max_gap_hours: Option<f64>,
    /// 결측 셀 수
    pub null_cells: usize,
    /// 허용치를 넘는 가격 급변 횟수
    pub price_jumps: usize,
    /// 구간 내 거래일 대비 데이터가 있는 거래일 비율 (캘린더가 있을 때만)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_coverage: Option<f64>,
}

/// 네 가지 검사를 모두 실행합니다.
pub fn evaluate(
    rows: &[CandleRow],
    requirements: &ValidationRequirements,
    calendar: Option<&TradingCalendar>,
) -> (BTreeMap<CheckName, bool>, SeriesMetrics) {
    let max_gap = max_gap_hours(rows);
    let null_cells = count_null_cells(rows);
    let price_jumps = count_price_jumps(rows, requirements.max_price_jump);

    let mut checks = BTreeMap::new();
    checks.insert(
        CheckName::SufficientRecords,
        rows.len() >= requirements.min_records,
    );
    checks.insert(
        CheckName::NoExtremeGaps,
        max_gap.map_or(true, |gap| gap <= requirements.max_gap_hours),
    );
    checks.insert(CheckName::NoNulls, null_cells == 0);
    checks.insert(
        CheckName::PriceContinuity,
        rows.len() < 2 || price_jumps <= requirements.max_price_jumps,
    );

    let metrics = SeriesMetrics {
        first: rows.first().map(|r| r.timestamp),
        last: rows.last().map(|r| r.timestamp),
        max_gap_hours: max_gap,
        null_cells,
        price_jumps,
        date_coverage: calendar.and_then(|cal| date_coverage(rows, cal)),
    };

    (checks, metrics)
}

/// 연속 레코드 사이 최대 공백 (시간). 레코드가 2개 미만이면 `None`.
pub fn max_gap_hours(rows: &[CandleRow]) -> Option<f64> {
    rows.windows(2)
        .map(|pair| (pair[1].timestamp - pair[0].timestamp).num_seconds() as f64 / 3600.0)
        .reduce(f64::max)
}

/// open/high/low/close/volume 중 결측 셀 수.
pub fn count_null_cells(rows: &[CandleRow]) -> usize {
    rows.iter().map(CandleRow::null_count).sum()
}

/// 전 봉 종가 대비 시가 변화율이 `max_jump`를 넘는 횟수.
///
/// 어느 한쪽 값이 결측이면 해당 쌍은 건너뜁니다 (결측은 `no_nulls`가 판단).
/// 전 봉 종가가 0이면 시가가 0이 아닌 경우를 급변으로 셉니다.
pub fn count_price_jumps(rows: &[CandleRow], max_jump: f64) -> usize {
    rows.windows(2)
        .filter(|pair| match (pair[0].close, pair[1].open) {
            (Some(prev_close), Some(open)) if prev_close == 0.0 => open != 0.0,
            (Some(prev_close), Some(open)) => {
                (prev_close - open).abs() / prev_close.abs() > max_jump
            }
            _ => false,
        })
        .count()
}

/// 데이터가 존재하는 거래일 수 / 첫~마지막 레코드 구간의 거래일 수.
///
/// 구간에 거래일이 없으면 `None`.
pub fn date_coverage(rows: &[CandleRow], calendar: &TradingCalendar) -> Option<f64> {
    let first = rows.first()?.timestamp.date_naive();
    let last = rows.last()?.timestamp.date_naive();

    let expected = calendar.count_open_days(first, last);
    if expected == 0 {
        return None;
    }

    let covered: BTreeSet<_> = rows
        .iter()
        .map(|r| r.timestamp.date_naive())
        .filter(|d| calendar.is_open(*d))
        .collect();

    Some(covered.len() as f64 / expected as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn row(hours: i64, open: f64, close: f64) -> CandleRow {
        CandleRow {
            timestamp: Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap() + Duration::hours(hours),
            open: Some(open),
            high: Some(open.max(close)),
            low: Some(open.min(close)),
            close: Some(close),
            volume: Some(1000.0),
        }
    }

    #[test]
    fn test_gap_requires_two_rows() {
        assert_eq!(max_gap_hours(&[]), None);
        assert_eq!(max_gap_hours(&[row(0, 1.0, 1.0)]), None);
        assert_eq!(max_gap_hours(&[row(0, 1.0, 1.0), row(3, 1.0, 1.0)]), Some(3.0));
    }

    #[test]
    fn test_price_jumps() {
        let rows = vec![row(0, 100.0, 100.0), row(1, 125.0, 125.0), row(2, 126.0, 126.0)];
        assert_eq!(count_price_jumps(&rows, 0.20), 1);
        assert_eq!(count_price_jumps(&rows, 0.30), 0);
    }

    #[test]
    fn test_jump_exactly_at_threshold_is_allowed() {
        let rows = vec![row(0, 100.0, 100.0), row(1, 120.0, 120.0)];
        assert_eq!(count_price_jumps(&rows, 0.25), 0);
    }

    #[test]
    fn test_jump_skips_missing_values() {
        let mut rows = vec![row(0, 100.0, 100.0), row(1, 150.0, 150.0)];
        rows[0].close = None;
        assert_eq!(count_price_jumps(&rows, 0.20), 0);
    }

    #[test]
    fn test_jump_from_zero_close() {
        let rows = vec![row(0, 0.0, 0.0), row(1, 5.0, 5.0), row(2, 5.0, 0.0), row(3, 0.0, 0.0)];
        assert_eq!(count_price_jumps(&rows, 0.20), 1);
    }

    #[test]
    fn test_evaluate_small_series() {
        let req = ValidationRequirements::default();
        let (checks, metrics) = evaluate(&[row(0, 1.0, 1.0)], &req, None);
        assert!(!checks[&CheckName::SufficientRecords]);
        assert!(checks[&CheckName::NoExtremeGaps]);
        assert!(checks[&CheckName::NoNulls]);
        assert!(checks[&CheckName::PriceContinuity]);
        assert_eq!(metrics.max_gap_hours, None);
        assert_eq!(metrics.date_coverage, None);
    }

    #[test]
    fn test_date_coverage() {
        let calendar = TradingCalendar::default();
        // 2024-03-04(월) ~ 2024-03-08(금), 화요일 누락
        let rows: Vec<_> = [0, 48, 72, 96]
            .iter()
            .map(|h| row(*h, 1.0, 1.0))
            .collect();
        let coverage = date_coverage(&rows, &calendar).unwrap();
        assert!((coverage - 0.8).abs() < 1e-9);
    }
}
