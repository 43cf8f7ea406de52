//! CLI 명령 구현.

pub mod calendar;
pub mod plan;
pub mod validate;

use std::collections::HashSet;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// `YYYY-MM-DD` 날짜 파싱.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date format: {}. Expected YYYY-MM-DD", s))
}

/// 쉼표로 구분된 심볼 목록 파싱 (대문자, 중복/빈 값 제거).
pub fn parse_symbols(s: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    s.split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty() && seen.insert(s.clone()))
        .collect()
}

/// 날짜 범위 결정. 종료일 기본값은 `today`, 시작일 기본값은 종료일 - `lookback_days`.
pub fn resolve_range(
    from: Option<&str>,
    to: Option<&str>,
    lookback_days: i64,
    today: NaiveDate,
) -> Result<(NaiveDate, NaiveDate)> {
    let end = match to {
        Some(s) => parse_date(s)?,
        None => today,
    };
    let start = match from {
        Some(s) => parse_date(s)?,
        None => end - Duration::days(lookback_days),
    };

    if start > end {
        anyhow::bail!("Start date must be before end date ({} > {})", start, end);
    }
    Ok((start, end))
}
