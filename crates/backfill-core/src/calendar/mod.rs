//! 트레이딩 캘린더.
//!
//! 날짜 단위로 거래일/휴장일을 판단합니다. 시계열의 공백이 주말·휴일 때문인지,
//! 실제로 수집이 빠진 세션인지 구분하는 데 사용합니다.
//!
//! 휴장 판단 규칙: 주말 **또는** 생성된 휴장일 **또는** 사용자 지정 휴장일.
//! 생성 범위 밖의 연도는 "알려진 휴일 없음"으로 취급하며, 주말과 사용자 지정
//! 휴장일 판단은 그대로 적용됩니다.

mod holidays;

pub use holidays::{is_weekend, HolidayRules};

use std::collections::BTreeMap;
use std::iter::successors;
use std::sync::{PoisonError, RwLock};

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// 캘린더 생성 가능한 연도 범위.
const SUPPORTED_YEARS: std::ops::RangeInclusive<i32> = 1900..=2199;

/// 캘린더 설정.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// 휴장일 생성 시작 연도
    pub start_year: i32,
    /// 휴장일 생성 종료 연도 (포함)
    pub end_year: i32,
    /// 휴장일 규칙
    pub rules: HolidayRules,
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            start_year: 2020,
            end_year: 2034,
            rules: HolidayRules::Federal,
        }
    }
}

impl CalendarConfig {
    /// 연도 범위를 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.start_year > self.end_year
            || !SUPPORTED_YEARS.contains(&self.start_year)
            || !SUPPORTED_YEARS.contains(&self.end_year)
        {
            return Err(CoreError::InvalidYearRange {
                start: self.start_year,
                end: self.end_year,
            });
        }
        Ok(())
    }
}

/// 거래일 판단 서비스.
///
/// 휴장일 목록은 생성 후 변하지 않고, 사용자 지정 휴장일만 `RwLock`으로
/// 보호되는 관리용 쓰기 대상입니다. `Arc<TradingCalendar>`로 공유합니다.
#[derive(Debug)]
pub struct TradingCalendar {
    rules: HolidayRules,
    start_year: i32,
    end_year: i32,
    holidays: BTreeMap<NaiveDate, String>,
    closures: RwLock<BTreeMap<NaiveDate, String>>,
}

impl Default for TradingCalendar {
    fn default() -> Self {
        let config = CalendarConfig::default();
        Self::build(config.rules, config.start_year, config.end_year)
    }
}

impl TradingCalendar {
    /// 설정으로 캘린더를 생성합니다.
    pub fn new(config: &CalendarConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self::build(config.rules, config.start_year, config.end_year))
    }

    fn build(rules: HolidayRules, start_year: i32, end_year: i32) -> Self {
        let holidays = holidays::generate(rules, start_year, end_year);
        tracing::debug!(
            rules = %rules,
            start_year,
            end_year,
            holidays = holidays.len(),
            "휴장일 생성 완료"
        );

        Self {
            rules,
            start_year,
            end_year,
            holidays,
            closures: RwLock::new(BTreeMap::new()),
        }
    }

    /// 적용 중인 휴장일 규칙.
    pub fn rules(&self) -> HolidayRules {
        self.rules
    }

    /// 휴장일이 생성된 연도 범위.
    pub fn year_range(&self) -> (i32, i32) {
        (self.start_year, self.end_year)
    }

    /// 해당 연도의 휴장일이 생성되어 있는지 확인합니다.
    pub fn covers_year(&self, year: i32) -> bool {
        (self.start_year..=self.end_year).contains(&year)
    }

    fn closures(&self) -> std::sync::RwLockReadGuard<'_, BTreeMap<NaiveDate, String>> {
        self.closures.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn closed_with(&self, date: NaiveDate, closures: &BTreeMap<NaiveDate, String>) -> bool {
        is_weekend(date) || self.holidays.contains_key(&date) || closures.contains_key(&date)
    }

    /// 휴장일 여부.
    pub fn is_closed(&self, date: NaiveDate) -> bool {
        self.closed_with(date, &self.closures())
    }

    /// 거래일 여부.
    pub fn is_open(&self, date: NaiveDate) -> bool {
        !self.is_closed(date)
    }

    /// `date` 이후(미포함) 첫 거래일.
    ///
    /// 날짜 표현 범위 끝에 도달하면 `None`을 반환합니다.
    pub fn next_open_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let closures = self.closures();
        successors(date.succ_opt(), |d| d.succ_opt()).find(|d| !self.closed_with(*d, &closures))
    }

    /// `date` 이전(미포함) 마지막 거래일.
    pub fn previous_open_day(&self, date: NaiveDate) -> Option<NaiveDate> {
        let closures = self.closures();
        successors(date.pred_opt(), |d| d.pred_opt()).find(|d| !self.closed_with(*d, &closures))
    }

    /// `[start, end]` 구간의 거래일 목록 (오름차순).
    ///
    /// `start > end`이면 빈 목록을 반환합니다.
    pub fn open_days_in_range(&self, start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
        let closures = self.closures();
        successors(Some(start), |d| d.succ_opt())
            .take_while(|d| *d <= end)
            .filter(|d| !self.closed_with(*d, &closures))
            .collect()
    }

    /// `[start, end]` 구간의 거래일 수.
    pub fn count_open_days(&self, start: NaiveDate, end: NaiveDate) -> usize {
        let closures = self.closures();
        successors(Some(start), |d| d.succ_opt())
            .take_while(|d| *d <= end)
            .filter(|d| !self.closed_with(*d, &closures))
            .count()
    }

    /// 사용자 지정 휴장일을 등록합니다 (기존 항목은 덮어씀).
    ///
    /// 프로세스 전체의 이후 조회에 즉시 반영되므로 요청 단위가 아닌
    /// 관리 작업으로 취급해야 합니다. 이전 사유가 있으면 반환합니다.
    pub fn register_closure(&self, date: NaiveDate, reason: impl Into<String>) -> Option<String> {
        let reason = reason.into();
        tracing::info!(date = %date, reason = %reason, "사용자 지정 휴장일 등록");
        self.closures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(date, reason)
    }

    /// 사용자 지정 휴장일을 제거합니다.
    pub fn remove_closure(&self, date: NaiveDate) -> Option<String> {
        let removed = self
            .closures
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&date);
        if removed.is_some() {
            tracing::info!(date = %date, "사용자 지정 휴장일 제거");
        }
        removed
    }

    /// 등록된 사용자 지정 휴장일 목록 (날짜순).
    pub fn custom_closures(&self) -> Vec<(NaiveDate, String)> {
        self.closures()
            .iter()
            .map(|(date, reason)| (*date, reason.clone()))
            .collect()
    }

    /// 휴일 이름 조회.
    ///
    /// 생성된 휴장일 이름이 우선이고, 없으면 사용자 지정 사유를 반환합니다.
    pub fn holiday_name(&self, date: NaiveDate) -> Option<String> {
        self.holidays
            .get(&date)
            .cloned()
            .or_else(|| self.closures().get(&date).cloned())
    }

    /// 특정 연도의 휴장일 목록 (사용자 지정 제외, 날짜순).
    pub fn holidays_in_year(&self, year: i32) -> Vec<(NaiveDate, String)> {
        let (Some(first), Some(last)) = (
            NaiveDate::from_ymd_opt(year, 1, 1),
            NaiveDate::from_ymd_opt(year, 12, 31),
        ) else {
            return Vec::new();
        };

        self.holidays
            .range(first..=last)
            .map(|(date, name)| (*date, name.clone()))
            .collect()
    }

    /// 미국 동부 시간 기준 오늘 날짜.
    pub fn market_today() -> NaiveDate {
        Utc::now()
            .with_timezone(&chrono_tz::America::New_York)
            .date_naive()
    }

    /// 오늘(미국 동부 시간) 거래일 여부.
    pub fn is_open_today(&self) -> bool {
        self.is_open(Self::market_today())
    }
}
