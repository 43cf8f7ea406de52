//! 미국 휴장일 생성 규칙.
//!
//! 휴장일 목록은 API로 조회하지 않고 연도별 규칙으로 한 번에 생성합니다.
//! 주말에 걸린 휴일은 대체 휴일(토요일 → 직전 금요일, 일요일 → 다음 월요일)로
//! 함께 등록되며 이름에 `(observed)`가 붙습니다.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// 휴장일 규칙 집합.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HolidayRules {
    /// 미국 연방 공휴일
    #[default]
    Federal,
    /// NYSE 휴장일 (Good Friday 포함, Columbus/Veterans Day 제외)
    Nyse,
}

impl fmt::Display for HolidayRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HolidayRules::Federal => write!(f, "federal"),
            HolidayRules::Nyse => write!(f, "nyse"),
        }
    }
}

impl FromStr for HolidayRules {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "federal" | "us" => Ok(Self::Federal),
            "nyse" => Ok(Self::Nyse),
            _ => Err(format!("Unknown holiday rules: {}", s)),
        }
    }
}

/// 주말 대체 휴일 처리 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Observance {
    /// 토요일 → 금요일, 일요일 → 월요일
    Both,
    /// 일요일 → 월요일만 (NYSE 신정)
    SundayOnly,
    /// 항상 특정 요일인 휴일
    None,
}

/// 주말 여부.
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// `[start_year, end_year]` 범위의 휴장일 맵을 생성합니다.
///
/// 다음 해 신정의 대체 휴일(12/31)이 범위 안에 들어올 수 있으므로
/// `end_year + 1`까지 생성한 뒤 범위 밖 날짜를 버립니다.
pub(crate) fn generate(
    rules: HolidayRules,
    start_year: i32,
    end_year: i32,
) -> BTreeMap<NaiveDate, String> {
    let mut holidays = BTreeMap::new();

    for year in start_year..=end_year.saturating_add(1) {
        for (date, name, observance) in rules_for_year(rules, year) {
            holidays.entry(date).or_insert_with(|| name.to_string());

            if let Some(observed) = observed_date(date, observance) {
                holidays
                    .entry(observed)
                    .or_insert_with(|| format!("{} (observed)", name));
            }
        }
    }

    holidays.retain(|date, _| (start_year..=end_year).contains(&date.year()));
    holidays
}

fn rules_for_year(
    rules: HolidayRules,
    year: i32,
) -> Vec<(NaiveDate, &'static str, Observance)> {
    let fixed = |month: u32, day: u32, name: &'static str, observance: Observance| {
        NaiveDate::from_ymd_opt(year, month, day).map(|d| (d, name, observance))
    };
    let nth = |month: u32, weekday: Weekday, n: u8, name: &'static str| {
        NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
            .map(|d| (d, name, Observance::None))
    };

    let mut days = Vec::with_capacity(12);

    match rules {
        HolidayRules::Federal => {
            days.push(fixed(1, 1, "New Year's Day", Observance::Both));
            if year >= 1986 {
                days.push(nth(1, Weekday::Mon, 3, "Martin Luther King Jr. Day"));
            }
            days.push(nth(2, Weekday::Mon, 3, "Washington's Birthday"));
            days.push(
                last_weekday_of_month(year, 5, Weekday::Mon)
                    .map(|d| (d, "Memorial Day", Observance::None)),
            );
            if year >= 2021 {
                days.push(fixed(
                    6,
                    19,
                    "Juneteenth National Independence Day",
                    Observance::Both,
                ));
            }
            days.push(fixed(7, 4, "Independence Day", Observance::Both));
            days.push(nth(9, Weekday::Mon, 1, "Labor Day"));
            days.push(nth(10, Weekday::Mon, 2, "Columbus Day"));
            days.push(fixed(11, 11, "Veterans Day", Observance::Both));
            days.push(nth(11, Weekday::Thu, 4, "Thanksgiving"));
            days.push(fixed(12, 25, "Christmas Day", Observance::Both));
        }
        HolidayRules::Nyse => {
            days.push(fixed(1, 1, "New Year's Day", Observance::SundayOnly));
            if year >= 1998 {
                days.push(nth(1, Weekday::Mon, 3, "Martin Luther King Jr. Day"));
            }
            days.push(nth(2, Weekday::Mon, 3, "Washington's Birthday"));
            days.push(
                easter_sunday(year)
                    .map(|easter| (easter - Duration::days(2), "Good Friday", Observance::None)),
            );
            days.push(
                last_weekday_of_month(year, 5, Weekday::Mon)
                    .map(|d| (d, "Memorial Day", Observance::None)),
            );
            if year >= 2022 {
                days.push(fixed(
                    6,
                    19,
                    "Juneteenth National Independence Day",
                    Observance::Both,
                ));
            }
            days.push(fixed(7, 4, "Independence Day", Observance::Both));
            days.push(nth(9, Weekday::Mon, 1, "Labor Day"));
            days.push(nth(11, Weekday::Thu, 4, "Thanksgiving"));
            days.push(fixed(12, 25, "Christmas Day", Observance::Both));
        }
    }

    days.into_iter().flatten().collect()
}

fn observed_date(date: NaiveDate, observance: Observance) -> Option<NaiveDate> {
    match (date.weekday(), observance) {
        (Weekday::Sat, Observance::Both) => date.pred_opt(),
        (Weekday::Sun, Observance::Both | Observance::SundayOnly) => date.succ_opt(),
        _ => None,
    }
}

/// 해당 월의 마지막 특정 요일.
fn last_weekday_of_month(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = first_of_next.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    Some(last - Duration::days(i64::from(back)))
}

/// 그레고리력 부활절 (익명 그레고리력 알고리즘).
fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32)
}
