//! `calendar` 명령.

use std::process::ExitCode;

use anyhow::{Context, Result};
use backfill_core::calendar::is_weekend;
use backfill_core::TradingCalendar;
use chrono::{Datelike, NaiveDate};
use clap::{Args, Subcommand};

use super::parse_date;

#[derive(Args)]
pub struct CalendarArgs {
    /// 이번 실행에만 적용할 임시 휴장일 (반복 가능)
    #[arg(long = "closure", value_name = "YYYY-MM-DD=REASON")]
    closures: Vec<String>,

    #[command(subcommand)]
    command: CalendarCommand,
}

#[derive(Subcommand)]
pub enum CalendarCommand {
    /// 날짜가 거래일인지 확인 (기본: 오늘, 휴장일이면 종료 코드 1)
    Check {
        /// 날짜 (YYYY-MM-DD)
        date: Option<String>,
    },

    /// 다음 거래일 (기본: 오늘 이후)
    Next {
        /// 기준 날짜 (YYYY-MM-DD)
        date: Option<String>,
    },

    /// 이전 거래일 (기본: 오늘 이전)
    Prev {
        /// 기준 날짜 (YYYY-MM-DD)
        date: Option<String>,
    },

    /// 구간의 거래일 목록
    Range {
        /// 시작 날짜 (YYYY-MM-DD)
        from: String,
        /// 종료 날짜 (YYYY-MM-DD, 포함)
        to: String,
        /// 개수만 출력
        #[arg(long, default_value = "false")]
        count: bool,
    },

    /// 연도별 휴장일 목록 (기본: 올해)
    Holidays {
        /// 연도
        year: Option<i32>,
    },
}

pub fn run(calendar: &TradingCalendar, args: CalendarArgs) -> Result<ExitCode> {
    for raw in &args.closures {
        let (date, reason) = parse_closure(raw)?;
        calendar.register_closure(date, reason);
    }

    match args.command {
        CalendarCommand::Check { date } => {
            let (line, open) = check_day(calendar, date.as_deref())?;
            println!("{}", line);
            if !open {
                return Ok(ExitCode::FAILURE);
            }
        }
        CalendarCommand::Next { date } => {
            let date = date_or_today(date.as_deref())?;
            let next = calendar
                .next_open_day(date)
                .context("No open day after the given date")?;
            println!("{}", next);
        }
        CalendarCommand::Prev { date } => {
            let date = date_or_today(date.as_deref())?;
            let prev = calendar
                .previous_open_day(date)
                .context("No open day before the given date")?;
            println!("{}", prev);
        }
        CalendarCommand::Range { from, to, count } => {
            let (from, to) = (parse_date(&from)?, parse_date(&to)?);
            if count {
                println!("{}", calendar.count_open_days(from, to));
            } else {
                for day in calendar.open_days_in_range(from, to) {
                    println!("{}", day);
                }
            }
        }
        CalendarCommand::Holidays { year } => {
            let year = year.unwrap_or_else(|| TradingCalendar::market_today().year());
            if !calendar.covers_year(year) {
                let (start, end) = calendar.year_range();
                tracing::warn!(year, start, end, "휴장일이 생성되지 않은 연도입니다");
            }
            for (date, name) in calendar.holidays_in_year(year) {
                println!("{}  {:<3}  {}", date, date.weekday(), name);
            }
            for (date, reason) in calendar.custom_closures() {
                if date.year() == year {
                    println!("{}  {:<3}  {} (custom)", date, date.weekday(), reason);
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// 날짜(없으면 오늘)의 설명과 거래일 여부.
fn check_day(calendar: &TradingCalendar, date: Option<&str>) -> Result<(String, bool)> {
    match date {
        Some(s) => {
            let date = parse_date(s)?;
            Ok((describe_day(calendar, date), calendar.is_open(date)))
        }
        None => Ok((
            describe_day(calendar, TradingCalendar::market_today()),
            calendar.is_open_today(),
        )),
    }
}

fn date_or_today(date: Option<&str>) -> Result<NaiveDate> {
    match date {
        Some(s) => parse_date(s),
        None => Ok(TradingCalendar::market_today()),
    }
}

/// `YYYY-MM-DD=REASON` 형식의 임시 휴장일 파싱.
fn parse_closure(raw: &str) -> Result<(NaiveDate, String)> {
    let (date, reason) = raw
        .split_once('=')
        .with_context(|| format!("Invalid closure: {}. Expected YYYY-MM-DD=REASON", raw))?;
    let reason = reason.trim();
    let reason = if reason.is_empty() { "Custom closure" } else { reason };
    Ok((parse_date(date)?, reason.to_string()))
}

/// 한 날짜의 거래일 여부를 사람이 읽는 한 줄로 표현합니다.
fn describe_day(calendar: &TradingCalendar, date: NaiveDate) -> String {
    if calendar.is_open(date) {
        return format!("{} ({}): open", date, date.weekday());
    }

    let reason = calendar.holiday_name(date).unwrap_or_else(|| {
        if is_weekend(date) {
            "weekend".to_string()
        } else {
            "closed".to_string()
        }
    });
    format!("{} ({}): closed - {}", date, date.weekday(), reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_describe_day() {
        let calendar = TradingCalendar::default();
        assert_eq!(describe_day(&calendar, ymd(2024, 3, 13)), "2024-03-13 (Wed): open");
        assert_eq!(
            describe_day(&calendar, ymd(2024, 7, 4)),
            "2024-07-04 (Thu): closed - Independence Day"
        );
        assert_eq!(
            describe_day(&calendar, ymd(2024, 6, 1)),
            "2024-06-01 (Sat): closed - weekend"
        );
    }

    #[test]
    fn test_check_day_with_date() {
        let calendar = TradingCalendar::default();
        let (line, open) = check_day(&calendar, Some("2024-07-04")).unwrap();
        assert!(!open);
        assert!(line.ends_with("Independence Day"));

        assert!(check_day(&calendar, Some("2024-03-13")).unwrap().1);
        assert!(check_day(&calendar, Some("July 4")).is_err());
    }

    #[test]
    fn test_check_day_defaults_to_today() {
        let calendar = TradingCalendar::default();
        let today = TradingCalendar::market_today();
        calendar.register_closure(today, "Maintenance");

        let (line, open) = check_day(&calendar, None).unwrap();
        assert!(!open);
        assert!(line.starts_with(&today.to_string()));
    }

    #[test]
    fn test_parse_closure() {
        let (date, reason) = parse_closure("2025-01-09=National Day of Mourning").unwrap();
        assert_eq!(date, ymd(2025, 1, 9));
        assert_eq!(reason, "National Day of Mourning");

        let (_, reason) = parse_closure("2025-01-09=").unwrap();
        assert_eq!(reason, "Custom closure");

        assert!(parse_closure("2025-01-09").is_err());
        assert!(parse_closure("tomorrow=storm").is_err());
    }
}
