//! 내보낸 CSV 레코드 파싱.
//!
//! 내보내기 도구마다 헤더 이름과 타임스탬프 형식이 조금씩 다르므로
//! 컬럼은 이름(별칭 포함, 대소문자 무시)으로 찾고, 타임스탬프는 여러 형식을
//! 순서대로 시도합니다. 인덱스 컬럼처럼 알 수 없는 컬럼은 무시합니다.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use backfill_core::Candle;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;

use crate::error::{QualityError, Result};

const TIMESTAMP_ALIASES: [&str; 4] = ["timestamp", "date", "datetime", "time"];
/// 결측 토큰 (소문자 비교). pandas 기본 NA 값을 포함합니다.
const NULL_TOKENS: [&str; 15] = [
    "", "nan", "null", "none", "na", "n/a", "nat", "#n/a", "#n/a n/a", "#na", "<na>",
    "-1.#ind", "1.#ind", "-1.#qnan", "1.#qnan",
];

/// 이 값 이상의 정수 타임스탬프는 밀리초로 해석합니다.
const EPOCH_MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// 파싱된 레코드 한 줄. 결측 셀은 `None`입니다.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandleRow {
    pub timestamp: DateTime<Utc>,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

impl CandleRow {
    /// 결측 셀 개수.
    pub fn null_count(&self) -> usize {
        [self.open, self.high, self.low, self.close, self.volume]
            .iter()
            .filter(|v| v.is_none())
            .count()
    }
}

impl From<&Candle> for CandleRow {
    fn from(candle: &Candle) -> Self {
        Self {
            timestamp: candle.timestamp,
            open: Some(candle.open),
            high: Some(candle.high),
            low: Some(candle.low),
            close: Some(candle.close),
            volume: Some(candle.volume),
        }
    }
}

/// 컬럼 위치.
#[derive(Debug, Clone, Copy)]
struct Columns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl Columns {
    fn locate(headers: &csv::StringRecord, path: &Path) -> Result<Self> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim().trim_start_matches('\u{feff}').to_lowercase())
            .collect();

        let find = |candidates: &[&str]| -> Result<usize> {
            candidates
                .iter()
                .find_map(|c| names.iter().position(|n| n == c))
                .ok_or_else(|| {
                    QualityError::parse(path, Some(1), format!("missing column '{}'", candidates[0]))
                })
        };

        Ok(Self {
            timestamp: find(&TIMESTAMP_ALIASES)?,
            open: find(&["open"])?,
            high: find(&["high"])?,
            low: find(&["low"])?,
            close: find(&["close"])?,
            volume: find(&["volume"])?,
        })
    }
}

/// 파일을 읽어 레코드 목록을 반환합니다 (정렬하지 않음).
pub fn read_rows(path: &Path) -> Result<Vec<CandleRow>> {
    let mut file = fs::File::open(path).map_err(|source| QualityError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let mut content = String::new();
    file.read_to_string(&mut content).map_err(|source| {
        if source.kind() == io::ErrorKind::InvalidData {
            QualityError::parse(path, None, "file is not valid UTF-8")
        } else {
            QualityError::FileRead {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    parse_rows(&content, path)
}

/// CSV 텍스트를 파싱합니다. `path`는 에러 메시지에만 사용됩니다.
pub fn parse_rows(content: &str, path: &Path) -> Result<Vec<CandleRow>> {
    let header_line = content.lines().next().unwrap_or_default();
    if header_line.trim().is_empty() {
        return Err(QualityError::parse(path, Some(1), "missing header row"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(detect_delimiter(header_line))
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| csv_error(path, &e))?
        .clone();
    let columns = Columns::locate(&headers, path)?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| csv_error(path, &e))?;
        let line = record.position().map(|p| p.line());

        // 완전히 빈 줄은 건너뜀
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        let raw_ts = record.get(columns.timestamp).unwrap_or_default();
        let timestamp = parse_timestamp(raw_ts).ok_or_else(|| {
            QualityError::parse(path, line, format!("invalid timestamp '{}'", raw_ts))
        })?;

        let cell = |index: usize| -> Result<Option<f64>> {
            parse_cell(record.get(index).unwrap_or_default())
                .map_err(|message| QualityError::parse(path, line, message))
        };

        rows.push(CandleRow {
            timestamp,
            open: cell(columns.open)?,
            high: cell(columns.high)?,
            low: cell(columns.low)?,
            close: cell(columns.close)?,
            volume: cell(columns.volume)?,
        });
    }

    Ok(rows)
}

fn csv_error(path: &Path, err: &csv::Error) -> QualityError {
    QualityError::parse(path, err.position().map(|p| p.line()), err.to_string())
}

/// 헤더 줄에서 구분자를 추정합니다. 기본값은 쉼표입니다.
fn detect_delimiter(header_line: &str) -> u8 {
    if header_line.contains(',') {
        b','
    } else if header_line.contains('\t') {
        b'\t'
    } else if header_line.contains(';') {
        b';'
    } else {
        b','
    }
}

/// 숫자 셀을 파싱합니다. 결측 토큰과 NaN(`-nan` 등 부호 포함)은 `Ok(None)`입니다.
pub fn parse_cell(raw: &str) -> std::result::Result<Option<f64>, String> {
    let value = raw.trim();
    if NULL_TOKENS.contains(&value.to_lowercase().as_str()) {
        return Ok(None);
    }
    value
        .parse::<f64>()
        .map(|v| (!v.is_nan()).then_some(v))
        .map_err(|_| format!("invalid number '{}'", value))
}

/// 지원하는 형식 중 하나로 타임스탬프를 파싱해 UTC로 변환합니다.
///
/// 시간대가 없는 값은 UTC로 간주합니다.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.bytes().all(|b| b.is_ascii_digit()) {
        if value.len() == 8 {
            return NaiveDate::parse_from_str(value, "%Y%m%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc());
        }
        let epoch: i64 = value.parse().ok()?;
        return if epoch >= EPOCH_MILLIS_THRESHOLD {
            DateTime::from_timestamp_millis(epoch)
        } else {
            DateTime::from_timestamp(epoch, 0)
        };
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f%:z",
        "%Y-%m-%d %H:%M:%S%.f%z",
        "%Y-%m-%dT%H:%M:%S%.f%z",
    ] {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in [
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
    ] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }

    for format in ["%Y-%m-%d", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_timestamp_formats() {
        let expected = utc(2024, 3, 1, 14, 30);
        assert_eq!(parse_timestamp("2024-03-01T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 14:30:00+00:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 09:30:00-05:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01T14:30:00.000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01 14:30"), Some(expected));
        assert_eq!(parse_timestamp("1709303400"), Some(expected));
        assert_eq!(parse_timestamp("1709303400000"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-01"), Some(utc(2024, 3, 1, 0, 0)));
        assert_eq!(parse_timestamp("20240301"), Some(utc(2024, 3, 1, 0, 0)));
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_null_tokens() {
        for token in ["", "NaN", "null", "None", "NA", " nan "] {
            assert_eq!(parse_cell(token), Ok(None), "{:?}", token);
        }
        assert_eq!(parse_cell("101.5"), Ok(Some(101.5)));
        assert!(parse_cell("abc").is_err());
    }

    #[test]
    fn test_signed_nan_and_pandas_tokens_are_missing() {
        for token in ["-nan", "+NaN", "-NaN", "#N/A", "<NA>", "-1.#IND", "1.#QNAN", "#NA"] {
            assert_eq!(parse_cell(token), Ok(None), "{:?}", token);
        }

        let content = "\
timestamp,open,high,low,close,volume
2024-03-01 14:00:00,10,11,9,-nan,1000
2024-03-01 15:00:00,10,11,9,#N/A,1000
";
        let rows = parse_rows(content, Path::new("X_clean.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.close.is_none() && r.null_count() == 1));
    }

    #[test]
    fn test_parse_rows_with_aliases_and_index_column() {
        let content = "\
,Date,Open,High,Low,Close,Volume
0,2024-03-01 14:00:00,10,11,9,10.5,1000
1,2024-03-01 15:00:00,10.5,12,10,11,
";
        let rows = parse_rows(content, Path::new("X_clean.csv")).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp, utc(2024, 3, 1, 14, 0));
        assert_eq!(rows[0].close, Some(10.5));
        assert_eq!(rows[1].volume, None);
        assert_eq!(rows[1].null_count(), 1);
    }

    #[test]
    fn test_semicolon_delimiter() {
        let content = "timestamp;open;high;low;close;volume\n2024-03-01;1;2;0.5;1.5;10\n";
        let rows = parse_rows(content, Path::new("X_clean.csv")).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].high, Some(2.0));
    }

    #[test]
    fn test_missing_column_is_parse_error() {
        let content = "timestamp,open,high,low,volume\n2024-03-01,1,2,0.5,10\n";
        let err = parse_rows(content, Path::new("X_clean.csv")).unwrap_err();
        assert!(err.to_string().contains("missing column 'close'"));
    }

    #[test]
    fn test_bad_value_reports_line() {
        let content = "timestamp,open,high,low,close,volume\n\
2024-03-01,1,2,0.5,1.5,10\n\
2024-03-02,1,abc,0.5,1.5,10\n";
        let err = parse_rows(content, Path::new("X_clean.csv")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parse error (X_clean.csv, line 3): invalid number 'abc'"
        );
    }

    #[test]
    fn test_empty_file_is_parse_error() {
        assert!(parse_rows("", Path::new("X_clean.csv")).is_err());
    }
}
