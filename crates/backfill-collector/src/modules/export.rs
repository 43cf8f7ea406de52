//! 캔들 저장소와 CSV 내보내기.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use backfill_core::Candle;
use backfill_quality::record::{self, CandleRow};
use chrono::NaiveDate;

use crate::Result;

/// 조회한 캔들을 저장하는 대상.
#[async_trait]
pub trait CandleSink: Send + Sync {
    /// 이미 저장된 세션 날짜 목록.
    async fn existing_sessions(&self, symbol: &str) -> Result<BTreeSet<NaiveDate>>;

    /// 캔들을 저장하고 저장된 개수를 반환합니다.
    async fn store(&self, symbol: &str, candles: &[Candle]) -> Result<usize>;
}

/// 심볼별 `<SYMBOL><suffix>` CSV 파일로 저장하는 저장소.
///
/// 파일 형식은 `timestamp,open,high,low,close,volume`이며
/// 데이터셋 검증기가 그대로 읽을 수 있습니다. 같은 타임스탬프는 새 값으로 덮어씁니다.
#[derive(Debug, Clone)]
pub struct CsvExportSink {
    dir: PathBuf,
    suffix: String,
}

impl CsvExportSink {
    pub fn new(dir: impl Into<PathBuf>, suffix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            suffix: suffix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// 심볼의 내보내기 파일 경로.
    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir
            .join(format!("{}{}", symbol.trim().to_uppercase(), self.suffix))
    }

    fn read_existing(&self, path: &Path) -> Result<Vec<CandleRow>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        Ok(record::read_rows(path)?)
    }
}

#[async_trait]
impl CandleSink for CsvExportSink {
    async fn existing_sessions(&self, symbol: &str) -> Result<BTreeSet<NaiveDate>> {
        let rows = self.read_existing(&self.path_for(symbol))?;
        Ok(rows.iter().map(|r| r.timestamp.date_naive()).collect())
    }

    async fn store(&self, symbol: &str, candles: &[Candle]) -> Result<usize> {
        if candles.is_empty() {
            return Ok(0);
        }

        let path = self.path_for(symbol);
        let mut merged: BTreeMap<_, CandleRow> = self
            .read_existing(&path)?
            .into_iter()
            .map(|row| (row.timestamp, row))
            .collect();
        for candle in candles {
            merged.insert(candle.timestamp, CandleRow::from(candle));
        }

        std::fs::create_dir_all(&self.dir)?;
        let tmp_path = tmp_path_for(&path);
        if let Err(e) = write_rows(&tmp_path, merged.values()) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e);
        }
        // 완성된 임시 파일로 교체하므로 실패해도 기존 내보내기는 유지됩니다.
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        tracing::debug!(
            symbol = symbol,
            path = %path.display(),
            stored = candles.len(),
            rows = merged.len(),
            "CSV 저장 완료"
        );
        Ok(candles.len())
    }
}

/// `<file>.tmp` 형식의 임시 경로. 내보내기 접미사와 겹치지 않습니다.
fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

fn write_rows<'a>(path: &Path, rows: impl Iterator<Item = &'a CandleRow>) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
