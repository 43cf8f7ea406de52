//! 데이터셋 검증기.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use backfill_core::TradingCalendar;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::checks;
use crate::record::{self, CandleRow};
use crate::requirements::ValidationRequirements;
use crate::result::ValidationResult;

/// 내보낸 파일의 품질을 판정하는 검증기.
///
/// 파일 간 공유되는 가변 상태가 없으므로 여러 파일을 병렬로 검증합니다.
/// 캘린더를 주입하면 날짜 커버리지 지표도 계산합니다.
#[derive(Debug, Clone, Default)]
pub struct DatasetValidator {
    requirements: ValidationRequirements,
    calendar: Option<Arc<TradingCalendar>>,
}

impl DatasetValidator {
    pub fn new(requirements: ValidationRequirements) -> Self {
        Self {
            requirements,
            calendar: None,
        }
    }

    /// 날짜 커버리지 계산에 사용할 캘린더를 설정합니다.
    pub fn with_calendar(mut self, calendar: Arc<TradingCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    pub fn requirements(&self) -> &ValidationRequirements {
        &self.requirements
    }

    /// 파일 하나를 검증합니다.
    ///
    /// 읽기/파싱 실패는 에러 결과로 반환되며 검사는 수행하지 않습니다.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> ValidationResult {
        let path = path.as_ref();
        let file = file_label(path);

        match record::read_rows(path) {
            Ok(rows) => self.validate_rows(file, rows),
            Err(e) => {
                warn!(file = %file, error = %e, "파일 검증 실패");
                ValidationResult::errored(file, &e)
            }
        }
    }

    /// 이미 파싱된 레코드를 검증합니다. 레코드는 타임스탬프 순으로 정렬됩니다.
    pub fn validate_rows(&self, file: impl Into<String>, mut rows: Vec<CandleRow>) -> ValidationResult {
        let file = file.into();
        rows.sort_by_key(|r| r.timestamp);

        let (checks, metrics) =
            checks::evaluate(&rows, &self.requirements, self.calendar.as_deref());

        if let Some(coverage) = metrics.date_coverage {
            if coverage < self.requirements.min_date_coverage {
                warn!(
                    file = %file,
                    coverage = format!("{:.1}%", coverage * 100.0),
                    required = format!("{:.1}%", self.requirements.min_date_coverage * 100.0),
                    "날짜 커버리지 부족"
                );
            }
        }

        let result = ValidationResult::checked(file, rows.len(), checks, metrics);
        if result.passed {
            debug!(file = %result.file, records = result.records, "검증 통과");
        } else {
            let failed: Vec<_> = result.failed_checks().iter().map(|c| c.as_str()).collect();
            warn!(
                file = %result.file,
                records = result.records,
                failed = ?failed,
                "검증 실패"
            );
        }
        result
    }

    /// 디렉토리에서 검증 대상 파일을 찾습니다 (파일명 순).
    ///
    /// 디렉토리가 없거나 읽을 수 없으면 경고 후 빈 목록을 반환합니다.
    pub fn export_files(&self, dir: impl AsRef<Path>) -> Vec<PathBuf> {
        let dir = dir.as_ref();
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                warn!(dir = %dir.display(), "내보내기 디렉토리가 없습니다");
                return Vec::new();
            }
            Err(e) => {
                warn!(dir = %dir.display(), error = %e, "내보내기 디렉토리를 읽을 수 없습니다");
                return Vec::new();
            }
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file())
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| self.requirements.matches_file_name(n))
            })
            .collect();
        files.sort();
        files
    }

    /// 디렉토리의 모든 `*<suffix>` 파일을 병렬로 검증합니다.
    ///
    /// 결과는 파일명 순서의 맵이며, 대상 파일이 없으면 경고 후 빈 맵을 반환합니다.
    pub fn validate_all(&self, dir: impl AsRef<Path>) -> BTreeMap<String, ValidationResult> {
        let dir = dir.as_ref();
        let files = self.export_files(dir);

        if files.is_empty() {
            warn!(
                dir = %dir.display(),
                pattern = %format!("*{}", self.requirements.file_suffix),
                "검증할 파일이 없습니다"
            );
            return BTreeMap::new();
        }

        info!(dir = %dir.display(), files = files.len(), "데이터셋 검증 시작");

        let results: BTreeMap<String, ValidationResult> = files
            .par_iter()
            .map(|path| (file_label(path), self.validate_file(path)))
            .collect();

        let passed = results.values().filter(|r| r.passed).count();
        info!(passed = passed, total = results.len(), "데이터셋 검증 완료");

        results
    }
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
