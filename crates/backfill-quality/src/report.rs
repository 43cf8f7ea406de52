//! 검증 결과 보고서.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::result::ValidationResult;

const RULE_WIDTH: usize = 78;

/// 전체 검증 실행의 보고서.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    /// 생성 시각
    pub generated_at: DateTime<Utc>,
    /// 통과 파일 수
    pub passed: usize,
    /// 전체 파일 수
    pub total: usize,
    /// 파일명 순 결과
    pub results: Vec<ValidationResult>,
}

impl QualityReport {
    /// 결과 맵에서 보고서를 생성합니다.
    pub fn from_results(results: BTreeMap<String, ValidationResult>) -> Self {
        let results: Vec<_> = results.into_values().collect();
        Self {
            generated_at: Utc::now(),
            passed: results.iter().filter(|r| r.passed).count(),
            total: results.len(),
            results,
        }
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// 모든 파일이 통과했는지 여부. 파일이 없으면 `true`.
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }

    /// 실패한 파일명.
    pub fn failed_files(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter(|r| !r.passed)
            .map(|r| r.file.as_str())
            .collect()
    }

    /// 사람이 읽는 텍스트 요약.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let rule = "-".repeat(RULE_WIDTH);

        let _ = writeln!(out, "Dataset quality report ({} files)", self.total);
        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "{:<36} {:>9}  {:<6} DETAIL", "FILE", "RECORDS", "STATUS");

        for result in &self.results {
            let (status, detail) = match &result.error {
                Some(failure) => ("ERROR", format!("{}: {}", failure.kind, failure.message)),
                None if result.passed => ("PASS", String::new()),
                None => {
                    let failed: Vec<_> =
                        result.failed_checks().iter().map(|c| c.as_str()).collect();
                    ("FAIL", failed.join(", "))
                }
            };
            let records = if result.is_error() {
                "-".to_string()
            } else {
                result.records.to_string()
            };
            let _ = writeln!(
                out,
                "{:<36} {:>9}  {:<6} {}",
                result.file, records, status, detail
            );
        }

        let _ = writeln!(out, "{}", rule);
        let _ = writeln!(out, "Passed: {}/{}", self.passed, self.total);
        out
    }

    /// JSON 문자열.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// JSON 보고서를 파일로 저장합니다.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        tracing::info!(path = %path.display(), "검증 보고서 저장");
        Ok(())
    }

    /// 요약 로그 출력.
    pub fn log_summary(&self) {
        tracing::info!(
            passed = self.passed,
            total = self.total,
            failed = ?self.failed_files(),
            "품질 검증 요약"
        );
    }
}
