//! 파일 단위 검증 결과.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::checks::SeriesMetrics;
use crate::error::QualityError;

/// 품질 검사 항목.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckName {
    /// 최소 레코드 수 충족
    SufficientRecords,
    /// 허용 범위를 넘는 시간 공백 없음
    NoExtremeGaps,
    /// 결측값 없음
    NoNulls,
    /// 가격 급변 횟수가 허용치 이하
    PriceContinuity,
}

impl CheckName {
    /// 모든 검사 항목.
    pub const ALL: [CheckName; 4] = [
        CheckName::SufficientRecords,
        CheckName::NoExtremeGaps,
        CheckName::NoNulls,
        CheckName::PriceContinuity,
    ];

    /// 보고서용 이름.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckName::SufficientRecords => "sufficient_records",
            CheckName::NoExtremeGaps => "no_extreme_gaps",
            CheckName::NoNulls => "no_nulls",
            CheckName::PriceContinuity => "price_continuity",
        }
    }
}

impl fmt::Display for CheckName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파일 단위 실패 종류.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureKind {
    /// 파일을 읽을 수 없음
    FileReadError,
    /// 파일 형식 오류
    ParseError,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::FileReadError => write!(f, "FileReadError"),
            FailureKind::ParseError => write!(f, "ParseError"),
        }
    }
}

/// 검사를 수행하지 못한 파일의 오류 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileFailure {
    pub kind: FailureKind,
    pub message: String,
}

/// 파일 하나에 대한 검증 결과. 생성 후 변경되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// 파일명
    pub file: String,
    /// 레코드 수 (오류 시 0)
    pub records: usize,
    /// 전체 통과 여부
    pub passed: bool,
    /// 검사 항목별 결과 (오류 시 비어 있음)
    pub checks: BTreeMap<CheckName, bool>,
    /// 시계열 지표
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<SeriesMetrics>,
    /// 읽기/파싱 오류
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FileFailure>,
}

impl ValidationResult {
    /// 검사를 마친 결과를 생성합니다.
    pub fn checked(
        file: impl Into<String>,
        records: usize,
        checks: BTreeMap<CheckName, bool>,
        metrics: SeriesMetrics,
    ) -> Self {
        let passed = !checks.is_empty() && checks.values().all(|ok| *ok);
        Self {
            file: file.into(),
            records,
            passed,
            checks,
            metrics: Some(metrics),
            error: None,
        }
    }

    /// 읽기/파싱 오류 결과를 생성합니다. 오류 결과는 항상 실패입니다.
    pub fn errored(file: impl Into<String>, error: &QualityError) -> Self {
        Self {
            file: file.into(),
            records: 0,
            passed: false,
            checks: BTreeMap::new(),
            metrics: None,
            error: Some(FileFailure {
                kind: error.kind().unwrap_or(FailureKind::FileReadError),
                message: error.to_string(),
            }),
        }
    }

    /// 오류로 검사를 수행하지 못했는지 여부.
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// 특정 검사 결과.
    pub fn check(&self, name: CheckName) -> Option<bool> {
        self.checks.get(&name).copied()
    }

    /// 실패한 검사 항목.
    pub fn failed_checks(&self) -> Vec<CheckName> {
        self.checks
            .iter()
            .filter(|(_, ok)| !**ok)
            .map(|(name, _)| *name)
            .collect()
    }
}
