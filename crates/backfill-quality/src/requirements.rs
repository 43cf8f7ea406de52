//! 검증 임계값 설정.

use backfill_core::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};

/// 한 번의 검증 실행에서 모든 파일에 공통으로 적용되는 임계값.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationRequirements {
    /// 최소 레코드 수
    pub min_records: usize,
    /// 연속 레코드 사이 허용 최대 공백 (시간). 주말/연휴를 오탐하지 않도록 120시간
    pub max_gap_hours: f64,
    /// 최소 날짜 커버리지 비율 (보고용, 통과 여부에는 영향 없음)
    pub min_date_coverage: f64,
    /// 허용 최대 가격 급변 비율 (전 봉 종가 대비 시가)
    pub max_price_jump: f64,
    /// 허용되는 급변 횟수 (갭/기업 이벤트 대비)
    pub max_price_jumps: usize,
    /// 검증 대상 파일 접미사
    pub file_suffix: String,
}

impl Default for ValidationRequirements {
    fn default() -> Self {
        Self {
            min_records: 100,
            max_gap_hours: 120.0,
            min_date_coverage: 0.8,
            max_price_jump: 0.20,
            max_price_jumps: 2,
            file_suffix: "_clean.csv".to_string(),
        }
    }
}

impl ValidationRequirements {
    /// 임계값 범위를 검증합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if !self.max_gap_hours.is_finite() || self.max_gap_hours <= 0.0 {
            return Err(CoreError::Config(format!(
                "max_gap_hours must be positive, got {}",
                self.max_gap_hours
            )));
        }
        if !self.max_price_jump.is_finite() || self.max_price_jump <= 0.0 {
            return Err(CoreError::Config(format!(
                "max_price_jump must be positive, got {}",
                self.max_price_jump
            )));
        }
        if !(0.0..=1.0).contains(&self.min_date_coverage) {
            return Err(CoreError::Config(format!(
                "min_date_coverage must be within [0, 1], got {}",
                self.min_date_coverage
            )));
        }
        if self.file_suffix.trim().is_empty() {
            return Err(CoreError::Config("file_suffix must not be empty".to_string()));
        }
        Ok(())
    }

    /// 파일명이 검증 대상 규칙(`*<suffix>`)에 맞는지 확인합니다.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        file_name
            .to_lowercase()
            .ends_with(&self.file_suffix.to_lowercase())
    }
}
