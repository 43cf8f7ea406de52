//! 설정 모듈.
//!
//! 기본값 → TOML 파일(선택) → 환경 변수 순으로 덮어씁니다.
//! 환경 변수는 `BACKFILL_` 접두사와 `__` 구분자를 사용합니다
//! (예: `BACKFILL_PACING__REQUESTS_PER_SECOND=1.5`).

use std::path::{Path, PathBuf};

use backfill_core::{CalendarConfig, LogConfig, LogFormat, PacingConfig};
use backfill_quality::ValidationRequirements;
use serde::{Deserialize, Serialize};

use crate::error::CollectorError;
use crate::Result;

/// 설정 파일을 지정하지 않았을 때 찾는 기본 경로 (없어도 됨).
const DEFAULT_CONFIG_FILE: &str = "config/backfill";

/// Collector 전체 설정
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// 요청 간격 설정
    pub pacing: PacingConfig,
    /// 트레이딩 캘린더 설정
    pub calendar: CalendarConfig,
    /// 데이터셋 검증 임계값
    pub validation: ValidationRequirements,
    /// 백필 작업 설정
    pub backfill: BackfillConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 백필 작업 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackfillConfig {
    /// 내보내기 디렉토리
    pub export_dir: PathBuf,
    /// 시작일을 지정하지 않았을 때 오늘로부터 거슬러 올라갈 일수
    pub lookback_days: i64,
    /// 한 번 실행에서 심볼당 최대 조회 세션 수 (0 = 무제한)
    pub max_sessions_per_symbol: usize,
    /// 동시에 처리할 심볼 수 (요청 간격은 모든 심볼이 공유)
    pub concurrency: usize,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            export_dir: PathBuf::from("data/export"),
            lookback_days: 365,
            max_sessions_per_symbol: 0,
            concurrency: 4,
        }
    }
}

/// 로깅 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 출력 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl LoggingConfig {
    /// `backfill_core` 로그 설정으로 변환합니다.
    pub fn to_log_config(&self) -> Result<LogConfig> {
        let format: LogFormat = self.format.parse().map_err(CollectorError::Config)?;
        Ok(LogConfig::new(self.level.clone()).with_format(format))
    }
}

impl CollectorConfig {
    /// 설정을 로드합니다.
    ///
    /// `path`가 주어지면 해당 파일이 반드시 있어야 하고, 없으면
    /// `config/backfill.toml`을 선택적으로 읽습니다.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();

        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let config: Self = config::Config::builder()
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("BACKFILL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        tracing::debug!(?config, "설정 로드 완료");
        Ok(config)
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<()> {
        self.pacing.min_interval()?;
        self.calendar.validate()?;
        self.validation.validate()?;

        if self.backfill.concurrency == 0 {
            return Err(CollectorError::Config(
                "backfill.concurrency는 1 이상이어야 합니다".to_string(),
            ));
        }
        if self.backfill.lookback_days <= 0 {
            return Err(CollectorError::Config(
                "backfill.lookback_days는 1 이상이어야 합니다".to_string(),
            ));
        }
        self.logging.to_log_config()?;
        Ok(())
    }
}
