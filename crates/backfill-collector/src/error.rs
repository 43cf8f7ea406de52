//! 에러 타입 정의.

use std::fmt;

use backfill_core::CoreError;
use backfill_quality::QualityError;

/// Collector 에러 타입
#[derive(Debug)]
pub enum CollectorError {
    /// 설정 에러
    Config(String),
    /// 캘린더 에러 (연도 범위, 날짜 범위)
    Calendar(String),
    /// 데이터 소스 에러 (업스트림 API)
    Source(String),
    /// 저장소 에러 (CSV 내보내기 등)
    Sink(String),
    /// I/O 에러
    Io(std::io::Error),
    /// 일반 에러
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for CollectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Configuration error: {}", msg),
            Self::Calendar(msg) => write!(f, "Calendar error: {}", msg),
            Self::Source(msg) => write!(f, "Data source error: {}", msg),
            Self::Sink(msg) => write!(f, "Sink error: {}", msg),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for CollectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Other(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

impl From<CoreError> for CollectorError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidYearRange { .. } => Self::Calendar(err.to_string()),
            _ => Self::Config(err.to_string()),
        }
    }
}

impl From<config::ConfigError> for CollectorError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<QualityError> for CollectorError {
    fn from(err: QualityError) -> Self {
        Self::Sink(err.to_string())
    }
}

impl From<csv::Error> for CollectorError {
    fn from(err: csv::Error) -> Self {
        Self::Sink(err.to_string())
    }
}

impl From<std::io::Error> for CollectorError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for CollectorError {
    fn from(err: Box<dyn std::error::Error + Send + Sync>) -> Self {
        Self::Other(err)
    }
}

/// Result 타입 별칭
pub type Result<T> = std::result::Result<T, CollectorError>;
