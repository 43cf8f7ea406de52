//! Calendar-driven candle backfill for the backfill pipeline.
//!
//! 이 crate는 업스트림 API에서 누락된 거래 세션을 채우는 드라이버와
//! 운영용 CLI(`backfill`)를 제공합니다:
//! - 거래일 기준 누락 세션 계획 (`SessionPlanner`)
//! - 요청 간격을 지키는 세션 단위 백필 (`Backfiller`)
//! - 검증기가 읽는 `*_clean.csv` 형식 내보내기 (`CsvExportSink`)

pub mod config;
pub mod error;
pub mod modules;
pub mod stats;

pub use config::{BackfillConfig, CollectorConfig, LoggingConfig};
pub use error::{CollectorError, Result};
pub use modules::{Backfiller, CandleSink, CandleSource, CsvExportSink, SessionPlanner};
pub use stats::CollectionStats;
