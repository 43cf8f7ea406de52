//! # Backfill Core
//!
//! 캔들 백필 파이프라인의 핵심 구성 요소를 제공합니다.
//!
//! 이 크레이트는 수집기와 품질 검증기가 공통으로 사용하는 타입을 제공합니다:
//! - 외부 API 요청 간격을 강제하는 페이싱 게이트
//! - 거래일/휴장일 판단을 위한 트레이딩 캘린더
//! - OHLCV 캔들 타입
//! - 에러 타입
//! - 로깅 인프라

pub mod calendar;
pub mod error;
pub mod logging;
pub mod pacing;
pub mod types;

pub use calendar::{CalendarConfig, HolidayRules, TradingCalendar};
pub use error::*;
pub use logging::*;
pub use pacing::{PacingConfig, PacingGate, PacingStats};
pub use types::*;
