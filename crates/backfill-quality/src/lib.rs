//! 내보낸 캔들 데이터셋 품질 검증.
//!
//! 분석/학습용으로 배포하기 전에 `*_clean.csv` 파일을 검사합니다:
//! - 레코드 수 충분 여부 (`sufficient_records`)
//! - 비정상적으로 긴 시간 공백 (`no_extreme_gaps`)
//! - 결측값 (`no_nulls`)
//! - 봉 사이 가격 급변 (`price_continuity`)
//!
//! 각 검사는 서로 독립적이며, 검사 실패는 에러가 아닌 정상적인 음성 결과입니다.
//! 파일 읽기/파싱 실패만 해당 파일에 국한된 에러 결과로 기록됩니다.

pub mod checks;
pub mod error;
pub mod record;
pub mod report;
pub mod requirements;
pub mod result;
pub mod validator;

pub use checks::SeriesMetrics;
pub use error::{QualityError, Result};
pub use record::CandleRow;
pub use report::QualityReport;
pub use requirements::ValidationRequirements;
pub use result::{CheckName, FailureKind, FileFailure, ValidationResult};
pub use validator::DatasetValidator;
