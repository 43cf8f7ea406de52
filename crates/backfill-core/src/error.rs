//! 백필 코어의 에러 타입.

use thiserror::Error;

/// 코어 구성 요소 에러.
///
/// 페이싱 게이트와 캘린더는 조회 시점에 실패하지 않습니다.
/// 에러는 잘못된 설정으로 객체를 만들 때만 발생합니다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 요청 속도가 0 이하이거나 유한하지 않음
    #[error("잘못된 요청 속도: {0} (0보다 큰 유한값이어야 합니다)")]
    InvalidRate(f64),

    /// 캘린더 연도 범위 오류
    #[error("잘못된 연도 범위: {start}..={end}")]
    InvalidYearRange { start: i32, end: i32 },

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),
}

/// 코어 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// 설정 단계에서 발생한 에러인지 확인합니다.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidRate(_) | CoreError::InvalidYearRange { .. } | CoreError::Config(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_config() {
        assert!(CoreError::InvalidRate(0.0).is_config());
        assert!(CoreError::InvalidYearRange { start: 2030, end: 2020 }.is_config());
        assert!(CoreError::Config("calendar.start_year".to_string()).is_config());
    }

    #[test]
    fn test_error_display() {
        let err = CoreError::InvalidYearRange { start: 2030, end: 2020 };
        assert_eq!(err.to_string(), "잘못된 연도 범위: 2030..=2020");
    }
}
