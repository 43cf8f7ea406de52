//! 품질 검증 모듈 오류 타입.

use std::path::PathBuf;

use thiserror::Error;

use crate::result::FailureKind;

/// 품질 검증 관련 오류.
#[derive(Debug, Error)]
pub enum QualityError {
    /// 파일을 열거나 읽을 수 없음
    #[error("File read error ({}): {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 파일 형식 오류
    #[error(
        "Parse error ({}{}): {message}",
        path.display(),
        line.map(|l| format!(", line {}", l)).unwrap_or_default()
    )]
    Parse {
        path: PathBuf,
        line: Option<u64>,
        message: String,
    },

    /// 보고서 출력 등 일반 I/O 오류
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// 직렬화 오류
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QualityError {
    pub(crate) fn parse(
        path: impl Into<PathBuf>,
        line: Option<u64>,
        message: impl Into<String>,
    ) -> Self {
        QualityError::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// 파일 단위 결과에 기록할 실패 종류.
    ///
    /// 파일 검증과 무관한 오류는 `None`입니다.
    pub fn kind(&self) -> Option<FailureKind> {
        match self {
            QualityError::FileRead { .. } => Some(FailureKind::FileReadError),
            QualityError::Parse { .. } => Some(FailureKind::ParseError),
            QualityError::Io(_) | QualityError::Serialization(_) => None,
        }
    }
}

impl From<serde_json::Error> for QualityError {
    fn from(err: serde_json::Error) -> Self {
        QualityError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, QualityError>;
