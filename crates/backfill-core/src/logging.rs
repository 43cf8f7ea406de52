//! tracing 기반 로깅 초기화.
//!
//! CLI는 보고서와 조회 결과를 stdout으로 출력하므로 로그는 항상 stderr로 보냅니다.
//! 배치 실행에서는 `compact`, 로그 수집기로 보낼 때는 `json` 형식을 사용합니다.

use std::fmt;
use std::str::FromStr;

use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
    Registry,
};

type FilteredRegistry = tracing_subscriber::layer::Layered<EnvFilter, Registry>;

/// 로그 출력 형식.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 여러 줄 형식 (로컬 디버깅)
    Pretty,
    /// 줄 단위 JSON
    Json,
    /// 한 줄 형식
    #[default]
    Compact,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Pretty => write!(f, "pretty"),
            LogFormat::Json => write!(f, "json"),
            LogFormat::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            "compact" | "text" => Ok(LogFormat::Compact),
            other => Err(format!("Unknown log format: {} (pretty, json, compact)", other)),
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 지시문 (예: "info", "backfill_quality=debug,info")
    pub filter: String,
    pub format: LogFormat,
    /// 심볼 span의 시작/종료 이벤트 출력
    pub span_events: bool,
    /// 스레드 이름 출력 (병렬 검증 시 유용)
    pub thread_names: bool,
    /// 소스 파일 위치 출력
    pub source_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::new("info")
    }
}

impl LogConfig {
    pub fn new(filter: impl Into<String>) -> Self {
        Self {
            filter: filter.into(),
            format: LogFormat::default(),
            span_events: false,
            thread_names: false,
            source_location: false,
        }
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_span_events(mut self, enabled: bool) -> Self {
        self.span_events = enabled;
        self
    }

    pub fn with_thread_names(mut self, enabled: bool) -> Self {
        self.thread_names = enabled;
        self
    }

    /// `RUST_LOG`가 있으면 설정의 필터 대신 사용합니다.
    fn env_filter(&self) -> Result<EnvFilter, tracing_subscriber::filter::ParseError> {
        match EnvFilter::try_from_default_env() {
            Ok(filter) => Ok(filter),
            Err(_) => EnvFilter::try_new(&self.filter),
        }
    }

    fn layer(&self) -> Box<dyn Layer<FilteredRegistry> + Send + Sync + 'static> {
        let span_events = if self.span_events {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        let layer = tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_span_events(span_events)
            .with_thread_names(self.thread_names)
            .with_file(self.source_location)
            .with_line_number(self.source_location);

        match self.format {
            LogFormat::Pretty => layer.pretty().boxed(),
            LogFormat::Json => layer.json().with_current_span(true).boxed(),
            LogFormat::Compact => layer.compact().boxed(),
        }
    }
}

/// 전역 subscriber를 설치합니다. 프로세스당 한 번만 성공합니다.
///
/// ```no_run
/// use backfill_core::{init_logging, LogConfig, LogFormat};
///
/// init_logging(LogConfig::new("backfill_collector=debug,info").with_format(LogFormat::Json))
///     .expect("logging");
/// ```
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(config.layer())
        .try_init()?;

    tracing::debug!(filter = %config.filter, format = %config.format, "로깅 초기화");
    Ok(())
}

/// 심볼(및 세션) 단위 작업 span.
///
/// ```ignore
/// let span = backfill_span!("backfill", symbol);
/// let span = backfill_span!("fetch", symbol, session);
/// ```
#[macro_export]
macro_rules! backfill_span {
    ($name:expr, $symbol:expr) => {
        tracing::info_span!($name, symbol = %$symbol)
    };
    ($name:expr, $symbol:expr, $session:expr) => {
        tracing::info_span!($name, symbol = %$symbol, session = %$session)
    };
}
