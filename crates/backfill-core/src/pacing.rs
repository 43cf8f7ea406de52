//! 외부 API 요청 간격 제어.
//!
//! 업스트림 시세 API의 엄격한 요청 한도를 지키기 위해 모든 요청 사이에
//! 최소 간격을 강제합니다. 버스트를 허용하는 토큰 버킷과 달리 한가했던
//! 구간의 여유분을 누적하지 않습니다.
//!
//! # 사용 예
//!
//! ```rust,ignore
//! let gate = Arc::new(PacingGate::from_requests_per_minute(150)?);
//!
//! // 요청 전 대기
//! gate.acquire().await;
//!
//! // 또는 호출 자체를 감싸기 (결과/에러는 그대로 전달)
//! let candles = gate.call(|| source.fetch_session("AAPL", date)).await?;
//! ```

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::{CoreError, CoreResult};

/// 무료 요금제 기본 한도 (분당 150회).
pub const DEFAULT_REQUESTS_PER_MINUTE: u32 = 150;

/// 페이싱 설정.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// 초당 최대 요청 수
    pub requests_per_second: f64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            requests_per_second: f64::from(DEFAULT_REQUESTS_PER_MINUTE) / 60.0,
        }
    }
}

impl PacingConfig {
    /// 분당 요청 수로 설정을 생성합니다.
    pub fn per_minute(requests_per_minute: u32) -> Self {
        Self {
            requests_per_second: f64::from(requests_per_minute) / 60.0,
        }
    }

    /// 요청 간 최소 간격 (`1 / requests_per_second`).
    pub fn min_interval(&self) -> CoreResult<Duration> {
        interval_for_rate(self.requests_per_second)
    }
}

fn interval_for_rate(requests_per_second: f64) -> CoreResult<Duration> {
    if !requests_per_second.is_finite() || requests_per_second <= 0.0 {
        return Err(CoreError::InvalidRate(requests_per_second));
    }
    Ok(Duration::from_secs_f64(1.0 / requests_per_second))
}

/// 게이트 누적 통계.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PacingStats {
    /// 총 획득 횟수
    pub acquisitions: u64,
    /// 대기가 필요했던 획득 횟수
    pub delayed: u64,
    /// 누적 대기 시간
    #[serde(skip)]
    pub total_wait: Duration,
}

#[derive(Debug)]
struct GateState {
    min_interval: Duration,
    /// 마지막으로 예약된 요청 시작 시각 (`None` = 아직 요청 없음)
    last_request: Option<Instant>,
    stats: PacingStats,
}

/// 요청 간 최소 간격을 강제하는 게이트.
///
/// 여러 태스크가 동시에 `acquire()`를 호출해도 각 요청의 시작 시각은
/// 최소 `min_interval`만큼 떨어집니다. 뮤텍스는 시작 시각을 예약하는
/// 동안에만 잡고, 실제 대기는 잠금 밖에서 수행합니다.
///
/// 프로세스 전역 상태 대신 `Arc<PacingGate>`로 필요한 곳에 주입합니다.
#[derive(Debug)]
pub struct PacingGate {
    state: Mutex<GateState>,
}

impl Default for PacingGate {
    fn default() -> Self {
        Self::new(Duration::from_secs_f64(
            60.0 / f64::from(DEFAULT_REQUESTS_PER_MINUTE),
        ))
    }
}

impl PacingGate {
    /// 최소 간격으로 게이트를 생성합니다.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            state: Mutex::new(GateState {
                min_interval,
                last_request: None,
                stats: PacingStats::default(),
            }),
        }
    }

    /// 초당 요청 수로 게이트를 생성합니다.
    pub fn from_rate(requests_per_second: f64) -> CoreResult<Self> {
        Ok(Self::new(interval_for_rate(requests_per_second)?))
    }

    /// 분당 요청 수로 게이트를 생성합니다.
    pub fn from_requests_per_minute(requests_per_minute: u32) -> CoreResult<Self> {
        Self::from_config(&PacingConfig::per_minute(requests_per_minute))
    }

    /// 설정에서 게이트를 생성합니다.
    pub fn from_config(config: &PacingConfig) -> CoreResult<Self> {
        Ok(Self::new(config.min_interval()?))
    }

    /// 다음 요청을 보내도 안전할 때까지 대기합니다.
    ///
    /// 경과 시간 확인과 타임스탬프 갱신은 하나의 임계 구역에서 수행되며,
    /// 이 메서드는 실패하지 않습니다.
    pub async fn acquire(&self) {
        let (start_at, wait) = {
            let mut state = self.state.lock().await;
            let now = Instant::now();
            let start_at = match state.last_request {
                Some(last) => (last + state.min_interval).max(now),
                None => now,
            };
            let wait = start_at.saturating_duration_since(now);

            state.last_request = Some(start_at);
            state.stats.acquisitions += 1;
            if !wait.is_zero() {
                state.stats.delayed += 1;
                state.stats.total_wait += wait;
            }
            (start_at, wait)
        };

        if !wait.is_zero() {
            tracing::debug!(wait_ms = wait.as_millis() as u64, "요청 간격 대기");
            tokio::time::sleep_until(start_at).await;
        }
    }

    /// 게이트를 통과한 뒤 작업을 실행합니다.
    ///
    /// 작업의 결과(에러 포함)를 그대로 반환하며 재시도하지 않습니다.
    pub async fn call<F, Fut, T>(&self, operation: F) -> T
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.acquire().await;
        operation().await
    }

    /// 요청 속도를 변경합니다.
    ///
    /// 이미 시작 시각을 예약한 대기자는 기존 예약을 유지하고,
    /// 이후 획득부터 새 간격이 적용됩니다.
    pub async fn set_rate(&self, requests_per_second: f64) -> CoreResult<()> {
        let min_interval = interval_for_rate(requests_per_second)?;
        let mut state = self.state.lock().await;
        tracing::info!(
            previous_ms = state.min_interval.as_millis() as u64,
            new_ms = min_interval.as_millis() as u64,
            "요청 간격 변경"
        );
        state.min_interval = min_interval;
        Ok(())
    }

    /// 마지막 요청 기록을 지웁니다. 다음 획득은 즉시 통과합니다.
    pub async fn reset(&self) {
        self.state.lock().await.last_request = None;
    }

    /// 현재 최소 간격.
    pub async fn min_interval(&self) -> Duration {
        self.state.lock().await.min_interval
    }

    /// 누적 통계 스냅샷.
    pub async fn stats(&self) -> PacingStats {
        self.state.lock().await.stats
    }
}
