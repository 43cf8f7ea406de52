//! 캘린더 기반 캔들 백필.
//!
//! 요청 범위의 거래일 중 저장소에 없는 세션만 조회합니다. 모든 조회는
//! 하나의 [`PacingGate`]를 통과하므로 심볼을 동시에 처리해도 업스트림
//! 요청 한도를 넘지 않습니다.

use std::sync::Arc;
use std::time::Instant;

use backfill_core::{backfill_span, PacingGate, TradingCalendar};
use chrono::NaiveDate;
use futures::stream::{self, StreamExt};
use tracing::Instrument;

use crate::config::BackfillConfig;
use crate::error::CollectorError;
use crate::modules::{CandleSink, CandleSource};
use crate::{CollectionStats, Result};

/// 심볼별 누락 세션 계획.
pub struct SessionPlanner {
    calendar: Arc<TradingCalendar>,
    sink: Arc<dyn CandleSink>,
    max_sessions: usize,
}

impl SessionPlanner {
    pub fn new(calendar: Arc<TradingCalendar>, sink: Arc<dyn CandleSink>) -> Self {
        Self {
            calendar,
            sink,
            max_sessions: 0,
        }
    }

    /// 심볼당 최대 세션 수를 설정합니다 (0 = 무제한).
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    /// `[from, to]` 구간에서 아직 저장되지 않은 거래일 (오름차순).
    pub async fn plan(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
        Ok(self.plan_detailed(symbol, from, to).await?.missing)
    }

    async fn plan_detailed(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Plan> {
        validate_range(from, to)?;

        let existing = self.sink.existing_sessions(symbol).await?;
        let open_days = self.calendar.open_days_in_range(from, to);
        let open_count = open_days.len();

        let mut missing: Vec<NaiveDate> = open_days
            .into_iter()
            .filter(|day| !existing.contains(day))
            .collect();
        let covered = open_count - missing.len();

        if self.max_sessions > 0 && missing.len() > self.max_sessions {
            tracing::info!(
                symbol = symbol,
                missing = missing.len(),
                limit = self.max_sessions,
                "세션 수 제한 적용 (나머지는 다음 실행에서 처리)"
            );
            missing.truncate(self.max_sessions);
        }

        Ok(Plan { missing, covered })
    }
}

struct Plan {
    missing: Vec<NaiveDate>,
    covered: usize,
}

/// 누락 세션을 조회해 저장하는 백필 드라이버.
pub struct Backfiller {
    planner: SessionPlanner,
    source: Arc<dyn CandleSource>,
    sink: Arc<dyn CandleSink>,
    gate: Arc<PacingGate>,
    concurrency: usize,
}

impl Backfiller {
    pub fn new(
        calendar: Arc<TradingCalendar>,
        gate: Arc<PacingGate>,
        source: Arc<dyn CandleSource>,
        sink: Arc<dyn CandleSink>,
    ) -> Self {
        Self {
            planner: SessionPlanner::new(calendar, Arc::clone(&sink)),
            source,
            sink,
            gate,
            concurrency: 1,
        }
    }

    /// 설정의 세션 제한과 동시성을 적용합니다.
    pub fn with_config(mut self, config: &BackfillConfig) -> Self {
        self.planner = self.planner.with_max_sessions(config.max_sessions_per_symbol);
        self.concurrency = config.concurrency.max(1);
        self
    }

    /// 동시에 처리할 심볼 수.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn planner(&self) -> &SessionPlanner {
        &self.planner
    }

    /// `[from, to]` 구간에서 아직 저장되지 않은 거래일.
    pub async fn plan(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> Result<Vec<NaiveDate>> {
        self.planner.plan(symbol, from, to).await
    }

    /// 여러 심볼을 백필합니다.
    ///
    /// 세션 단위 조회/저장 실패는 통계에만 기록되고 다음 세션으로 진행합니다.
    /// 잘못된 날짜 범위만 에러로 반환합니다.
    pub async fn run(&self, symbols: &[String], from: NaiveDate, to: NaiveDate) -> Result<CollectionStats> {
        validate_range(from, to)?;
        let start = Instant::now();

        tracing::info!(
            source = self.source.name(),
            symbols = symbols.len(),
            from = %from,
            to = %to,
            concurrency = self.concurrency,
            "백필 시작"
        );

        let per_symbol: Vec<CollectionStats> = stream::iter(symbols)
            .map(move |symbol| {
                let span = backfill_span!("backfill", symbol);
                self.backfill_symbol(symbol, from, to).instrument(span)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut stats = CollectionStats::new();
        for part in &per_symbol {
            stats.merge(part);
        }
        stats.elapsed = start.elapsed();
        Ok(stats)
    }

    async fn backfill_symbol(&self, symbol: &str, from: NaiveDate, to: NaiveDate) -> CollectionStats {
        let mut stats = CollectionStats {
            symbols: 1,
            ..Default::default()
        };

        let plan = match self.planner.plan_detailed(symbol, from, to).await {
            Ok(plan) => plan,
            Err(e) => {
                stats.errors += 1;
                tracing::error!(error = %e, "저장된 세션 조회 실패");
                return stats;
            }
        };
        stats.skipped = plan.covered;

        if plan.missing.is_empty() {
            tracing::debug!("누락 세션 없음");
            return stats;
        }
        tracing::info!(missing = plan.missing.len(), covered = plan.covered, "누락 세션 조회 시작");

        for session in plan.missing {
            stats.total += 1;

            let fetched = self
                .gate
                .call(|| self.source.fetch_session(symbol, session))
                .await;

            match fetched {
                Ok(candles) if candles.is_empty() => {
                    stats.empty += 1;
                    tracing::debug!(session = %session, "데이터 없음");
                }
                Ok(candles) => {
                    let inconsistent = candles.iter().filter(|c| !c.is_consistent()).count();
                    if inconsistent > 0 {
                        tracing::warn!(session = %session, inconsistent, "고가/저가 범위가 맞지 않는 캔들");
                    }

                    match self.sink.store(symbol, &candles).await {
                        Ok(stored) => {
                            stats.success += 1;
                            stats.total_candles += stored;
                            tracing::debug!(session = %session, candles = stored, "세션 저장 완료");
                        }
                        Err(e) => {
                            stats.errors += 1;
                            tracing::error!(session = %session, error = %e, "저장 실패");
                        }
                    }
                }
                Err(e) => {
                    stats.errors += 1;
                    tracing::warn!(session = %session, error = %e, "조회 실패");
                }
            }
        }

        stats
    }
}

fn validate_range(from: NaiveDate, to: NaiveDate) -> Result<()> {
    if from > to {
        return Err(CollectorError::Calendar(format!(
            "시작일({})이 종료일({})보다 늦습니다",
            from, to
        )));
    }
    Ok(())
}
