//! 백필 드라이버 통합 테스트.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use backfill_collector::{
    Backfiller, BackfillConfig, CandleSink, CandleSource, CollectorError, CsvExportSink, Result,
};
use backfill_core::{Candle, PacingGate, TradingCalendar};
use backfill_quality::DatasetValidator;
use chrono::NaiveDate;
use tokio::time::Instant;

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn session_candles(session: NaiveDate) -> Vec<Candle> {
    (14..21)
        .map(|hour| {
            Candle::new(
                session.and_hms_opt(hour, 30, 0).unwrap().and_utc(),
                100.0,
                101.0,
                99.0,
                100.5,
                1000.0,
            )
        })
        .collect()
}

#[derive(Default)]
struct MockSource {
    calls: Mutex<Vec<(String, NaiveDate, Instant)>>,
    failing: HashSet<(String, NaiveDate)>,
    empty: HashSet<(String, NaiveDate)>,
}

impl MockSource {
    fn calls(&self) -> Vec<(String, NaiveDate, Instant)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl CandleSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_session(&self, symbol: &str, session: NaiveDate) -> Result<Vec<Candle>> {
        self.calls
            .lock()
            .unwrap()
            .push((symbol.to_string(), session, Instant::now()));

        let key = (symbol.to_string(), session);
        if self.failing.contains(&key) {
            return Err(CollectorError::Source("HTTP 500".to_string()));
        }
        if self.empty.contains(&key) {
            return Ok(Vec::new());
        }
        Ok(session_candles(session))
    }
}

#[derive(Default)]
struct MemorySink {
    stored: Mutex<BTreeMap<String, Vec<Candle>>>,
    broken: HashSet<String>,
}

impl MemorySink {
    fn preload(&self, symbol: &str, session: NaiveDate) {
        self.stored
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .extend(session_candles(session));
    }

    fn sessions(&self, symbol: &str) -> BTreeSet<NaiveDate> {
        self.stored
            .lock()
            .unwrap()
            .get(symbol)
            .map(|candles| candles.iter().map(Candle::session_date).collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CandleSink for MemorySink {
    async fn existing_sessions(&self, symbol: &str) -> Result<BTreeSet<NaiveDate>> {
        if self.broken.contains(symbol) {
            return Err(CollectorError::Sink("storage offline".to_string()));
        }
        Ok(self.sessions(symbol))
    }

    async fn store(&self, symbol: &str, candles: &[Candle]) -> Result<usize> {
        self.stored
            .lock()
            .unwrap()
            .entry(symbol.to_string())
            .or_default()
            .extend_from_slice(candles);
        Ok(candles.len())
    }
}

fn symbols(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

#[tokio::test(start_paused = true)]
async fn test_run_fetches_only_missing_sessions_with_pacing() {
    let source = Arc::new(MockSource {
        failing: [("MSFT".to_string(), ymd(2024, 3, 6))].into_iter().collect(),
        empty: [("AAPL".to_string(), ymd(2024, 3, 8))].into_iter().collect(),
        ..Default::default()
    });
    let sink = Arc::new(MemorySink::default());
    sink.preload("AAPL", ymd(2024, 3, 5));

    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::default()),
        source.clone(),
        sink.clone(),
    )
    .with_concurrency(2);

    let stats = backfiller
        .run(&symbols(&["AAPL", "MSFT"]), ymd(2024, 3, 4), ymd(2024, 3, 8))
        .await
        .unwrap();

    assert_eq!(stats.symbols, 2);
    assert_eq!(stats.total, 9);
    assert_eq!(stats.skipped, 1);
    assert_eq!(stats.success, 7);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.empty, 1);
    assert_eq!(stats.total_candles, 49);

    let calls = source.calls();
    assert_eq!(calls.len(), 9);
    assert!(!calls
        .iter()
        .any(|(symbol, session, _)| symbol == "AAPL" && *session == ymd(2024, 3, 5)));

    let mut starts: Vec<Instant> = calls.iter().map(|(_, _, at)| *at).collect();
    starts.sort();
    for pair in starts.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(400));
    }

    // 실패/빈 세션은 저장되지 않음
    assert!(!sink.sessions("MSFT").contains(&ymd(2024, 3, 6)));
    assert!(!sink.sessions("AAPL").contains(&ymd(2024, 3, 8)));
    assert_eq!(sink.sessions("MSFT").len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_has_nothing_to_fetch() {
    let source = Arc::new(MockSource::default());
    let sink = Arc::new(MemorySink::default());
    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::from_rate(10.0).unwrap()),
        source.clone(),
        sink,
    );

    let first = backfiller
        .run(&symbols(&["SPY"]), ymd(2024, 7, 1), ymd(2024, 7, 12))
        .await
        .unwrap();
    assert_eq!(first.success, 9);

    let second = backfiller
        .run(&symbols(&["SPY"]), ymd(2024, 7, 1), ymd(2024, 7, 12))
        .await
        .unwrap();
    assert_eq!(second.total, 0);
    assert_eq!(second.skipped, 9);
    assert_eq!(source.calls().len(), 9);
}

#[tokio::test]
async fn test_plan_skips_closed_and_stored_days() {
    let sink = Arc::new(MemorySink::default());
    sink.preload("QQQ", ymd(2024, 7, 2));

    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::default()),
        Arc::new(MockSource::default()),
        sink,
    );

    let plan = backfiller.plan("QQQ", ymd(2024, 7, 1), ymd(2024, 7, 12)).await.unwrap();
    assert_eq!(
        plan,
        vec![
            ymd(2024, 7, 1),
            ymd(2024, 7, 3),
            ymd(2024, 7, 5),
            ymd(2024, 7, 8),
            ymd(2024, 7, 9),
            ymd(2024, 7, 10),
            ymd(2024, 7, 11),
            ymd(2024, 7, 12),
        ]
    );
}

#[tokio::test]
async fn test_plan_respects_session_limit() {
    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::default()),
        Arc::new(MockSource::default()),
        Arc::new(MemorySink::default()),
    )
    .with_config(&BackfillConfig {
        max_sessions_per_symbol: 3,
        ..Default::default()
    });

    let plan = backfiller.plan("QQQ", ymd(2024, 7, 1), ymd(2024, 7, 12)).await.unwrap();
    assert_eq!(plan, vec![ymd(2024, 7, 1), ymd(2024, 7, 2), ymd(2024, 7, 3)]);
}

#[tokio::test]
async fn test_reversed_range_is_rejected() {
    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::default()),
        Arc::new(MockSource::default()),
        Arc::new(MemorySink::default()),
    );

    let result = backfiller
        .run(&symbols(&["SPY"]), ymd(2024, 7, 12), ymd(2024, 7, 1))
        .await;
    assert!(matches!(result, Err(CollectorError::Calendar(_))));
}

#[tokio::test(start_paused = true)]
async fn test_sink_failure_is_isolated_to_symbol() {
    let sink = Arc::new(MemorySink {
        broken: ["BROKEN".to_string()].into_iter().collect(),
        ..Default::default()
    });
    let source = Arc::new(MockSource::default());
    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::from_rate(10.0).unwrap()),
        source.clone(),
        sink.clone(),
    );

    let stats = backfiller
        .run(&symbols(&["BROKEN", "IWM"]), ymd(2024, 3, 4), ymd(2024, 3, 8))
        .await
        .unwrap();

    assert_eq!(stats.symbols, 2);
    assert_eq!(stats.errors, 1);
    assert_eq!(stats.success, 5);
    assert!(source.calls().iter().all(|(symbol, _, _)| symbol == "IWM"));
}

#[tokio::test(start_paused = true)]
async fn test_exported_series_passes_quality_gate() {
    let dir = tempfile::tempdir().unwrap();
    let backfiller = Backfiller::new(
        Arc::new(TradingCalendar::default()),
        Arc::new(PacingGate::from_rate(20.0).unwrap()),
        Arc::new(MockSource::default()),
        Arc::new(CsvExportSink::new(dir.path(), "_clean.csv")),
    );

    let stats = backfiller
        .run(&symbols(&["AAPL"]), ymd(2024, 3, 1), ymd(2024, 3, 31))
        .await
        .unwrap();
    assert_eq!(stats.success, 21);
    assert_eq!(stats.total_candles, 147);

    let results = DatasetValidator::default().validate_all(dir.path());
    let result = &results["AAPL_clean.csv"];
    assert!(result.passed, "{:?}", result.failed_checks());
    assert_eq!(result.records, 147);
}
