//! 페이싱 게이트 통합 테스트
//!
//! tokio 가상 시간(`start_paused`)을 사용해 요청 시작 간격을 결정적으로 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use backfill_core::PacingGate;
use tokio::time::Instant;

#[tokio::test(start_paused = true)]
async fn test_rapid_acquisitions_respect_interval_for_several_rates() {
    for rate in [0.5_f64, 1.0, 2.5, 8.0, 20.0] {
        let gate = PacingGate::from_rate(rate).unwrap();
        let min_gap = gate.min_interval().await;

        let mut starts = Vec::new();
        for _ in 0..12 {
            gate.acquire().await;
            starts.push(Instant::now());
        }

        for (i, pair) in starts.windows(2).enumerate() {
            assert!(
                pair[1] - pair[0] >= min_gap,
                "rate {} acquisition {} gap {:?} < {:?}",
                rate,
                i,
                pair[1] - pair[0],
                min_gap
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn test_shared_gate_paces_calls_from_many_tasks() {
    let gate = Arc::new(PacingGate::from_requests_per_minute(150).unwrap());
    let origin = Instant::now();

    let mut handles = Vec::new();
    for task in 0..5u32 {
        let gate = Arc::clone(&gate);
        handles.push(tokio::spawn(async move {
            let mut starts = Vec::new();
            for _ in 0..4 {
                let start = gate
                    .call(|| async { Ok::<_, std::io::Error>(Instant::now()) })
                    .await
                    .unwrap();
                starts.push(start);
            }
            (task, starts)
        }));
    }

    let mut all = Vec::new();
    for handle in handles {
        let (_, starts) = handle.await.unwrap();
        all.extend(starts);
    }
    all.sort();

    assert_eq!(all.len(), 20);
    for pair in all.windows(2) {
        assert!(pair[1] - pair[0] >= Duration::from_millis(400));
    }
    // 20회 요청 = 첫 요청 + 19 * 400ms
    assert_eq!(*all.last().unwrap() - origin, Duration::from_millis(400 * 19));

    let stats = gate.stats().await;
    assert_eq!(stats.acquisitions, 20);
}

#[tokio::test(start_paused = true)]
async fn test_failing_operation_still_consumes_slot() {
    let gate = PacingGate::from_rate(2.0).unwrap();

    let first: Result<(), &str> = gate.call(|| async { Err("boom") }).await;
    assert_eq!(first, Err("boom"));

    let before = Instant::now();
    gate.acquire().await;
    assert_eq!(Instant::now() - before, Duration::from_millis(500));
}
