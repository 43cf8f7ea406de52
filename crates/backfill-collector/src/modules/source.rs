//! 업스트림 캔들 데이터 소스.

use async_trait::async_trait;
use backfill_core::Candle;
use chrono::NaiveDate;

use crate::Result;

/// 세션 단위로 캔들을 조회하는 데이터 소스.
///
/// 구현체는 요청 간격을 직접 관리하지 않습니다. 호출자가
/// [`PacingGate`](backfill_core::PacingGate)를 통과한 뒤에만 호출합니다.
#[async_trait]
pub trait CandleSource: Send + Sync {
    /// 소스 이름 (로그용).
    fn name(&self) -> &str;

    /// 한 거래 세션의 캔들을 조회합니다. 데이터가 없으면 빈 목록입니다.
    async fn fetch_session(&self, symbol: &str, session: NaiveDate) -> Result<Vec<Candle>>;
}
