//! `plan` 명령.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use backfill_collector::{CollectorConfig, CsvExportSink, SessionPlanner};
use backfill_core::TradingCalendar;
use clap::Args;

use super::{parse_symbols, resolve_range};

#[derive(Args)]
pub struct PlanArgs {
    /// 심볼 목록 (쉼표로 구분, 예: "AAPL,MSFT")
    #[arg(short, long)]
    symbols: String,

    /// 시작 날짜 (YYYY-MM-DD, 기본: 종료일 - lookback_days)
    #[arg(short = 'f', long)]
    from: Option<String>,

    /// 종료 날짜 (YYYY-MM-DD, 기본: 오늘)
    #[arg(short, long)]
    to: Option<String>,

    /// 내보내기 디렉토리 (기본: 설정의 backfill.export_dir)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// 누락 세션 날짜를 모두 출력
    #[arg(long, default_value = "false")]
    list: bool,
}

pub async fn run(config: &CollectorConfig, calendar: Arc<TradingCalendar>, args: PlanArgs) -> Result<ExitCode> {
    let symbols = parse_symbols(&args.symbols);
    if symbols.is_empty() {
        anyhow::bail!("No symbols given");
    }

    let (from, to) = resolve_range(
        args.from.as_deref(),
        args.to.as_deref(),
        config.backfill.lookback_days,
        TradingCalendar::market_today(),
    )?;

    let dir = args.dir.unwrap_or_else(|| config.backfill.export_dir.clone());
    let sink = Arc::new(CsvExportSink::new(dir, config.validation.file_suffix.clone()));
    let planner = SessionPlanner::new(Arc::clone(&calendar), sink)
        .with_max_sessions(config.backfill.max_sessions_per_symbol);

    let open_days = calendar.count_open_days(from, to);
    println!("{} ~ {}: 거래일 {}일", from, to, open_days);

    for symbol in &symbols {
        let missing = planner.plan(symbol, from, to).await?;
        match (missing.first(), missing.last()) {
            (Some(first), Some(last)) => {
                println!("{:<10} 누락 {:>5}일  ({} ~ {})", symbol, missing.len(), first, last);
                if args.list {
                    for day in &missing {
                        println!("    {}", day);
                    }
                }
            }
            _ => println!("{:<10} 누락 없음", symbol),
        }
    }

    Ok(ExitCode::SUCCESS)
}
