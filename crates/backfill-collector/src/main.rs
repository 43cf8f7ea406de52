//! 캔들 백필 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # 내보낸 데이터셋 검증 (모든 파일 통과 시 종료 코드 0)
//! backfill validate --dir data/export --json-out reports/quality.json
//!
//! # 거래일 확인
//! backfill calendar check 2024-07-04
//! backfill calendar next 2024-12-24
//! backfill calendar --closure 2025-01-09="National Day of Mourning" range 2025-01-06 2025-01-10
//!
//! # 누락 세션 계획
//! backfill plan -s AAPL,MSFT -f 2024-01-01 -t 2024-12-31
//! ```

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use backfill_collector::CollectorConfig;
use backfill_core::{init_logging, TradingCalendar};
use clap::{Parser, Subcommand};

mod commands;

use commands::calendar::CalendarArgs;
use commands::plan::PlanArgs;
use commands::validate::ValidateArgs;

#[derive(Parser)]
#[command(name = "backfill")]
#[command(about = "Candle backfill tools - 거래일 계산, 누락 세션 계획, 데이터셋 품질 검증", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// 설정 파일 (TOML, 기본: config/backfill.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 로그 레벨 (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// 로그 형식 (pretty, json, compact)
    #[arg(long, global = true)]
    log_format: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// 내보낸 `*_clean.csv` 데이터셋 품질 검증
    Validate(ValidateArgs),

    /// 트레이딩 캘린더 조회
    Calendar(CalendarArgs),

    /// 심볼별 누락 세션 계획 (조회는 하지 않음)
    Plan(PlanArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // 설정 로드
    let config = CollectorConfig::load(cli.config.as_deref()).context("설정 로드 실패")?;

    // 로깅 초기화 (CLI 인자가 설정 파일보다 우선)
    let mut log_config = config.logging.to_log_config()?;
    if let Some(level) = cli.log_level {
        log_config.filter = level;
    }
    if let Some(format) = cli.log_format {
        log_config.format = format.parse().map_err(anyhow::Error::msg)?;
    }
    init_logging(log_config).map_err(|e| anyhow::anyhow!("로깅 초기화 실패: {}", e))?;

    let calendar = Arc::new(TradingCalendar::new(&config.calendar).context("캘린더 생성 실패")?);

    match cli.command {
        Commands::Validate(args) => commands::validate::run(&config, calendar, args),
        Commands::Calendar(args) => commands::calendar::run(&calendar, args),
        Commands::Plan(args) => commands::plan::run(&config, calendar, args).await,
    }
}
