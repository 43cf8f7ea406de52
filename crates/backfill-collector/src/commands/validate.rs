//! `validate` 명령.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use backfill_collector::CollectorConfig;
use backfill_core::TradingCalendar;
use backfill_quality::{DatasetValidator, QualityReport};
use clap::Args;
use tracing::{info, warn};

#[derive(Args)]
pub struct ValidateArgs {
    /// 검증할 디렉토리 (기본: 설정의 backfill.export_dir)
    #[arg(short, long)]
    dir: Option<PathBuf>,

    /// JSON 보고서 저장 경로
    #[arg(long)]
    json_out: Option<PathBuf>,

    /// 검증 대상 파일이 없으면 실패로 처리
    #[arg(long, default_value = "false")]
    require_files: bool,

    /// 최소 레코드 수 (설정값 덮어쓰기)
    #[arg(long)]
    min_records: Option<usize>,
}

pub fn run(config: &CollectorConfig, calendar: Arc<TradingCalendar>, args: ValidateArgs) -> Result<ExitCode> {
    let mut requirements = config.validation.clone();
    if let Some(min_records) = args.min_records {
        requirements.min_records = min_records;
    }

    let dir = args.dir.unwrap_or_else(|| config.backfill.export_dir.clone());
    let validator = DatasetValidator::new(requirements).with_calendar(calendar);

    let report = QualityReport::from_results(validator.validate_all(&dir));
    print!("{}", report.render_text());
    report.log_summary();

    if let Some(path) = &args.json_out {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write report: {}", path.display()))?;
        println!("보고서 저장 위치: {}", path.display());
    }

    if report.total() == 0 && args.require_files {
        warn!(dir = %dir.display(), "검증 대상 파일이 없어 실패로 처리합니다");
        return Ok(ExitCode::FAILURE);
    }

    if report.all_passed() {
        info!("모든 데이터셋이 검증을 통과했습니다");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
