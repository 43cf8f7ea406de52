//! 백필 작업 모듈.

pub mod backfill;
pub mod export;
pub mod source;

pub use backfill::{Backfiller, SessionPlanner};
pub use export::{CandleSink, CsvExportSink};
pub use source::CandleSource;
