//! Reporting and artifact export pipeline.

pub mod artifacts;
pub mod summary;

pub use artifacts::{
    write_equity_csv, write_metrics_json, write_result_json, write_run_artifacts, write_trades_csv,
};
pub use summary::render_summary;
