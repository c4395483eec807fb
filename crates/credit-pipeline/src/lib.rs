//! # credit-pipeline: running the scoring stages and writing reports.
//!
//! - [`config`]: layered [`PipelineConfig`] (defaults, file, `CREDIT__*` env).
//! - [`loader`]: reads the input JSON array.
//! - [`pipeline`]: [`run_pipeline`] composes normalize → aggregate → target →
//!   score and returns every intermediate.
//! - [`report`]: score CSV, feature CSV and the SVG score histogram.

pub mod config;
pub mod loader;
pub mod pipeline;
pub mod report;

pub use config::{ModelConfig, OutputConfig, PipelineConfig};
pub use loader::{load_records, records_from_str};
pub use pipeline::{run_file, run_pipeline, PipelineOutput, RunSummary};
pub use report::{
    write_features_csv, write_histogram_svg, write_reports, write_scores_csv, ScoreHistogram,
};
