//! Report writers: score CSV, feature CSV and the score histogram.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use credit_core::constants::{
    FIELD_USER_WALLET, HISTOGRAM_BUCKETS, HISTOGRAM_BUCKET_WIDTH, SCORE_MAX,
};
use credit_core::error::{CreditError, CreditResult};
use credit_core::types::{ScoredWallet, WalletFeatureVector, FEATURE_NAMES};

use crate::config::OutputConfig;
use crate::pipeline::PipelineOutput;

/// Header of the scores CSV.
pub const SCORES_HEADER: [&str; 2] = [FIELD_USER_WALLET, "credit_score"];

/// Title of the histogram chart.
pub const HISTOGRAM_TITLE: &str = "Credit Score Distribution";

fn csv_err(e: csv::Error) -> CreditError {
    CreditError::Csv(e.to_string())
}

fn csv_writer(path: &Path) -> CreditResult<csv::Writer<fs::File>> {
    csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(csv_err)
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

/// Write `userWallet,credit_score`, one row per wallet.
///
/// The header is written even when there are no wallets.
pub fn write_scores_csv(path: &Path, scores: &[ScoredWallet]) -> CreditResult<()> {
    let mut wtr = csv_writer(path)?;
    wtr.write_record(SCORES_HEADER).map_err(csv_err)?;
    for s in scores {
        wtr.serialize(s).map_err(csv_err)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), wallets = scores.len(), "report: scores written");
    Ok(())
}

/// Write the full feature table, `userWallet` then the 16 features.
pub fn write_features_csv(path: &Path, rows: &[WalletFeatureVector]) -> CreditResult<()> {
    let mut wtr = csv_writer(path)?;
    let header = std::iter::once(FIELD_USER_WALLET).chain(FEATURE_NAMES);
    wtr.write_record(header).map_err(csv_err)?;
    for row in rows {
        let values = row.to_array();
        let record = std::iter::once(row.wallet.clone()).chain(values.iter().map(f64::to_string));
        wtr.write_record(record).map_err(csv_err)?;
    }
    wtr.flush()?;
    info!(path = %path.display(), wallets = rows.len(), "report: features written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Score counts in fixed buckets of width 100 over `[0, 1000]`.
///
/// Buckets are half-open except the last, which also takes 1000.
///
/// ```
/// use credit_pipeline::report::ScoreHistogram;
///
/// let h = ScoreHistogram::from_scores(&[0.0, 99.9, 100.0, 1000.0]);
/// assert_eq!(h.counts()[0], 2);
/// assert_eq!(h.counts()[1], 1);
/// assert_eq!(h.counts()[9], 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreHistogram {
    counts: [usize; HISTOGRAM_BUCKETS],
}

impl ScoreHistogram {
    /// Bucket finite scores. Values outside `[0, 1000]` go to the nearest
    /// edge bucket; NaN is skipped.
    pub fn from_scores(scores: &[f64]) -> Self {
        let mut counts = [0; HISTOGRAM_BUCKETS];
        for &s in scores {
            if s.is_nan() {
                continue;
            }
            let bucket = (s.clamp(0.0, SCORE_MAX) / HISTOGRAM_BUCKET_WIDTH) as usize;
            counts[bucket.min(HISTOGRAM_BUCKETS - 1)] += 1;
        }
        Self { counts }
    }

    pub fn from_wallets(scores: &[ScoredWallet]) -> Self {
        let values: Vec<f64> = scores.iter().map(|s| s.credit_score).collect();
        Self::from_scores(&values)
    }

    pub fn counts(&self) -> &[usize; HISTOGRAM_BUCKETS] {
        &self.counts
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }

    /// `(low, high)` score bounds of bucket `i`.
    pub fn bucket_range(i: usize) -> (f64, f64) {
        let lo = i as f64 * HISTOGRAM_BUCKET_WIDTH;
        (lo, lo + HISTOGRAM_BUCKET_WIDTH)
    }

    /// Log one line per bucket at `info`.
    pub fn log(&self) {
        for (i, &count) in self.counts.iter().enumerate() {
            let (from, to) = Self::bucket_range(i);
            info!(from, to, count, "report: score histogram");
        }
    }
}

const SVG_WIDTH: f64 = 640.0;
const SVG_HEIGHT: f64 = 400.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 20.0;
const MARGIN_TOP: f64 = 40.0;
const MARGIN_BOTTOM: f64 = 55.0;

/// Render the histogram as a standalone SVG bar chart.
pub fn render_histogram_svg(hist: &ScoreHistogram) -> String {
    let plot_w = SVG_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    let plot_h = SVG_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    let base_y = MARGIN_TOP + plot_h;
    let bar_w = plot_w / HISTOGRAM_BUCKETS as f64;
    let max = hist.counts.iter().copied().max().unwrap_or(0).max(1) as f64;

    let mut svg = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{SVG_WIDTH}" height="{SVG_HEIGHT}" viewBox="0 0 {SVG_WIDTH} {SVG_HEIGHT}" font-family="sans-serif">"#
    );
    let _ = writeln!(svg, r#"<rect width="100%" height="100%" fill="white"/>"#);
    let _ = writeln!(
        svg,
        r#"<text x="{}" y="24" text-anchor="middle" font-size="16">{HISTOGRAM_TITLE}</text>"#,
        SVG_WIDTH / 2.0
    );

    for (i, &count) in hist.counts.iter().enumerate() {
        let h = count as f64 / max * plot_h;
        let x = MARGIN_LEFT + i as f64 * bar_w;
        let _ = writeln!(
            svg,
            r##"<rect x="{x:.1}" y="{:.1}" width="{bar_w:.1}" height="{h:.1}" fill="#4c72b0" stroke="black" stroke-width="0.5"><title>{count}</title></rect>"##,
            base_y - h
        );
    }

    // Axes.
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{base_y}" x2="{}" y2="{base_y}" stroke="black"/>"#,
        MARGIN_LEFT + plot_w
    );
    let _ = writeln!(
        svg,
        r#"<line x1="{MARGIN_LEFT}" y1="{MARGIN_TOP}" x2="{MARGIN_LEFT}" y2="{base_y}" stroke="black"/>"#
    );

    // X ticks every 100.
    for i in 0..=HISTOGRAM_BUCKETS {
        let x = MARGIN_LEFT + i as f64 * bar_w;
        let label = i as f64 * HISTOGRAM_BUCKET_WIDTH;
        let _ = writeln!(
            svg,
            r#"<line x1="{x:.1}" y1="{base_y}" x2="{x:.1}" y2="{}" stroke="black"/><text x="{x:.1}" y="{}" text-anchor="middle" font-size="11">{label:.0}</text>"#,
            base_y + 5.0,
            base_y + 18.0
        );
    }

    // Y ticks at zero and the tallest bar.
    for value in [0.0, max] {
        let y = base_y - value / max * plot_h;
        let _ = writeln!(
            svg,
            r#"<text x="{}" y="{:.1}" text-anchor="end" font-size="11">{value:.0}</text>"#,
            MARGIN_LEFT - 6.0,
            y + 4.0
        );
    }

    let _ = writeln!(
        svg,
        r#"<text x="{}" y="{}" text-anchor="middle" font-size="13">Credit Score</text>"#,
        MARGIN_LEFT + plot_w / 2.0,
        SVG_HEIGHT - 12.0
    );
    let _ = writeln!(
        svg,
        r#"<text x="18" y="{0}" text-anchor="middle" font-size="13" transform="rotate(-90 18 {0})">Number of Wallets</text>"#,
        MARGIN_TOP + plot_h / 2.0
    );
    svg.push_str("</svg>\n");
    svg
}

/// Write [`render_histogram_svg`] output to `path`.
pub fn write_histogram_svg(path: &Path, hist: &ScoreHistogram) -> CreditResult<()> {
    fs::write(path, render_histogram_svg(hist))?;
    info!(path = %path.display(), wallets = hist.total(), "report: histogram written");
    Ok(())
}

// ---------------------------------------------------------------------------
// All reports
// ---------------------------------------------------------------------------

/// Write every configured report for a finished run. Returns the written
/// paths.
pub fn write_reports(output: &PipelineOutput, config: &OutputConfig) -> CreditResult<Vec<PathBuf>> {
    fs::create_dir_all(&config.dir)?;
    let mut written = Vec::with_capacity(3);

    let scores_path = config.scores_path();
    write_scores_csv(&scores_path, &output.report.scores)?;
    written.push(scores_path);

    let hist_path = config.histogram_path();
    let hist = ScoreHistogram::from_wallets(&output.report.scores);
    hist.log();
    write_histogram_svg(&hist_path, &hist)?;
    written.push(hist_path);

    if let Some(features_path) = config.features_path() {
        write_features_csv(&features_path, &output.features)?;
        written.push(features_path);
    }
    Ok(written)
}
