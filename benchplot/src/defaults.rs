//! Centralized default values for benchplot.
//!
//! These are the fallbacks used when neither a command line flag nor the configuration file
//! provides a value.

use benchplot_cli_types::{ChartFormat, ReductionFunc};

// ============================================================================
// Input Defaults
// ============================================================================

/// Default location of the benchmark results file, relative to the working directory.
pub const DEFAULT_INPUT_PATH: &str = "outputs/results.csv";

/// Default column delimiter of the results file.
pub const DEFAULT_DELIMITER: u8 = b',';

// ============================================================================
// Aggregation Defaults
// ============================================================================

/// Repeated trials of one (method, variant, threads) triple are averaged unless configured
/// otherwise.
pub const DEFAULT_REDUCTION: ReductionFunc = ReductionFunc::Mean;

/// Relative standard deviation of the total time above which a group's trials are reported
/// as noisy.
pub const NOISY_TRIAL_THRESHOLD: f64 = 0.1;

// ============================================================================
// Output Defaults
// ============================================================================

/// Default directory receiving the rendered charts.
pub const DEFAULT_OUTPUT_DIR: &str = "graficas";

pub const DEFAULT_CHART_FORMAT: ChartFormat = ChartFormat::Png;

/// Width in pixels of a single method panel. Charts grow horizontally with the number of
/// methods.
pub const DEFAULT_PANEL_WIDTH: u32 = 600;

/// Height in pixels of a chart.
pub const DEFAULT_CHART_HEIGHT: u32 = 500;

/// Largest accepted panel width or chart height in pixels.
pub const MAX_CHART_DIMENSION: u32 = 16_384;

// ============================================================================
// Helper Functions
// ============================================================================

#[inline]
pub const fn default_delimiter() -> u8 {
    DEFAULT_DELIMITER
}

#[inline]
pub const fn default_reduction() -> ReductionFunc {
    DEFAULT_REDUCTION
}

#[inline]
pub const fn default_chart_format() -> ChartFormat {
    DEFAULT_CHART_FORMAT
}

#[inline]
pub const fn default_panel_width() -> u32 {
    DEFAULT_PANEL_WIDTH
}

#[inline]
pub const fn default_chart_height() -> u32 {
    DEFAULT_CHART_HEIGHT
}
