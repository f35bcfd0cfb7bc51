use std::{
    fs::{self, File},
    io::{self, ErrorKind, Write},
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use itertools::{Itertools, MinMaxResult};

use crate::data::{AggregatedRecord, Field, Metric};
use benchplot_cli_types::ChartFormat;

mod html;
mod raster;

use html::PlotlyReporter;
use raster::PngReporter;

/// Line colors assigned to variants in order of first appearance, shared by all renderers.
const PALETTE: [(u8, u8, u8); 10] = [
    (31, 119, 180),
    (255, 127, 14),
    (44, 160, 44),
    (214, 39, 40),
    (148, 103, 189),
    (140, 86, 75),
    (227, 119, 194),
    (127, 127, 127),
    (188, 189, 34),
    (23, 190, 207),
];

pub const THREADS_LABEL: &str = "Threads";

/// Pixel dimensions of a rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartSize {
    /// Width of one method panel
    pub panel_width: u32,
    pub height: u32,
}

impl Default for ChartSize {
    fn default() -> Self {
        ChartSize {
            panel_width: crate::defaults::default_panel_width(),
            height: crate::defaults::default_chart_height(),
        }
    }
}

/// What to plot and where to put it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub metric: Metric,
    pub label: Option<String>,
    pub file_name: Option<String>,
    pub log_y: bool,
}

impl ChartSpec {
    pub fn new(metric: Metric) -> Self {
        ChartSpec {
            metric,
            label: None,
            file_name: None,
            log_y: false,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn log_y(mut self, log_y: bool) -> Self {
        self.log_y = log_y;
        self
    }

    /// The explicit label, or the capitalized metric name
    pub fn y_label(&self) -> String {
        self.label
            .clone()
            .unwrap_or_else(|| capitalize(self.metric.name()))
    }
}

/// The five charts rendered for every results file, named for the given format.
pub fn standard_charts(format: ChartFormat) -> Vec<ChartSpec> {
    [
        (Metric::Measured(Field::Total), "execution_time", "Execution time (s)", false),
        (Metric::Speedup, "speedup", "Speedup", false),
        (Metric::Efficiency, "efficiency", "Efficiency", false),
        (Metric::Measured(Field::CpuPercent), "cpu_usage", "%CPU used", false),
        (Metric::Measured(Field::CacheMisses), "cache_misses", "Cache misses", true),
    ]
    .into_iter()
    .map(|(metric, stem, label, log_y)| {
        ChartSpec::new(metric)
            .label(label)
            .file_name(format!("{}.{}", stem, format.extension()))
            .log_y(log_y)
    })
    .collect()
}

/// First letter upper case, the rest lower case
fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// The plottable points of one variant within a method panel, ascending by thread count.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub variant: String,
    pub points: Vec<(u32, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    pub method: String,
    pub series: Vec<Series>,
}

impl Panel {
    pub fn title(&self) -> String {
        self.method.to_uppercase()
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().map(|&(_, v)| v))
    }
}

/// A metric laid out as one panel per method and one series per variant.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    pub metric: Metric,
    pub y_label: String,
    pub log_y: bool,
    /// Every variant in order of first appearance; determines series colors
    pub variants: Vec<String>,
    pub panels: Vec<Panel>,
}

impl Chart {
    pub fn from_records(records: &[AggregatedRecord], spec: &ChartSpec) -> Result<Chart> {
        if records.is_empty() {
            bail!("No aggregated records to plot for '{}'", spec.metric);
        }

        let methods = records.iter().map(|r| r.method.as_str()).unique().collect_vec();
        let variants = records.iter().map(|r| r.variant.as_str()).unique().collect_vec();

        let panels = methods
            .iter()
            .map(|&method| Panel {
                method: method.to_string(),
                series: variants
                    .iter()
                    .filter_map(|&variant| series_for(records, spec, method, variant))
                    .collect(),
            })
            .collect();

        Ok(Chart {
            metric: spec.metric,
            y_label: spec.y_label(),
            log_y: spec.log_y,
            variants: variants.into_iter().map(str::to_string).collect(),
            panels,
        })
    }

    /// Value range of the y axis for `panel`: per panel on a log axis, shared otherwise.
    pub fn y_bounds(&self, panel: &Panel) -> Option<(f64, f64)> {
        if self.log_y {
            value_bounds(panel.values())
        } else {
            value_bounds(self.panels.iter().flat_map(Panel::values))
        }
    }

    pub fn thread_bounds(&self) -> Option<(u32, u32)> {
        let threads = self
            .panels
            .iter()
            .flat_map(|p| &p.series)
            .flat_map(|s| s.points.iter().map(|&(t, _)| t));
        match threads.minmax() {
            MinMaxResult::NoElements => None,
            MinMaxResult::OneElement(t) => Some((t, t)),
            MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
        }
    }

    pub fn color(&self, variant: &str) -> (u8, u8, u8) {
        let idx = self
            .variants
            .iter()
            .position(|v| v == variant)
            .unwrap_or_default();
        PALETTE[idx % PALETTE.len()]
    }
}

/// `None` when the method has no records for the variant at all
fn series_for(
    records: &[AggregatedRecord],
    spec: &ChartSpec,
    method: &str,
    variant: &str,
) -> Option<Series> {
    let members = records
        .iter()
        .filter(|r| r.method == method && r.variant == variant)
        .collect_vec();
    if members.is_empty() {
        return None;
    }

    let points = members
        .into_iter()
        .filter_map(|r| {
            r.value(spec.metric)
                .filter(|&v| v.is_finite() && (!spec.log_y || v > 0.0))
                .map(|v| (r.threads, v))
        })
        .sorted_by_key(|&(threads, _)| threads)
        .collect();

    Some(Series {
        variant: variant.to_string(),
        points,
    })
}

fn value_bounds(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    match values.minmax() {
        MinMaxResult::NoElements => None,
        MinMaxResult::OneElement(v) => Some((v, v)),
        MinMaxResult::MinMax(lo, hi) => Some((lo, hi)),
    }
}

trait Reporter {
    fn add_chart(&mut self, chart: &Chart);
    fn as_bytes(&self) -> Result<Vec<u8>>;
}

/// Tab separated dump of the plotted series.
struct CsvReporter {
    lines: Vec<String>,
}

impl CsvReporter {
    fn new() -> Self {
        CsvReporter { lines: Vec::new() }
    }
}

impl Reporter for CsvReporter {
    fn add_chart(&mut self, chart: &Chart) {
        if self.lines.is_empty() {
            self.lines.push("metric\tmethod\tvariant\tthreads\tvalue".to_string());
        }
        for panel in &chart.panels {
            for series in &panel.series {
                for &(threads, value) in &series.points {
                    // Whole numbers keep one decimal place
                    let value = if value.fract() == 0.0 {
                        format!("{:.1}", value)
                    } else {
                        value.to_string()
                    };
                    self.lines.push(format!(
                        "{}\t{}\t{}\t{}\t{}",
                        chart.metric, panel.method, series.variant, threads, value
                    ));
                }
            }
        }
    }

    fn as_bytes(&self) -> Result<Vec<u8>> {
        if self.lines.is_empty() {
            return Ok(Vec::new());
        }
        let mut output = self.lines.join("\n");
        output.push('\n');
        Ok(output.into_bytes())
    }
}

struct ReporterFactory {}

impl ReporterFactory {
    fn from_file_name(path: &Path, size: ChartSize) -> Option<Box<dyn Reporter>> {
        if path == Path::new("-") {
            return Some(Box::new(CsvReporter::new()) as Box<dyn Reporter>);
        }
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "png" => Some(Box::new(PngReporter::new(size)) as Box<dyn Reporter>),
            "html" => Some(Box::new(PlotlyReporter::new(size)) as Box<dyn Reporter>),
            "csv" => Some(Box::new(CsvReporter::new()) as Box<dyn Reporter>),
            _ => None,
        }
    }
}

/// Renders `spec.metric` of `records` and writes it to `spec.file_name` inside `output_dir`.
///
/// The directory is created if needed. Without a file name the chart is rendered as PNG and
/// discarded. Returns the path written to, if any.
pub fn plot_metric(
    records: &[AggregatedRecord],
    spec: &ChartSpec,
    output_dir: &Path,
    size: ChartSize,
) -> Result<Option<PathBuf>> {
    let chart = Chart::from_records(records, spec)?;

    let Some(file_name) = &spec.file_name else {
        let mut reporter = PngReporter::new(size);
        reporter.add_chart(&chart);
        reporter.as_bytes()?;
        log::debug!("Rendered '{}' without writing it", chart.y_label);
        return Ok(None);
    };

    let path = output_dir.join(file_name);
    let mut reporter = ReporterFactory::from_file_name(&path, size)
        .ok_or_else(|| anyhow!("Could not infer output format of '{}'", path.display()))?;
    reporter.add_chart(&chart);
    let bytes = reporter.as_bytes()?;

    fs::create_dir_all(output_dir).with_context(|| {
        format!("Failed to create output directory '{}'", output_dir.display())
    })?;
    write_output(&path, &bytes)?;
    log::info!("Wrote {}", path.display());
    Ok(Some(path))
}

/// Writes to the file at `path`, or to stdout for `-`.
pub fn write_output(path: &Path, bytes: &[u8]) -> Result<()> {
    if path == Path::new("-") {
        match io::stdout().write_all(bytes) {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => Ok(()),
            res => res,
        }?;
    } else {
        File::create(path)
            .and_then(|mut file| file.write_all(bytes))
            .with_context(|| format!("Failed to write '{}'", path.display()))?;
    }
    Ok(())
}
