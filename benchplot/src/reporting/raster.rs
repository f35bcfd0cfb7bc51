use std::sync::OnceLock;

use anyhow::{anyhow, bail, Context, Result};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::register_font;

use super::{Chart, ChartSize, Panel, Reporter, THREADS_LABEL};

const FONT_FAMILY: &str = "sans-serif";
const FONT_DATA: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

const CAPTION_FONT_SIZE: u32 = 22;
const LABEL_FONT_SIZE: u32 = 14;

fn ensure_font() -> Result<()> {
    static REGISTERED: OnceLock<bool> = OnceLock::new();
    let registered = *REGISTERED
        .get_or_init(|| register_font(FONT_FAMILY, FontStyle::Normal, FONT_DATA).is_ok());
    if !registered {
        bail!("Failed to load the embedded chart font");
    }
    Ok(())
}

fn render_error<E: std::fmt::Debug>(err: E) -> anyhow::Error {
    anyhow!("Failed to render chart: {:?}", err)
}

/// Static image with the method panels side by side.
pub(super) struct PngReporter {
    size: ChartSize,
    chart: Option<Chart>,
}

impl PngReporter {
    pub(super) fn new(size: ChartSize) -> Self {
        PngReporter { size, chart: None }
    }
}

impl Reporter for PngReporter {
    fn add_chart(&mut self, chart: &Chart) {
        self.chart = Some(chart.clone());
    }

    fn as_bytes(&self) -> Result<Vec<u8>> {
        let Some(chart) = &self.chart else {
            bail!("No chart to render");
        };
        let (width, height, pixels) = render(chart, self.size)?;
        encode_png(&pixels, width, height)
    }
}

/// Draws the chart into an RGB buffer, returning its dimensions and pixels.
fn render(chart: &Chart, size: ChartSize) -> Result<(u32, u32, Vec<u8>)> {
    ensure_font()?;

    let columns = chart.panels.len().max(1);
    let height = size.height;
    let width = u32::try_from(columns)
        .ok()
        .and_then(|columns| size.panel_width.checked_mul(columns))
        .with_context(|| {
            format!(
                "Chart of {} panels, {} pixels wide each, is too large",
                columns, size.panel_width
            )
        })?;
    let buffer_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|len| len.checked_mul(3))
        .with_context(|| format!("Chart of {}x{} pixels is too large", width, height))?;
    let mut pixels = vec![0u8; buffer_len];

    {
        let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        let x_range = padded_threads(chart.thread_bounds());
        let areas = root.split_evenly((1, columns));
        for (area, panel) in areas.iter().zip(&chart.panels) {
            draw_panel(area, chart, panel, x_range)?;
        }

        root.present().map_err(render_error)?;
    }

    Ok((width, height, pixels))
}

fn draw_panel(
    area: &DrawingArea<BitMapBackend<'_>, Shift>,
    chart: &Chart,
    panel: &Panel,
    (x_lo, x_hi): (u32, u32),
) -> Result<()> {
    let (y_lo, y_hi) = padded_values(
        chart
            .y_bounds(panel)
            .map(|(lo, hi)| (to_axis(lo, chart.log_y), to_axis(hi, chart.log_y))),
    );

    let mut ctx = ChartBuilder::on(area)
        .caption(panel.title(), (FONT_FAMILY, CAPTION_FONT_SIZE))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(70)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)
        .map_err(render_error)?;

    let log_tick = |exponent: &f64| format_log_tick(*exponent);
    let mut mesh = ctx.configure_mesh();
    mesh.x_desc(THREADS_LABEL)
        .y_desc(chart.y_label.as_str())
        .label_style((FONT_FAMILY, LABEL_FONT_SIZE))
        .axis_desc_style((FONT_FAMILY, LABEL_FONT_SIZE));
    if chart.log_y {
        mesh.y_label_formatter(&log_tick);
    }
    mesh.draw().map_err(render_error)?;

    for series in &panel.series {
        let (r, g, b) = chart.color(&series.variant);
        let color = RGBColor(r, g, b);
        let points = series
            .points
            .iter()
            .map(|&(threads, value)| (threads, to_axis(value, chart.log_y)));
        ctx.draw_series(LineSeries::new(points, color.stroke_width(2)).point_size(4))
            .map_err(render_error)?
            .label(series.variant.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
            });
    }

    if !panel.series.is_empty() {
        ctx.configure_series_labels()
            .label_font((FONT_FAMILY, LABEL_FONT_SIZE))
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()
            .map_err(render_error)?;
    }

    Ok(())
}

/// Log axes are drawn as a linear axis over the base 10 exponent.
fn to_axis(value: f64, log_y: bool) -> f64 {
    if log_y {
        value.log10()
    } else {
        value
    }
}

fn format_log_tick(exponent: f64) -> String {
    let value = 10f64.powf(exponent);
    if (0.01..10_000.0).contains(&value) {
        format!("{:.2}", value)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string()
    } else {
        format!("{:.1e}", value)
    }
}

fn padded_threads(bounds: Option<(u32, u32)>) -> (u32, u32) {
    match bounds {
        Some((lo, hi)) if lo < hi => (lo, hi),
        Some((lo, hi)) => (lo.saturating_sub(1), hi + 1),
        None => (0, 1),
    }
}

fn padded_values(bounds: Option<(f64, f64)>) -> (f64, f64) {
    match bounds {
        Some((lo, hi)) if hi > lo => {
            let pad = (hi - lo) * 0.05;
            (lo - pad, hi + pad)
        }
        Some((lo, hi)) => {
            let pad = if lo == 0.0 { 1.0 } else { lo.abs() * 0.1 };
            (lo - pad, hi + pad)
        }
        None => (0.0, 1.0),
    }
}

fn encode_png(pixels: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(pixels, width, height, ColorType::Rgb8)
        .context("Failed to encode chart as PNG")?;
    Ok(bytes)
}
