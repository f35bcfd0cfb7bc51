use anyhow::Result;
use chrono::Utc;
use plotly::{
    common::{Line, Marker, Mode, Title},
    layout::{Axis, AxisType},
    Configuration, Layout, Plot, Scatter,
};

use super::{Chart, ChartSize, Panel, Reporter, THREADS_LABEL};

const DEFAULT_HTML_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{{TITLE}}</title>
    {{PLOTLY_HEAD}}
    <style>
        .panels { display: flex; flex-wrap: nowrap; }
        .panel { flex: 1 1 0; min-width: 0; }
    </style>
</head>
<body>
    <h1>{{TITLE}}</h1>
    <div class="panels">
{{PLOTLY_BODY}}
    </div>
    <footer>Generated {{TIMESTAMP}}</footer>
</body>
</html>"#;

/// Interactive page holding one plotly figure per method panel, side by side.
pub(super) struct PlotlyReporter {
    size: ChartSize,
    title: Option<String>,
    panels: Vec<Plot>,
}

impl PlotlyReporter {
    pub(super) fn new(size: ChartSize) -> Self {
        PlotlyReporter {
            size,
            title: None,
            panels: Vec::new(),
        }
    }

    fn panel_plot(&self, chart: &Chart, panel: &Panel) -> Plot {
        let mut plot = Plot::new();
        let config = Configuration::default().responsive(true).fill_frame(false);
        plot.set_configuration(config);

        for series in &panel.series {
            let (r, g, b) = chart.color(&series.variant);
            let color = format!("#{:02x}{:02x}{:02x}", r, g, b);
            let (threads, values): (Vec<u32>, Vec<f64>) = series.points.iter().copied().unzip();
            let trace = Scatter::new(threads, values)
                .mode(Mode::LinesMarkers)
                .name(series.variant.as_str())
                .line(Line::new().color(color.clone()).width(2.0))
                .marker(Marker::new().color(color).size(8));
            plot.add_trace(trace);
        }

        let mut y_axis = Axis::new()
            .title(Title::from(chart.y_label.as_str()))
            .show_grid(true);
        if chart.log_y {
            y_axis = y_axis.type_(AxisType::Log);
        } else if let Some((lo, hi)) = chart.y_bounds(panel) {
            let pad = if hi > lo { (hi - lo) * 0.05 } else { 1.0 };
            y_axis = y_axis.range(vec![lo - pad, hi + pad]);
        }

        let layout = Layout::new()
            .title(Title::from(panel.title().as_str()))
            .x_axis(Axis::new().title(Title::from(THREADS_LABEL)).show_grid(true))
            .y_axis(y_axis)
            .show_legend(true)
            .height(self.size.height as usize);
        plot.set_layout(layout);

        plot
    }
}

impl Reporter for PlotlyReporter {
    fn add_chart(&mut self, chart: &Chart) {
        if self.title.is_none() {
            self.title = Some(chart.y_label.clone());
        }
        let plots: Vec<Plot> = chart
            .panels
            .iter()
            .map(|panel| self.panel_plot(chart, panel))
            .collect();
        self.panels.extend(plots);
    }

    fn as_bytes(&self) -> Result<Vec<u8>> {
        let plotly_head = Plot::online_cdn_js();
        let plotly_body = self
            .panels
            .iter()
            .map(|plot| format!("<div class=\"panel\">{}</div>", plot.to_inline_html(None)))
            .collect::<Vec<_>>()
            .join("\n");
        let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();

        let output = DEFAULT_HTML_TEMPLATE
            .replace("{{TITLE}}", self.title.as_deref().unwrap_or("Benchmark results"))
            .replace("{{PLOTLY_HEAD}}", &plotly_head)
            .replace("{{PLOTLY_BODY}}", &plotly_body)
            .replace("{{TIMESTAMP}}", &timestamp);

        Ok(output.into_bytes())
    }
}
