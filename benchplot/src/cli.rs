use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::Level;

use crate::config::Settings;
use crate::defaults;
use crate::pipeline::{self, ChartOutput, Source};
use crate::reporting::ChartSize;
use benchplot_cli_types::{ChartFormat, Cli, CliSource, Commands};
use std::path::PathBuf;

pub fn handle_calls() -> Result<()> {
    let cli = Cli::parse();
    let logger_level = match cli.verbose {
        0 => Level::Warn,
        1 => Level::Info,
        2 => Level::Debug,
        _ => Level::Trace,
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(logger_level.as_str())).init();

    let settings = Settings::load();

    match cli.command {
        None => plot(&settings, None, None, None),
        Some(Commands::Plot {
            source,
            output_dir,
            format,
        }) => plot(&settings, Some(source), output_dir, format),
        Some(Commands::Summary { source, output }) => {
            pipeline::summary(&resolve_source(Some(source), &settings), &output)
        }
    }
}

fn plot(
    settings: &Settings,
    source: Option<CliSource>,
    output_dir: Option<PathBuf>,
    format: Option<ChartFormat>,
) -> Result<()> {
    let source = resolve_source(source, settings);
    let output = resolve_chart_output(output_dir, format, settings);
    let written = pipeline::plot(&source, &output)?;
    println!("{}", pipeline::confirmation(&output.output_dir, &written));
    Ok(())
}

/// Command line flags win over configuration, configuration over built-in defaults.
fn resolve_source(cli: Option<CliSource>, settings: &Settings) -> Source {
    let (input, delimiter, aggregate_by) = match cli {
        Some(cli) => (cli.input, cli.delimiter, cli.aggregate_by),
        None => (None, None, None),
    };
    Source {
        input: input
            .or_else(|| settings.input_path.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_INPUT_PATH)),
        delimiter: delimiter
            .or(settings.delimiter)
            .unwrap_or(defaults::default_delimiter()),
        reduce_by: aggregate_by
            .or(settings.aggregate_by)
            .unwrap_or(defaults::default_reduction()),
    }
}

fn resolve_chart_output(
    output_dir: Option<PathBuf>,
    format: Option<ChartFormat>,
    settings: &Settings,
) -> ChartOutput {
    ChartOutput {
        output_dir: output_dir
            .or_else(|| settings.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from(defaults::DEFAULT_OUTPUT_DIR)),
        format: format
            .or(settings.format)
            .unwrap_or(defaults::default_chart_format()),
        size: ChartSize {
            panel_width: settings
                .panel_width
                .unwrap_or(defaults::default_panel_width()),
            height: settings
                .chart_height
                .unwrap_or(defaults::default_chart_height()),
        },
    }
}
