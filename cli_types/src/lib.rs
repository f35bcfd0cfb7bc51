use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::str::FromStr;

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReductionFunc {
    Min,
    Max,
    Median,
    Mean,
}

impl FromStr for ReductionFunc {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "min" => Ok(ReductionFunc::Min),
            "max" => Ok(ReductionFunc::Max),
            "median" => Ok(ReductionFunc::Median),
            "mean" => Ok(ReductionFunc::Mean),
            _ => Err(anyhow!(
                "Invalid aggregation function: {}. Valid values are 'min', 'max', 'median' or 'mean'",
                s
            )),
        }
    }
}

/// Image or data format the charts are written in
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChartFormat {
    Png,
    Html,
    Csv,
}

impl ChartFormat {
    /// File extension used for charts of this format
    pub fn extension(&self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Html => "html",
            ChartFormat::Csv => "csv",
        }
    }
}

impl FromStr for ChartFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(ChartFormat::Png),
            "html" => Ok(ChartFormat::Html),
            "csv" => Ok(ChartFormat::Csv),
            _ => Err(anyhow!(
                "Invalid chart format: {}. Valid values are 'png', 'html' or 'csv'",
                s
            )),
        }
    }
}

#[derive(Parser)]
#[command(version, name = "benchplot")]
pub struct Cli {
    /// Increase verbosity level (can be specified multiple times.) The first level sets level
    /// "info", second sets level "debug", and third sets level "trace" for the logger.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Without a subcommand, the charts are rendered with the configured defaults
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args)]
pub struct CliSource {
    /// Benchmark results file (delimited text with a header row)
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Single character separating the columns of the results file
    #[arg(short, long, value_parser=parse_delimiter)]
    pub delimiter: Option<u8>,

    /// How repeated trials of the same method, variant and thread count are combined
    #[arg(short, long)]
    pub aggregate_by: Option<ReductionFunc>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Aggregate the benchmark results and render the comparison charts for execution time,
    /// speedup, efficiency, CPU usage and cache misses
    Plot {
        #[command(flatten)]
        source: CliSource,

        /// Directory the charts are written to. Created if it does not exist.
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Format of the rendered charts
        #[arg(short, long)]
        format: Option<ChartFormat>,
    },

    /// Print the aggregated results including speedup and efficiency as CSV
    Summary {
        #[command(flatten)]
        source: CliSource,

        /// CSV output file, '-' for stdout
        #[arg(short, long, default_value = "-")]
        output: PathBuf,
    },
}

/// Accepts a single ASCII character or `\t` for tab
pub fn parse_delimiter(s: &str) -> Result<u8> {
    match s.as_bytes() {
        [byte] if byte.is_ascii() => Ok(*byte),
        _ if s == "\\t" => Ok(b'\t'),
        _ => Err(anyhow!(
            "invalid delimiter: expected a single ASCII character, got '{}'",
            s
        )),
    }
}
