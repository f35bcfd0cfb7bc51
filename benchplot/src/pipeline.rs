use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, bail, Context, Result};
use benchplot_cli_types::ChartFormat;

use crate::{
    aggregate::aggregate,
    cleaner::clean_records,
    data::{AggregatedRecord, Field},
    defaults,
    loader::load_results,
    metrics::{derive_scaling, scaling_summaries},
    reporting::{plot_metric, standard_charts, write_output, ChartSize},
    stats::ReductionFunc,
};

/// Where the benchmark results come from and how repeated trials are combined.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    pub input: PathBuf,
    pub delimiter: u8,
    pub reduce_by: ReductionFunc,
}

impl Default for Source {
    fn default() -> Self {
        Source {
            input: PathBuf::from(defaults::DEFAULT_INPUT_PATH),
            delimiter: defaults::default_delimiter(),
            reduce_by: defaults::default_reduction(),
        }
    }
}

/// Where and how the standard charts are written.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOutput {
    pub output_dir: PathBuf,
    pub format: ChartFormat,
    pub size: ChartSize,
}

impl Default for ChartOutput {
    fn default() -> Self {
        ChartOutput {
            output_dir: PathBuf::from(defaults::DEFAULT_OUTPUT_DIR),
            format: defaults::default_chart_format(),
            size: ChartSize::default(),
        }
    }
}

/// Runs load, clean, aggregate and metric derivation on the results file.
pub fn load(source: &Source) -> Result<Vec<AggregatedRecord>> {
    let raw = load_results(&source.input, source.delimiter)?;
    if raw.is_empty() {
        bail!(
            "No benchmark records found in '{}'",
            source.input.display()
        );
    }

    let measurements = clean_records(&raw);
    let records = derive_scaling(aggregate(&measurements, source.reduce_by));
    log::info!(
        "Aggregated {} trials into {} records",
        measurements.len(),
        records.len()
    );

    for summary in scaling_summaries(&records) {
        log::info!("{}", summary);
    }

    Ok(records)
}

/// Renders execution time, speedup, efficiency, CPU usage and cache misses into
/// `output.output_dir`. Returns the written files in that order.
pub fn plot(source: &Source, output: &ChartOutput) -> Result<Vec<PathBuf>> {
    let records = load(source)?;

    fs::create_dir_all(&output.output_dir).with_context(|| {
        format!(
            "Failed to create output directory '{}'",
            output.output_dir.display()
        )
    })?;

    let mut written = Vec::new();
    for spec in standard_charts(output.format) {
        if let Some(path) = plot_metric(&records, &spec, &output.output_dir, output.size)? {
            written.push(path);
        }
    }
    Ok(written)
}

/// The line printed once all charts are written.
pub fn confirmation(output_dir: &Path, written: &[PathBuf]) -> String {
    let names = written
        .iter()
        .filter_map(|path| path.file_name())
        .map(|name| name.to_string_lossy())
        .collect::<Vec<_>>()
        .join(", ");
    let dir = output_dir.display().to_string();
    format!("Plots saved in '{}/': {}", dir.trim_end_matches('/'), names)
}

/// Writes the aggregated table including speedup and efficiency as CSV to `output`
/// (`-` for stdout).
pub fn summary(source: &Source, output: &Path) -> Result<()> {
    let records = load(source)?;
    write_output(output, &summary_csv(&records)?)
}

/// Missing values are written as empty cells.
pub fn summary_csv(records: &[AggregatedRecord]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    let mut header = vec!["method", "variant", "threads", "samples"];
    header.extend(Field::ALL.map(Field::column));
    header.extend(["speedup", "efficiency"]);
    writer.write_record(&header)?;

    let cell = |value: Option<f64>| value.map(|v| v.to_string()).unwrap_or_default();
    for record in records {
        let mut row = vec![
            record.method.clone(),
            record.variant.clone(),
            record.threads.to_string(),
            record.samples.to_string(),
        ];
        row.extend(Field::ALL.map(|field| cell(record.readings.get(field))));
        row.push(cell(record.speedup));
        row.push(cell(record.efficiency));
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| anyhow!("Failed to write summary: {}", e.error()))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test_helpers::{results_in_tempdir, SAMPLE_RESULTS};

    #[test]
    fn confirmation_lists_file_names() {
        let written = [
            PathBuf::from("graficas/execution_time.png"),
            PathBuf::from("graficas/speedup.png"),
        ];
        assert_eq!(
            "Plots saved in 'graficas/': execution_time.png, speedup.png",
            confirmation(Path::new("graficas"), &written)
        );
        assert_eq!(
            "Plots saved in 'out/': speedup.png",
            confirmation(Path::new("out/"), &written[1..])
        );
    }

    #[test]
    fn load_runs_every_stage() {
        let (_dir, input) = results_in_tempdir(SAMPLE_RESULTS);
        let source = Source {
            input,
            ..Source::default()
        };
        let records = load(&source).unwrap();
        let sort_seq_2 = records
            .iter()
            .find(|r| r.method == "sort" && r.variant == "seq" && r.threads == 2)
            .unwrap();
        assert_eq!(Some(2.0), sort_seq_2.speedup);
        assert_eq!(Some(1.0), sort_seq_2.efficiency);
    }

    #[test]
    fn header_only_input_is_an_error() {
        let header = SAMPLE_RESULTS.lines().next().unwrap();
        let (_dir, input) = results_in_tempdir(header);
        let source = Source {
            input,
            ..Source::default()
        };
        let err = load(&source).unwrap_err();
        assert!(err.to_string().contains("No benchmark records found"));
    }

    #[test]
    fn summary_has_empty_cells_for_missing_values() {
        let (_dir, input) = results_in_tempdir(SAMPLE_RESULTS);
        let source = Source {
            input,
            ..Source::default()
        };
        let csv = String::from_utf8(summary_csv(&load(&source).unwrap()).unwrap()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            "method,variant,threads,samples,t_gen,t_count,t_merge,total,real,user,sys,cpu%,cycles,instructions,cache_ref,cache_miss,speedup,efficiency",
            lines.next().unwrap()
        );
        // count/par has no single-thread run
        let count_par = lines.find(|l| l.starts_with("count,par,2,")).unwrap();
        assert!(count_par.ends_with(",,"));
    }
}
