//! Shared fixtures for unit tests, integration tests and benchmarks.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

pub const RESULTS_HEADER: &str =
    "method,variant,threads,t_gen,t_count,t_merge,total,real,user,sys,cpu%,cycles,instructions,cache_ref,cache_miss";

/// Two methods with decorated and unparseable cells, a repeated trial and a pair without a
/// single-thread run (`count`/`par`).
pub const SAMPLE_RESULTS: &str = "\
method,variant,threads,t_gen,t_count,t_merge,total,real,user,sys,cpu%,cycles,instructions,cache_ref,cache_miss
sort,seq,1,1.0,2.0,1.0,8.0,8.1,7.9,0.1,99%,1000,2000,300,50
sort,seq,2,0.5,1.0,0.5,4.0,4.1,7.9,0.1,195%,1000,2000,300,60
sort,par,1,1.0,2.0,1.0,10 s,10.1,9.9,0.1,99%,1200,2100,320,70
sort,par,1,1.0,2.0,1.0,12 s,12.1,11.9,0.1,99%,1200,2100,320,n/a
sort,par,4,0.3,0.6,0.3,4.0,4.2,15.8,0.2,380%,1300,2200,340,90
count,par,2,0.2,0.4,0.2,3.0,3.1,5.9,0.1,190%,800,1500,200,30
count,par,4,0.1,0.2,0.2,2.0,2.1,7.8,0.1,370%,850,1600,210,35
";

/// Writes `contents` to `results.csv` inside `dir`.
///
/// # Panics
/// Panics if the file cannot be written.
pub fn write_results(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("results.csv");
    fs::write(&path, contents).expect("Failed to write results file");
    path
}

/// A temporary directory holding `results.csv` with `contents`.
pub fn results_in_tempdir(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempdir().expect("Failed to create temporary directory");
    let path = write_results(dir.path(), contents);
    (dir, path)
}

/// Generates a results table with every combination of method, variant, thread count
/// (powers of two up to `max_threads`) and trial. Total time halves with every doubling of
/// threads.
pub fn synthetic_results(
    methods: usize,
    variants: usize,
    max_threads: u32,
    trials: usize,
) -> String {
    let mut csv = String::from(RESULTS_HEADER);
    csv.push('\n');
    for method in 0..methods {
        for variant in 0..variants {
            let mut threads = 1;
            while threads <= max_threads {
                for trial in 0..trials {
                    let total = 64.0 / f64::from(threads) + trial as f64 * 0.01;
                    writeln!(
                        csv,
                        "m{method},v{variant},{threads},0.1,0.2,0.3,{total} s,{total},{total},0.1,{cpu}%,1000,2000,300,{misses}",
                        cpu = 99 * threads,
                        misses = 40 * threads,
                    )
                    .expect("Failed to format results row");
                }
                threads *= 2;
            }
        }
    }
    csv
}
