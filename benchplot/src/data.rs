use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::anyhow;

pub const METHOD_COLUMN: &str = "method";
pub const VARIANT_COLUMN: &str = "variant";
pub const THREADS_COLUMN: &str = "threads";

/// The numeric columns of a benchmark results file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    GenerationTime,
    CountTime,
    MergeTime,
    Total,
    Real,
    User,
    Sys,
    CpuPercent,
    Cycles,
    Instructions,
    CacheReferences,
    CacheMisses,
}

pub const FIELD_COUNT: usize = 12;

impl Field {
    /// All numeric columns in file order
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::GenerationTime,
        Field::CountTime,
        Field::MergeTime,
        Field::Total,
        Field::Real,
        Field::User,
        Field::Sys,
        Field::CpuPercent,
        Field::Cycles,
        Field::Instructions,
        Field::CacheReferences,
        Field::CacheMisses,
    ];

    /// Header name of the column holding this field
    pub fn column(self) -> &'static str {
        match self {
            Field::GenerationTime => "t_gen",
            Field::CountTime => "t_count",
            Field::MergeTime => "t_merge",
            Field::Total => "total",
            Field::Real => "real",
            Field::User => "user",
            Field::Sys => "sys",
            Field::CpuPercent => "cpu%",
            Field::Cycles => "cycles",
            Field::Instructions => "instructions",
            Field::CacheReferences => "cache_ref",
            Field::CacheMisses => "cache_miss",
        }
    }

    pub fn from_column(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.column() == name)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// Anything a chart can put on its y axis: a measured column or a derived scaling metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Measured(Field),
    Speedup,
    Efficiency,
}

impl Metric {
    pub fn name(self) -> &'static str {
        match self {
            Metric::Measured(field) => field.column(),
            Metric::Speedup => "speedup",
            Metric::Efficiency => "efficiency",
        }
    }
}

impl Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "speedup" => Ok(Metric::Speedup),
            "efficiency" => Ok(Metric::Efficiency),
            other => Field::from_column(other)
                .map(Metric::Measured)
                .ok_or_else(|| anyhow!("Unknown metric: {}", other)),
        }
    }
}

/// Cleaned values of the numeric columns, `None` where a value is missing.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Readings([Option<f64>; FIELD_COUNT]);

impl Readings {
    pub fn from_fn(mut f: impl FnMut(Field) -> Option<f64>) -> Self {
        Readings(Field::ALL.map(&mut f))
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.0[field.index()]
    }

    pub fn set(&mut self, field: Field, value: Option<f64>) {
        self.0[field.index()] = value;
    }
}

/// A row as read from the results file, numeric cells still in their textual form.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    pub line: u64,
    pub method: String,
    pub variant: String,
    pub threads: u32,
    pub cells: [String; FIELD_COUNT],
}

impl RawRecord {
    pub fn cell(&self, field: Field) -> &str {
        &self.cells[field.index()]
    }
}

/// A single benchmark trial after cleaning.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRecord {
    pub method: String,
    pub variant: String,
    pub threads: u32,
    pub readings: Readings,
}

impl MeasurementRecord {
    pub fn key(&self) -> GroupKey {
        GroupKey {
            method: self.method.clone(),
            variant: self.variant.clone(),
            threads: self.threads,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub method: String,
    pub variant: String,
    pub threads: u32,
}

impl Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.method, self.variant, self.threads)
    }
}

/// One row per (method, variant, threads) holding the reduced measurements and, once derived,
/// the scaling metrics relative to the single-thread run.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedRecord {
    pub method: String,
    pub variant: String,
    pub threads: u32,
    pub samples: usize,
    pub readings: Readings,
    pub speedup: Option<f64>,
    pub efficiency: Option<f64>,
}

impl AggregatedRecord {
    pub fn new(key: GroupKey, samples: usize, readings: Readings) -> Self {
        AggregatedRecord {
            method: key.method,
            variant: key.variant,
            threads: key.threads,
            samples,
            readings,
            speedup: None,
            efficiency: None,
        }
    }

    pub fn value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Measured(field) => self.readings.get(field),
            Metric::Speedup => self.speedup,
            Metric::Efficiency => self.efficiency,
        }
    }
}
