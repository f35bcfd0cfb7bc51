use std::fmt::Display;

use average::{self, concatenate, Estimate, Mean, Variance};
use itertools::Itertools;

pub use benchplot_cli_types::ReductionFunc;

use readable::num::*;

pub trait VecAggregation {
    fn median(&mut self) -> Option<f64>;
}

concatenate!(TrialStats, [Mean, mean], [Variance, sample_variance]);

/// Mean and dispersion of the repeated trials behind one aggregated value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spread {
    pub mean: f64,
    pub stddev: f64,
    pub samples: usize,
}

impl Spread {
    pub fn of(values: impl Iterator<Item = f64>) -> Option<Spread> {
        let stats: TrialStats = values.collect();
        if stats.mean.is_empty() {
            return None;
        }
        let samples = stats.mean.len() as usize;
        // Sample variance is undefined for a single trial
        let stddev = if samples < 2 {
            0.0
        } else {
            stats.sample_variance().sqrt()
        };
        Some(Spread {
            mean: stats.mean(),
            stddev,
            samples,
        })
    }

    /// Relative standard deviation, `None` for a zero mean
    pub fn coefficient_of_variation(&self) -> Option<f64> {
        let cv = self.stddev / self.mean.abs();
        cv.is_finite().then_some(cv)
    }
}

impl Display for Spread {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "μ: {} σ: {} n: {}",
            Float::from(self.mean),
            Float::from(self.stddev),
            Unsigned::from(self.samples),
        )
    }
}

impl VecAggregation for Vec<f64> {
    fn median(&mut self) -> Option<f64> {
        self.sort_by(f64::total_cmp);
        match self.len() {
            0 => None,
            even if even % 2 == 0 => {
                let left = self[even / 2 - 1];
                let right = self[even / 2];
                Some((left + right) / 2.0)
            }
            odd => Some(self[odd / 2]),
        }
    }
}

/// Reduces the available values of one column to a single number; `None` when there are none.
pub trait NumericReductionFunc: Iterator<Item = f64> {
    fn aggregate_by(&mut self, fun: ReductionFunc) -> Option<Self::Item> {
        match fun {
            ReductionFunc::Min => self.reduce(f64::min),
            ReductionFunc::Max => self.reduce(f64::max),
            ReductionFunc::Median => self.collect_vec().median(),
            ReductionFunc::Mean => Spread::of(self).map(|spread| spread.mean),
        }
    }
}

impl<T> NumericReductionFunc for T where T: Iterator<Item = f64> {}
