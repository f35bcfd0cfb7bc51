use std::collections::BTreeMap;
use std::fmt::{self, Display};

use readable::num::{Float, Unsigned};

use crate::data::{AggregatedRecord, Field};

/// Fills in speedup and efficiency relative to the single-thread run of each
/// (method, variant) pair.
///
/// `speedup = total(1) / total(T)` and `efficiency = speedup / T`. Pairs without a
/// single-thread record, or whose baseline total is missing, keep both undefined. Division
/// results that are not finite (a zero total) are stored as undefined as well.
pub fn derive_scaling(records: Vec<AggregatedRecord>) -> Vec<AggregatedRecord> {
    let mut pairs: BTreeMap<(String, String), Vec<AggregatedRecord>> = BTreeMap::new();
    for record in records {
        pairs
            .entry((record.method.clone(), record.variant.clone()))
            .or_default()
            .push(record);
    }

    pairs.into_values().flat_map(derive_pair).collect()
}

fn derive_pair(group: Vec<AggregatedRecord>) -> Vec<AggregatedRecord> {
    let Some(baseline) = group.iter().find(|r| r.threads == 1) else {
        if let Some(first) = group.first() {
            log::info!(
                "{}/{}: no single-thread run, speedup and efficiency stay undefined",
                first.method,
                first.variant
            );
        }
        return group;
    };
    let base_time = baseline.readings.get(Field::Total);

    group
        .into_iter()
        .map(|record| {
            let speedup = ratio(base_time, record.readings.get(Field::Total));
            let efficiency = ratio(speedup, Some(f64::from(record.threads)));
            AggregatedRecord {
                speedup,
                efficiency,
                ..record
            }
        })
        .collect()
}

/// Quotient of two optional values, undefined if either is missing or the result is not
/// finite.
pub fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let value = numerator? / denominator?;
    value.is_finite().then_some(value)
}

/// Best observed speedup of one (method, variant) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ScalingSummary {
    pub method: String,
    pub variant: String,
    pub threads: u32,
    pub speedup: f64,
    pub efficiency: Option<f64>,
}

impl Display for ScalingSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}: peak speedup {} at {} threads",
            self.method,
            self.variant,
            Float::from(self.speedup),
            Unsigned::from(self.threads),
        )?;
        if let Some(efficiency) = self.efficiency {
            write!(f, " (efficiency {})", Float::from(efficiency))?;
        }
        Ok(())
    }
}

/// Peak speedup per (method, variant) pair, for pairs with at least one defined speedup.
/// Ties keep the lowest thread count.
pub fn scaling_summaries(records: &[AggregatedRecord]) -> Vec<ScalingSummary> {
    let mut peaks: BTreeMap<(&str, &str), ScalingSummary> = BTreeMap::new();
    for record in records {
        let Some(speedup) = record.speedup else {
            continue;
        };
        let summary = ScalingSummary {
            method: record.method.clone(),
            variant: record.variant.clone(),
            threads: record.threads,
            speedup,
            efficiency: record.efficiency,
        };
        let peak = peaks
            .entry((record.method.as_str(), record.variant.as_str()))
            .or_insert_with(|| summary.clone());
        if speedup > peak.speedup || (speedup == peak.speedup && record.threads < peak.threads) {
            *peak = summary;
        }
    }
    peaks.into_values().collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::{GroupKey, Readings};

    fn record(method: &str, variant: &str, threads: u32, total: Option<f64>) -> AggregatedRecord {
        AggregatedRecord::new(
            GroupKey {
                method: method.into(),
                variant: variant.into(),
                threads,
            },
            1,
            Readings::from_fn(|field| if field == Field::Total { total } else { None }),
        )
    }

    fn find(records: &[AggregatedRecord], variant: &str, threads: u32) -> AggregatedRecord {
        records
            .iter()
            .find(|r| r.variant == variant && r.threads == threads)
            .unwrap()
            .clone()
    }

    #[test]
    fn speedup_against_single_thread() {
        let records = derive_scaling(vec![
            record("x", "A", 1, Some(10.0)),
            record("x", "A", 2, Some(6.0)),
        ]);
        let two = find(&records, "A", 2);
        assert_eq!(Some(10.0 / 6.0), two.speedup);
        assert_eq!(Some(10.0 / 6.0 / 2.0), two.efficiency);
        assert!((two.efficiency.unwrap() - 5.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn baseline_scales_to_one() {
        let records = derive_scaling(vec![record("x", "A", 1, Some(7.3))]);
        assert_eq!(Some(1.0), records[0].speedup);
        assert_eq!(Some(1.0), records[0].efficiency);
    }

    #[test]
    fn pairs_without_baseline_stay_undefined() {
        let records = derive_scaling(vec![
            record("x", "A", 2, Some(5.0)),
            record("x", "A", 4, Some(3.0)),
            record("x", "B", 1, Some(8.0)),
            record("x", "B", 4, Some(2.0)),
        ]);
        for threads in [2, 4] {
            let r = find(&records, "A", threads);
            assert_eq!(None, r.speedup);
            assert_eq!(None, r.efficiency);
        }
        assert_eq!(Some(4.0), find(&records, "B", 4).speedup);
        assert_eq!(Some(1.0), find(&records, "B", 4).efficiency);
    }

    #[test]
    fn missing_baseline_total_leaves_pair_undefined() {
        let records = derive_scaling(vec![
            record("x", "A", 1, None),
            record("x", "A", 2, Some(3.0)),
        ]);
        assert!(records.iter().all(|r| r.speedup.is_none() && r.efficiency.is_none()));
    }

    #[test]
    fn zero_total_is_undefined() {
        let records = derive_scaling(vec![
            record("x", "A", 1, Some(4.0)),
            record("x", "A", 2, Some(0.0)),
        ]);
        assert_eq!(None, find(&records, "A", 2).speedup);
        assert_eq!(None, find(&records, "A", 2).efficiency);

        let records = derive_scaling(vec![
            record("x", "A", 1, Some(0.0)),
            record("x", "A", 2, Some(1.0)),
        ]);
        assert_eq!(Some(0.0), find(&records, "A", 2).speedup);
        assert_eq!(None, find(&records, "A", 1).speedup);
    }

    #[test]
    fn derivation_keeps_every_record() {
        let input = vec![
            record("y", "A", 1, Some(1.0)),
            record("x", "A", 1, Some(1.0)),
            record("x", "A", 2, Some(1.0)),
        ];
        let records = derive_scaling(input);
        assert_eq!(3, records.len());
        assert_eq!("x", records[0].method);
        assert_eq!("y", records[2].method);
    }

    #[test]
    fn ratio_rules() {
        assert_eq!(Some(2.0), ratio(Some(4.0), Some(2.0)));
        assert_eq!(None, ratio(None, Some(2.0)));
        assert_eq!(None, ratio(Some(4.0), None));
        assert_eq!(None, ratio(Some(4.0), Some(0.0)));
        assert_eq!(None, ratio(Some(0.0), Some(0.0)));
    }

    #[test]
    fn peak_speedup_per_pair() {
        let records = derive_scaling(vec![
            record("x", "A", 1, Some(12.0)),
            record("x", "A", 2, Some(6.0)),
            record("x", "A", 4, Some(4.0)),
            record("x", "A", 8, Some(5.0)),
            record("x", "B", 2, Some(5.0)),
        ]);
        let summaries = scaling_summaries(&records);
        assert_eq!(1, summaries.len());
        assert_eq!(4, summaries[0].threads);
        assert_eq!(3.0, summaries[0].speedup);
        assert_eq!(Some(0.75), summaries[0].efficiency);
        assert!(summaries[0].to_string().starts_with("x/A: peak speedup 3"));
    }
}
