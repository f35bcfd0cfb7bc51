use std::collections::BTreeMap;

use crate::data::{AggregatedRecord, Field, GroupKey, MeasurementRecord, Readings};
use crate::defaults::NOISY_TRIAL_THRESHOLD;
use crate::stats::{NumericReductionFunc, ReductionFunc, Spread};

/// Groups records by (method, variant, threads) and reduces every numeric column.
///
/// Missing values are left out of the reduction; a column without any value stays missing.
/// The result is ordered by method, variant and thread count.
pub fn aggregate(records: &[MeasurementRecord], reduce_by: ReductionFunc) -> Vec<AggregatedRecord> {
    let mut groups: BTreeMap<GroupKey, Vec<&MeasurementRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(record.key()).or_default().push(record);
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            let readings = Readings::from_fn(|field| {
                members
                    .iter()
                    .filter_map(|m| m.readings.get(field))
                    .aggregate_by(reduce_by)
            });
            report_noisy_trials(&key, &members);
            AggregatedRecord::new(key, members.len(), readings)
        })
        .collect()
}

fn report_noisy_trials(key: &GroupKey, members: &[&MeasurementRecord]) {
    let Some(spread) = Spread::of(members.iter().filter_map(|m| m.readings.get(Field::Total)))
    else {
        return;
    };

    match spread.coefficient_of_variation() {
        Some(cv) if spread.samples > 1 && cv > NOISY_TRIAL_THRESHOLD => {
            log::info!("{}: total time varies across trials ({})", key, spread)
        }
        _ => log::debug!("{}: total time {}", key, spread),
    }
}
