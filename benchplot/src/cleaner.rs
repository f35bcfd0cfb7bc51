use std::sync::OnceLock;

use regex::Regex;

use crate::data::{Field, MeasurementRecord, RawRecord, Readings};

static NON_NUMERIC_REGEX: OnceLock<Regex> = OnceLock::new();

fn non_numeric_regex() -> &'static Regex {
    NON_NUMERIC_REGEX.get_or_init(|| {
        Regex::new(r"[^0-9eE.\-]").expect("Failed to compile non-numeric character regex")
    })
}

/// Parses a possibly decorated numeric cell (`"12.5 ms"`, `"1,234"`, `"87%"`).
///
/// Everything except digits, exponent markers, dots and minus signs is dropped before
/// parsing. Returns `None` for empty or unparseable cells and for non-finite results. A cell
/// that keeps an exponent marker while also carrying other letters (`"1e3ms"`, `"4 sec"`) is
/// ambiguous and treated as missing.
pub fn clean_value(cell: &str) -> Option<f64> {
    let stripped = non_numeric_regex().replace_all(cell, "");
    if stripped.is_empty() {
        return None;
    }

    if stripped.contains(['e', 'E'])
        && cell
            .chars()
            .any(|c| c.is_ascii_alphabetic() && !matches!(c, 'e' | 'E'))
    {
        log::debug!("Ambiguous exponent marker in '{}', treating as missing", cell);
        return None;
    }

    stripped.parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn clean_record(raw: &RawRecord) -> MeasurementRecord {
    MeasurementRecord {
        method: raw.method.clone(),
        variant: raw.variant.clone(),
        threads: raw.threads,
        readings: Readings::from_fn(|field| clean_value(raw.cell(field))),
    }
}

pub fn clean_records(raw: &[RawRecord]) -> Vec<MeasurementRecord> {
    let records: Vec<_> = raw.iter().map(clean_record).collect();

    let missing = records
        .iter()
        .flat_map(|r| Field::ALL.map(|field| r.readings.get(field)))
        .filter(Option::is_none)
        .count();
    if missing > 0 {
        log::info!(
            "{} of {} numeric cells are missing or unparseable",
            missing,
            records.len() * Field::ALL.len()
        );
    }

    records
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn plain_numbers() {
        assert_eq!(Some(12.5), clean_value("12.5"));
        assert_eq!(Some(-3.0), clean_value("-3"));
        assert_eq!(Some(0.0), clean_value("0"));
        assert_eq!(Some(1500.0), clean_value("1.5e3"));
        assert_eq!(Some(0.002), clean_value("2E-3"));
    }

    #[test]
    fn decorated_numbers() {
        assert_eq!(Some(12.5), clean_value("12.5 ms"));
        assert_eq!(Some(87.0), clean_value("87%"));
        assert_eq!(Some(1234567.0), clean_value("1,234,567"));
        assert_eq!(Some(3.25), clean_value(" 3.25s "));
    }

    #[test]
    fn missing_values() {
        assert_eq!(None, clean_value(""));
        assert_eq!(None, clean_value("n/a"));
        assert_eq!(None, clean_value("-"));
        assert_eq!(None, clean_value("1.2.3"));
        assert_eq!(None, clean_value("--5"));
        assert_eq!(None, clean_value("1e999"));
    }

    #[test]
    fn ambiguous_exponent_markers() {
        assert_eq!(None, clean_value("1e3ms"));
        assert_eq!(None, clean_value("4 sec"));
        assert_eq!(None, clean_value("none"));
        assert_eq!(Some(1000.0), clean_value("1e3"));
    }

    #[test]
    fn cleaning_is_idempotent() {
        let cells = [
            "12.5 ms", "n/a", "87%", "1,234", "-0.5", "2E-3", "1e3ms", "", "0.1", "3e10",
        ];
        for cell in cells {
            let once = clean_value(cell);
            let twice = once.and_then(|v| clean_value(&v.to_string()));
            assert_eq!(once, twice, "cell '{}'", cell);
        }
    }

    #[test]
    fn record_cleaning_keeps_identity_columns() {
        let mut cells: [String; 12] = Default::default();
        cells[3] = "10 s".to_string();
        cells[7] = "n/a".to_string();
        let raw = RawRecord {
            line: 2,
            method: "sort".into(),
            variant: "A".into(),
            threads: 4,
            cells,
        };
        let record = clean_record(&raw);
        assert_eq!("sort", record.method);
        assert_eq!("A", record.variant);
        assert_eq!(4, record.threads);
        assert_eq!(Some(10.0), record.readings.get(Field::Total));
        assert_eq!(None, record.readings.get(Field::CpuPercent));
        assert_eq!(None, record.readings.get(Field::GenerationTime));
    }
}
