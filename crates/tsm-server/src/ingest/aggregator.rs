//! Summary statistics over a validated record set

use chrono::{DateTime, TimeDelta, Utc};
use tsm_common::{MeasurementRecord, SummaryStats};

use super::error::AggregationError;

/// Compute the file summary in one scan plus one sort for the median
pub fn aggregate(records: &[MeasurementRecord]) -> Result<SummaryStats, AggregationError> {
    let first = records.first().ok_or(AggregationError::EmptyInput)?;

    let mut min_date = first.timestamp;
    let mut max_date = first.timestamp;
    let mut min_value = first.value;
    let mut max_value = first.value;
    let mut execution_time_sum = 0.0;
    let mut value_sum = 0.0;
    let mut values = Vec::with_capacity(records.len());

    for record in records {
        min_date = min_date.min(record.timestamp);
        max_date = max_date.max(record.timestamp);
        min_value = min_value.min(record.value);
        max_value = max_value.max(record.value);
        execution_time_sum += record.execution_time;
        value_sum += record.value;
        values.push(record.value);
    }

    values.sort_by(f64::total_cmp);
    let count = records.len() as f64;

    Ok(SummaryStats {
        date_delta_secs: span_secs(min_date, max_date),
        min_date,
        avg_execution_time: execution_time_sum / count,
        avg_value: value_sum / count,
        median_value: median_of_sorted(&values),
        max_value,
        min_value,
    })
}

/// Seconds between two instants, microsecond precision
fn span_secs(min: DateTime<Utc>, max: DateTime<Utc>) -> f64 {
    let delta: TimeDelta = max - min;
    match delta.num_microseconds() {
        Some(micros) => micros as f64 / 1_000_000.0,
        None => delta.num_milliseconds() as f64 / 1_000.0,
    }
}

/// `sorted` must be non-empty and ascending
fn median_of_sorted(sorted: &[f64]) -> f64 {
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use proptest::prelude::*;

    fn record(secs_offset: i64, execution_time: f64, value: f64) -> MeasurementRecord {
        MeasurementRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
                + TimeDelta::seconds(secs_offset),
            execution_time,
            value,
        }
    }

    #[test]
    fn test_two_row_summary() {
        let stats = aggregate(&[record(0, 100.0, 50.5), record(3600, 200.0, 60.5)]).unwrap();

        assert_eq!(stats.date_delta_secs, 3600.0);
        assert_eq!(
            stats.min_date,
            Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
        );
        assert_eq!(stats.avg_execution_time, 150.0);
        assert_eq!(stats.avg_value, 55.5);
        assert_eq!(stats.median_value, 55.5);
        assert_eq!(stats.max_value, 60.5);
        assert_eq!(stats.min_value, 50.5);
    }

    #[test]
    fn test_single_row() {
        let stats = aggregate(&[record(0, 7.0, 3.0)]).unwrap();
        assert_eq!(stats.date_delta_secs, 0.0);
        assert_eq!(stats.median_value, 3.0);
        assert_eq!(stats.min_value, stats.max_value);
    }

    #[test]
    fn test_unordered_input() {
        let stats = aggregate(&[
            record(120, 1.0, 9.0),
            record(-60, 1.0, 1.0),
            record(0, 1.0, 5.0),
        ])
        .unwrap();
        assert_eq!(stats.date_delta_secs, 180.0);
        assert_eq!(stats.min_date, record(-60, 0.0, 0.0).timestamp);
        assert_eq!(stats.median_value, 5.0);
    }

    #[test]
    fn test_sub_second_span() {
        let a = record(0, 0.0, 0.0);
        let mut b = a;
        b.timestamp = a.timestamp + TimeDelta::microseconds(1_500);
        let stats = aggregate(&[a, b]).unwrap();
        assert_eq!(stats.date_delta_secs, 0.0015);
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(aggregate(&[]), Err(AggregationError::EmptyInput));
    }

    proptest! {
        #[test]
        fn prop_median_matches_sorted_middle(
            values in prop::collection::vec(0.0f64..1e9, 1..200)
        ) {
            let records: Vec<_> = values
                .iter()
                .enumerate()
                .map(|(i, v)| record(i as i64, 1.0, *v))
                .collect();
            let stats = aggregate(&records).unwrap();

            let mut sorted = values.clone();
            sorted.sort_by(f64::total_cmp);
            let n = sorted.len();
            let expected = if n % 2 == 1 {
                sorted[n / 2]
            } else {
                (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
            };

            prop_assert_eq!(stats.median_value, expected);
            prop_assert!(stats.min_value <= stats.median_value);
            prop_assert!(stats.median_value <= stats.max_value);
        }

        #[test]
        fn prop_span_is_max_minus_min(
            offsets in prop::collection::vec(-1_000_000i64..1_000_000, 1..100)
        ) {
            let records: Vec<_> = offsets.iter().map(|o| record(*o, 1.0, 1.0)).collect();
            let stats = aggregate(&records).unwrap();

            let min = *offsets.iter().min().unwrap();
            let max = *offsets.iter().max().unwrap();
            prop_assert!(stats.date_delta_secs >= 0.0);
            prop_assert_eq!(stats.date_delta_secs, (max - min) as f64);
            prop_assert_eq!(stats.min_date, record(min, 0.0, 0.0).timestamp);
        }
    }
}
