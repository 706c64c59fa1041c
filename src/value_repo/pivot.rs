// Stored rows -> engine samples.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use chrono::{DateTime, Utc};

use crate::models::{Sample, ValueList};

fn instant(time_ms: i64) -> anyhow::Result<DateTime<Utc>> {
    DateTime::from_timestamp_millis(time_ms)
        .ok_or_else(|| anyhow::anyhow!("row time out of range: {}", time_ms))
}

/// One sample per row, keyed by the row's own dsnames.
pub fn vector_samples(rows: &[ValueList]) -> anyhow::Result<Vec<Sample>> {
    rows.iter()
        .map(|row| {
            let mut sample = Sample::new(instant(row.time_ms)?);
            for (name, value) in row.dsnames.iter().zip(&row.values) {
                sample.values.insert(name.clone(), *value);
            }
            Ok(sample)
        })
        .collect()
}

/// One sample per distinct timestamp, keyed by type_instance.
/// Each name holds the sum of `values[0]` over that timestamp's rows with that type_instance
/// (summing across plugin instances, e.g. CPU cores); names with no row at a timestamp are 0.
/// Rows for other type_instances are ignored.
pub fn type_instance_samples(rows: &[ValueList], names: &[String]) -> anyhow::Result<Vec<Sample>> {
    let mut by_time: BTreeMap<i64, Sample> = BTreeMap::new();
    for row in rows {
        if !names.contains(&row.type_instance) {
            continue;
        }
        let sample = match by_time.entry(row.time_ms) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let mut s = Sample::new(instant(row.time_ms)?);
                for name in names {
                    s.values.insert(name.clone(), 0.0);
                }
                e.insert(s)
            }
        };
        if let Some(v) = row.values.first() {
            *sample.values.entry(row.type_instance.clone()).or_insert(0.0) += *v;
        }
    }
    Ok(by_time.into_values().collect())
}

/// Per-timestamp element-wise sums of `values` (rows of equal width only).
pub fn elementwise_totals(rows: &[ValueList]) -> BTreeMap<i64, Vec<f64>> {
    let mut totals: BTreeMap<i64, Vec<f64>> = BTreeMap::new();
    for row in rows {
        let acc = totals
            .entry(row.time_ms)
            .or_insert_with(|| vec![0.0; row.values.len()]);
        if acc.len() != row.values.len() {
            tracing::debug!(
                time_ms = row.time_ms,
                host = %row.host,
                "skipping row of different width in totals"
            );
            continue;
        }
        for (a, v) in acc.iter_mut().zip(&row.values) {
            *a += *v;
        }
    }
    totals
}
