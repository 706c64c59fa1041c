// Series transform engine: ordered raw samples -> rendering-ready series.
// Pure and synchronous; the caller fetches samples (ascending time) and fans out per instance.
// Counter wraparound is not corrected: a counter reset shows up as a negative delta.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{DataSourceDescriptor, Sample, Series, SeriesPoint, ValueKind};

/// How samples become points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// One point per consecutive sample pair: deltas for counter/derive, current value for gauge.
    #[default]
    Pairwise,
    /// Pairwise, then each point is the source's share of the per-timestamp total (0..100).
    Percentage,
    /// Every sample emitted as-is. Gauge sources only.
    Direct,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransformError {
    #[error("no data sources requested")]
    NoDescriptors,

    #[error("sample at {timestamp_ms} ms is missing data source {name:?}")]
    MissingDataSource { name: String, timestamp_ms: i64 },

    #[error("data source {name:?} is a {kind}; direct mode only accepts gauges")]
    NonGaugeInDirectMode { name: String, kind: ValueKind },

    #[error("unknown data source type: {0:?}")]
    UnknownValueKind(String),
}

/// Compute one series per descriptor, in descriptor order.
///
/// Fewer than two samples (one for [`TransformMode::Direct`]) yields empty series.
/// Pairs whose timestamps are less than a whole second apart are skipped.
pub fn compute_series(
    samples: &[Sample],
    descriptors: &[DataSourceDescriptor],
    mode: TransformMode,
) -> Result<Vec<Series>, TransformError> {
    validate(samples, descriptors, mode)?;

    let mut out: Vec<Series> = descriptors.iter().map(|d| Series::empty(&d.name)).collect();

    if mode == TransformMode::Direct {
        for sample in samples {
            let timestamp_ms = sample.timestamp_ms();
            for (series, d) in out.iter_mut().zip(descriptors) {
                series.points.push(SeriesPoint {
                    timestamp_ms,
                    value: raw_value(sample, &d.name)?,
                });
            }
        }
        return Ok(out);
    }

    let mut values: Vec<f64> = Vec::with_capacity(descriptors.len());
    for pair in samples.windows(2) {
        let (prev, curr) = (&pair[0], &pair[1]);
        if elapsed_secs(prev, curr) == 0 {
            continue;
        }

        values.clear();
        for d in descriptors {
            values.push(derive_value(prev, curr, d)?);
        }
        if mode == TransformMode::Percentage {
            normalize_to_percentages(&mut values);
        }

        let timestamp_ms = curr.timestamp_ms();
        for (series, value) in out.iter_mut().zip(&values) {
            series.points.push(SeriesPoint {
                timestamp_ms,
                value: *value,
            });
        }
    }

    Ok(out)
}

/// `value / (total / 100)`; 0 when the total is 0.
pub fn percentage_of(value: f64, total: f64) -> f64 {
    if total == 0.0 {
        0.0
    } else {
        value / (total / 100.0)
    }
}

/// Replace every value with its share of the slice total. A zero total zeroes the slice.
pub fn normalize_to_percentages(values: &mut [f64]) {
    let total: f64 = values.iter().sum();
    for v in values.iter_mut() {
        *v = percentage_of(*v, total);
    }
}

/// Whole seconds between two samples (truncated).
fn elapsed_secs(prev: &Sample, curr: &Sample) -> i64 {
    (curr.timestamp - prev.timestamp).num_seconds()
}

fn derive_value(
    prev: &Sample,
    curr: &Sample,
    d: &DataSourceDescriptor,
) -> Result<f64, TransformError> {
    let current = raw_value(curr, &d.name)?;
    if d.kind.is_delta() {
        Ok(current - raw_value(prev, &d.name)?)
    } else {
        Ok(current)
    }
}

fn raw_value(sample: &Sample, name: &str) -> Result<f64, TransformError> {
    sample
        .get(name)
        .ok_or_else(|| TransformError::MissingDataSource {
            name: name.to_string(),
            timestamp_ms: sample.timestamp_ms(),
        })
}

fn validate(
    samples: &[Sample],
    descriptors: &[DataSourceDescriptor],
    mode: TransformMode,
) -> Result<(), TransformError> {
    if descriptors.is_empty() {
        return Err(TransformError::NoDescriptors);
    }
    if mode == TransformMode::Direct
        && let Some(d) = descriptors.iter().find(|d| d.kind.is_delta())
    {
        return Err(TransformError::NonGaugeInDirectMode {
            name: d.name.clone(),
            kind: d.kind,
        });
    }
    for sample in samples {
        for d in descriptors {
            raw_value(sample, &d.name)?;
        }
    }
    Ok(())
}
