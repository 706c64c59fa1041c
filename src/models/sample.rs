// Raw samples and data-source metadata

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::transform::TransformError;

/// How a data source's raw value becomes a chart value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    /// Instantaneous value, emitted as-is.
    Gauge,
    /// Monotonic counter, emitted as the difference of consecutive samples.
    Counter,
    /// Differenced like a counter.
    Derive,
}

impl ValueKind {
    /// True for kinds that need the previous sample.
    pub fn is_delta(self) -> bool {
        matches!(self, ValueKind::Counter | ValueKind::Derive)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ValueKind::Gauge => "gauge",
            ValueKind::Counter => "counter",
            ValueKind::Derive => "derive",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueKind {
    type Err = TransformError;

    /// Parse a collectd dstype string (case-insensitive).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "gauge" => Ok(ValueKind::Gauge),
            "counter" => Ok(ValueKind::Counter),
            "derive" => Ok(ValueKind::Derive),
            _ => Err(TransformError::UnknownValueKind(s.to_string())),
        }
    }
}

/// One named channel of a multi-valued sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSourceDescriptor {
    pub name: String,
    pub kind: ValueKind,
    /// Instance the source belongs to when several are aggregated (core, disk, interface).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl DataSourceDescriptor {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// A point in time plus the raw value of every data source.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<String, f64>,
}

impl Sample {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: f64) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Epoch milliseconds, truncated.
    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp.timestamp_millis()
    }
}
