// Rendering-ready output: series and charts

use serde::ser::SerializeTuple;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// One chart point. Serializes as `[timestamp_ms, value]`, the shape chart libraries expect.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesPoint {
    pub timestamp_ms: i64,
    pub value: f64,
}

impl Serialize for SeriesPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut t = serializer.serialize_tuple(2)?;
        t.serialize_element(&self.timestamp_ms)?;
        t.serialize_element(&self.value)?;
        t.end()
    }
}

impl<'de> Deserialize<'de> for SeriesPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (timestamp_ms, value) = <(i64, f64)>::deserialize(deserializer)?;
        Ok(SeriesPoint {
            timestamp_ms,
            value,
        })
    }
}

/// One data source's output, in timestamp order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Series {
    pub name: String,
    pub points: Vec<SeriesPoint>,
}

impl Series {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            points: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Payload handed to the rendering layer: series plus display hints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ylabel: Option<String>,
    pub legend: Vec<String>,
    pub series: Vec<Series>,
}

impl Chart {
    /// Chart with no data (nothing in the window); rendered as an empty plot.
    pub fn empty(title: impl Into<String>, ylabel: Option<&str>) -> Self {
        Self {
            title: title.into(),
            ylabel: ylabel.map(str::to_string),
            legend: Vec::new(),
            series: Vec::new(),
        }
    }
}
