// collectd value lists: wire payload (POST /api/values) and stored row

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ValueKind;

/// Largest accepted `time`/`interval` in seconds; keeps the ms conversion within i64.
const MAX_SECS: f64 = (i64::MAX / 1000) as f64;

/// One value list as posted by collectd's write_http JSON format.
/// `time` and `interval` are seconds (collectd sends floats).
#[derive(Debug, Clone, Deserialize)]
pub struct ValueListPayload {
    pub time: f64,
    #[serde(default)]
    pub interval: f64,
    pub host: String,
    pub plugin: String,
    #[serde(default)]
    pub plugin_instance: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub type_instance: String,
    pub dsnames: Vec<String>,
    pub dstypes: Vec<String>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub meta: Option<BTreeMap<String, serde_json::Value>>,
}

impl ValueListPayload {
    /// Validate and convert into the stored form. Timestamps are truncated to whole seconds.
    pub fn into_value_list(self) -> anyhow::Result<ValueList> {
        anyhow::ensure!(!self.host.is_empty(), "value list host must be non-empty");
        anyhow::ensure!(!self.plugin.is_empty(), "value list plugin must be non-empty");
        anyhow::ensure!(!self.type_.is_empty(), "value list type must be non-empty");
        anyhow::ensure!(
            self.time.is_finite() && self.time >= 0.0,
            "value list time must be a non-negative number, got {}",
            self.time
        );
        anyhow::ensure!(
            self.time < MAX_SECS,
            "value list time out of range: {}",
            self.time
        );
        anyhow::ensure!(
            self.interval.is_finite() && self.interval >= 0.0 && self.interval < MAX_SECS,
            "value list interval must be a non-negative number of seconds, got {}",
            self.interval
        );
        anyhow::ensure!(
            !self.dsnames.is_empty(),
            "value list {}/{} has no data sources",
            self.plugin,
            self.type_
        );
        anyhow::ensure!(
            self.dsnames.len() == self.dstypes.len() && self.dsnames.len() == self.values.len(),
            "value list {}/{}: dsnames ({}), dstypes ({}) and values ({}) differ in length",
            self.plugin,
            self.type_,
            self.dsnames.len(),
            self.dstypes.len(),
            self.values.len()
        );
        let dstypes = self
            .dstypes
            .iter()
            .map(|s| s.parse::<ValueKind>())
            .collect::<Result<Vec<_>, _>>()?;
        let meta = self.meta.map(|m| {
            m.into_iter()
                .map(|(k, v)| {
                    let v = match v {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    };
                    (k, v)
                })
                .collect()
        });
        Ok(ValueList {
            time_ms: (self.time.trunc() as i64) * 1000,
            interval: self.interval.trunc() as i64,
            host: self.host,
            plugin: self.plugin,
            plugin_instance: self.plugin_instance,
            type_: self.type_,
            type_instance: self.type_instance,
            dsnames: self.dsnames,
            dstypes,
            values: self.values,
            meta,
        })
    }
}

/// One stored row of `value_list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValueList {
    pub time_ms: i64,
    pub interval: i64,
    pub host: String,
    pub plugin: String,
    pub plugin_instance: String,
    #[serde(rename = "type")]
    pub type_: String,
    pub type_instance: String,
    pub dsnames: Vec<String>,
    pub dstypes: Vec<ValueKind>,
    pub values: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<BTreeMap<String, String>>,
}

impl ValueList {
    /// `plugin[.plugin_instance].type[.type_instance]`, the CSV column prefix.
    pub fn prefix(&self) -> String {
        let mut out = self.plugin.clone();
        if !self.plugin_instance.is_empty() {
            out.push('.');
            out.push_str(&self.plugin_instance);
        }
        out.push('.');
        out.push_str(&self.type_);
        if !self.type_instance.is_empty() {
            out.push('.');
            out.push_str(&self.type_instance);
        }
        out
    }
}
