// Shared test helpers
#![allow(dead_code)]

use tempfile::TempDir;
use yams_wui::models::{ValueKind, ValueList};
use yams_wui::value_repo::ValueRepo;

/// Fixed chart window end (epoch seconds) used across tests.
pub const END_SECS: i64 = 1_700_000_000;

/// Fresh, initialized repo in a temp dir. Keep the TempDir alive for the test's duration.
pub async fn temp_repo() -> (TempDir, ValueRepo) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("values.db");
    let repo = ValueRepo::connect(path.to_str().unwrap(), 3, 2)
        .await
        .unwrap();
    repo.init().await.unwrap();
    (dir, repo)
}

/// A stored value list at `time_secs`.
pub struct Row {
    pub host: &'static str,
    pub plugin: &'static str,
    pub plugin_instance: &'static str,
    pub type_: &'static str,
    pub type_instance: &'static str,
}

impl Row {
    pub fn new(host: &'static str, plugin: &'static str, type_: &'static str) -> Self {
        Self {
            host,
            plugin,
            plugin_instance: "",
            type_,
            type_instance: "",
        }
    }

    pub fn plugin_instance(mut self, v: &'static str) -> Self {
        self.plugin_instance = v;
        self
    }

    pub fn type_instance(mut self, v: &'static str) -> Self {
        self.type_instance = v;
        self
    }

    pub fn at(&self, time_secs: i64, sources: &[(&str, ValueKind, f64)]) -> ValueList {
        ValueList {
            time_ms: time_secs * 1000,
            interval: 10,
            host: self.host.to_string(),
            plugin: self.plugin.to_string(),
            plugin_instance: self.plugin_instance.to_string(),
            type_: self.type_.to_string(),
            type_instance: self.type_instance.to_string(),
            dsnames: sources.iter().map(|(n, _, _)| n.to_string()).collect(),
            dstypes: sources.iter().map(|(_, k, _)| *k).collect(),
            values: sources.iter().map(|(_, _, v)| *v).collect(),
            meta: None,
        }
    }

    /// Single data source named "value".
    pub fn value(&self, time_secs: i64, kind: ValueKind, value: f64) -> ValueList {
        self.at(time_secs, &[("value", kind, value)])
    }
}

/// Two CPU cores reporting idle/user jiffies at END-30, END-20, END-10.
/// Per core: idle 100,190,280 and user 0,10,20.
pub fn two_core_cpu_rows(host: &'static str) -> Vec<ValueList> {
    let mut rows = Vec::new();
    for (i, t) in [END_SECS - 30, END_SECS - 20, END_SECS - 10].into_iter().enumerate() {
        for core in ["0", "1"] {
            let base = Row::new(host, "cpu", "cpu").plugin_instance(core);
            rows.push(
                base.type_instance("idle")
                    .value(t, ValueKind::Derive, 100.0 + 90.0 * i as f64),
            );
            let base = Row::new(host, "cpu", "cpu").plugin_instance(core);
            rows.push(
                base.type_instance("user")
                    .value(t, ValueKind::Derive, 10.0 * i as f64),
            );
        }
    }
    rows
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}
