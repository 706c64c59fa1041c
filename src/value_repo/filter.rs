// Row selection for value_list queries: identity filters + time range.

use sqlx::{QueryBuilder, Sqlite};

use crate::models::TimeWindow;

/// Identity columns a query is restricted to. `None` = any value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeriesFilter {
    pub plugin: String,
    pub host: Option<String>,
    pub plugin_instance: Option<String>,
    pub type_: Option<String>,
    pub type_instance: Option<String>,
    /// `(key, value)` pairs the row's meta map must contain.
    pub meta: Vec<(String, String)>,
}

impl SeriesFilter {
    pub fn plugin(plugin: impl Into<String>) -> Self {
        Self {
            plugin: plugin.into(),
            ..Default::default()
        }
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    pub fn plugin_instance(mut self, v: impl Into<String>) -> Self {
        self.plugin_instance = Some(v.into());
        self
    }

    pub fn type_(mut self, v: impl Into<String>) -> Self {
        self.type_ = Some(v.into());
        self
    }

    pub fn type_instance(mut self, v: impl Into<String>) -> Self {
        self.type_instance = Some(v.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta.push((key.into(), value.into()));
        self
    }

    /// Appends ` AND ...` conditions for every set field. Caller has already pushed a WHERE.
    pub(super) fn push_conditions<'a>(&'a self, qb: &mut QueryBuilder<'a, Sqlite>) {
        qb.push(" AND plugin = ").push_bind(self.plugin.as_str());
        if let Some(host) = &self.host {
            qb.push(" AND host = ").push_bind(host.as_str());
        }
        if let Some(v) = &self.plugin_instance {
            qb.push(" AND plugin_instance = ").push_bind(v.as_str());
        }
        if let Some(v) = &self.type_ {
            qb.push(" AND type = ").push_bind(v.as_str());
        }
        if let Some(v) = &self.type_instance {
            qb.push(" AND type_instance = ").push_bind(v.as_str());
        }
        for (key, value) in &self.meta {
            qb.push(" AND json_extract(meta, ")
                .push_bind(meta_path(key))
                .push(") = ")
                .push_bind(value.as_str());
        }
    }
}

/// Time bounds on the `time` column (epoch ms).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRange {
    /// `time > start AND time <= end`.
    Window(TimeWindow),
    /// `time >= since_ms`.
    Since(i64),
    /// `time = at_ms`.
    At(i64),
}

impl RowRange {
    pub(super) fn push_conditions(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match *self {
            RowRange::Window(w) => {
                qb.push(" AND time > ").push_bind(w.start_ms());
                qb.push(" AND time <= ").push_bind(w.end_ms());
            }
            RowRange::Since(since_ms) => {
                qb.push(" AND time >= ").push_bind(since_ms);
            }
            RowRange::At(at_ms) => {
                qb.push(" AND time = ").push_bind(at_ms);
            }
        }
    }
}

/// JSON path for a meta key; quoted so keys with dots stay one segment.
/// Keys never contain `"`: callers reject them.
fn meta_path(key: &str) -> String {
    format!("$.\"{}\"", key)
}
