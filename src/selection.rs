// Chart source selection: plugin/type/hosts picked in the UI -> CSV data URLs.
// Passed explicitly per request; nothing is kept server-side between requests.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSelection {
    pub plugin: String,
    #[serde(default)]
    pub plugin_instance: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub type_instance: String,
    pub hosts: Vec<String>,
    #[serde(default)]
    pub dsnames: Vec<String>,
    #[serde(default)]
    pub meta: BTreeMap<String, String>,
    #[serde(default)]
    pub percentage: bool,
}

impl SourceSelection {
    /// One `data.csv` URL per host, in host order. `meta` is only emitted along with `dsnames`.
    pub fn data_urls(&self) -> anyhow::Result<Vec<String>> {
        anyhow::ensure!(!self.plugin.is_empty(), "selection has no plugin");
        anyhow::ensure!(!self.type_.is_empty(), "selection has no type");
        anyhow::ensure!(!self.hosts.is_empty(), "selection has no hosts");

        let mut out = Vec::with_capacity(self.hosts.len());
        for host in &self.hosts {
            let mut url = format!("data.csv/{}/{}?type={}", self.plugin, host, self.type_);
            if !self.plugin_instance.is_empty() {
                url.push_str(&format!("&plugin_instance={}", self.plugin_instance));
            }
            if !self.type_instance.is_empty() {
                url.push_str(&format!("&type_instance={}", self.type_instance));
            }
            // Meta filters only narrow an explicit column selection.
            if !self.dsnames.is_empty() {
                for dsname in &self.dsnames {
                    url.push_str(&format!("&dsnames={}", dsname));
                }
                for key in self.meta.keys() {
                    url.push_str(&format!("&meta={}", key));
                }
                for (key, value) in &self.meta {
                    url.push_str(&format!("&{}={}", key, value));
                }
            }
            if self.percentage {
                url.push_str("&percentage=1");
            }
            out.push(url);
        }
        Ok(out)
    }

    /// `existing` followed by this selection's URLs not already present.
    pub fn append_urls(&self, existing: &[String]) -> anyhow::Result<Vec<String>> {
        let mut out = existing.to_vec();
        for url in self.data_urls()? {
            if !out.contains(&url) {
                out.push(url);
            }
        }
        Ok(out)
    }
}

/// Pin the y axis at 100 only when every source is a percentage.
pub fn y_max(urls: &[String]) -> Option<f64> {
    if urls.iter().all(|u| u.contains("percentage=1")) {
        Some(100.0)
    } else {
        None
    }
}
