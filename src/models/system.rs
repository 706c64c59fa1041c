// Per-host overview derived from stored value lists

use serde::{Deserialize, Serialize};

/// What a host reports: plugins with data, logical processors, disks and interfaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemSummary {
    pub name: String,
    pub plugins: Vec<String>,
    pub lprocs: u32,
    pub interfaces: Vec<String>,
    pub disks: Vec<String>,
}
