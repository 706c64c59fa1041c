// System pages: fan a chart kind out over a host's instances (cores, disks, interfaces).
// Results are keyed by instance name for the caller to lay out.

use std::collections::BTreeMap;

use super::{ChartParams, ChartQuerySpec, build_chart};
use crate::models::{Chart, SystemSummary};
use crate::value_repo::ValueRepo;

pub const DISK_TYPES: [&str; 2] = ["disk_ops", "disk_octets"];
pub const VMEM_INSTANCES: [&str; 2] = ["memory", "swap"];

/// `cpu` (all cores) plus `cpu0`..`cpuN` per logical processor.
pub async fn cpu_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, Chart>> {
    let mut out = BTreeMap::new();
    out.insert(
        "cpu".to_string(),
        build_chart(repo, &system.name, params, &ChartQuerySpec::cpu(None)).await?,
    );
    for core in 0..system.lprocs {
        let chart = build_chart(repo, &system.name, params, &ChartQuerySpec::cpu(Some(core))).await?;
        out.insert(format!("cpu{}", core), chart);
    }
    Ok(out)
}

/// `disk_ops` and `disk_octets`, each keyed by disk.
pub async fn disk_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, BTreeMap<String, Chart>>> {
    let mut out = BTreeMap::new();
    for type_ in DISK_TYPES {
        let mut charts = BTreeMap::new();
        for disk in &system.disks {
            let chart = build_chart(repo, &system.name, params, &ChartQuerySpec::disk(disk, type_)).await?;
            charts.insert(disk.clone(), chart);
        }
        out.insert(type_.to_string(), charts);
    }
    Ok(out)
}

pub async fn interface_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, Chart>> {
    let mut out = BTreeMap::new();
    for interface in &system.interfaces {
        let chart = build_chart(repo, &system.name, params, &ChartQuerySpec::interface(interface)).await?;
        out.insert(interface.clone(), chart);
    }
    Ok(out)
}

pub async fn load_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, Chart>> {
    let chart = build_chart(repo, &system.name, params, &ChartQuerySpec::load()).await?;
    Ok(BTreeMap::from([("load".to_string(), chart)]))
}

pub async fn memory_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, Chart>> {
    let chart = build_chart(repo, &system.name, params, &ChartQuerySpec::memory()).await?;
    Ok(BTreeMap::from([("memory".to_string(), chart)]))
}

/// Page-in/page-out for RAM and swap.
pub async fn vmem_page(
    repo: &ValueRepo,
    system: &SystemSummary,
    params: &ChartParams,
) -> anyhow::Result<BTreeMap<String, Chart>> {
    let mut out = BTreeMap::new();
    for instance in VMEM_INSTANCES {
        let chart = build_chart(
            repo,
            &system.name,
            params,
            &ChartQuerySpec::vmem("vmpage_io", instance),
        )
        .await?;
        out.insert(instance.to_string(), chart);
    }
    Ok(out)
}
