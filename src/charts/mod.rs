// Chart catalogue: one query spec per chart kind, one generic builder.
// Fetches descriptors and samples from the value store, then runs the transform engine.

pub mod pages;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::models::{Chart, DataSourceDescriptor, Series, TimeWindow};
use crate::transform::{self, TransformMode};
use crate::value_repo::{RowRange, SeriesFilter, ValueRepo, pivot};

/// Per-request chart window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ChartParams {
    /// Seconds of history to show.
    pub duration: u64,
    /// End of the window, epoch seconds. Defaults to now.
    #[serde(default)]
    pub end: Option<i64>,
}

impl ChartParams {
    pub fn new(duration: u64, end: Option<i64>) -> Self {
        Self { duration, end }
    }

    pub fn window(&self) -> anyhow::Result<TimeWindow> {
        let end = match self.end {
            Some(secs) => Some(
                DateTime::<Utc>::from_timestamp(secs, 0)
                    .ok_or_else(|| anyhow::anyhow!("end out of range: {}", secs))?,
            ),
            None => None,
        };
        TimeWindow::ending_at(self.duration, end)
    }
}

/// Where a chart's data-source list comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorSource {
    /// dsnames/dstypes of one row; each row is a vector sample.
    RowColumns,
    /// Distinct type_instances present at a baseline row's timestamp; each becomes a data source
    /// fed by `values[0]` of its rows.
    TypeInstances {
        /// Baseline row must have this type_instance (e.g. every CPU reports "idle").
        baseline_type_instance: Option<String>,
        /// List type_instances from this plugin_instance only (e.g. core "0").
        listing_plugin_instance: Option<String>,
        /// Run the engine once per type_instance instead of pivoting them into shared samples.
        per_instance: bool,
    },
}

/// Everything that differs between chart kinds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartQuerySpec {
    pub title: String,
    pub plugin: String,
    pub plugin_instance: Option<String>,
    pub type_: Option<String>,
    pub type_instance: Option<String>,
    pub descriptors: DescriptorSource,
    pub mode: TransformMode,
    pub ylabel: Option<String>,
}

impl ChartQuerySpec {
    /// CPU utilization in percent; all cores summed, or one core.
    pub fn cpu(core: Option<u32>) -> Self {
        Self {
            title: match core {
                Some(n) => format!("Processor {} Utilization", n),
                None => "Processor Utilization".to_string(),
            },
            plugin: "cpu".to_string(),
            plugin_instance: core.map(|n| n.to_string()),
            type_: None,
            type_instance: None,
            descriptors: DescriptorSource::TypeInstances {
                baseline_type_instance: Some("idle".to_string()),
                listing_plugin_instance: Some("0".to_string()),
                per_instance: false,
            },
            mode: TransformMode::Percentage,
            ylabel: None,
        }
    }

    /// Per-disk operations or octets (`type` is `disk_ops` / `disk_octets`).
    pub fn disk(disk: &str, type_: &str) -> Self {
        Self {
            title: format!("{} {}", type_, disk),
            plugin: "disk".to_string(),
            plugin_instance: Some(disk.to_string()),
            type_: Some(type_.to_string()),
            type_instance: None,
            descriptors: DescriptorSource::RowColumns,
            mode: TransformMode::Pairwise,
            ylabel: None,
        }
    }

    /// Per-interface traffic (`if_octets`).
    pub fn interface(interface: &str) -> Self {
        Self::typed("interface", "if_octets", interface, None)
    }

    /// Virtual memory paging, e.g. `vmpage_io` for `memory` / `swap`.
    pub fn vmem(type_: &str, type_instance: &str) -> Self {
        Self::typed("vmem", type_, type_instance, Some("Pages"))
    }

    pub fn load() -> Self {
        Self {
            title: "Load".to_string(),
            plugin: "load".to_string(),
            plugin_instance: None,
            type_: None,
            type_instance: None,
            descriptors: DescriptorSource::RowColumns,
            mode: TransformMode::Direct,
            ylabel: None,
        }
    }

    /// Memory usage by kind (used, buffered, cached, free), one series per kind.
    pub fn memory() -> Self {
        Self {
            title: "memory".to_string(),
            plugin: "memory".to_string(),
            plugin_instance: None,
            type_: None,
            type_instance: None,
            descriptors: DescriptorSource::TypeInstances {
                baseline_type_instance: None,
                listing_plugin_instance: None,
                per_instance: true,
            },
            mode: TransformMode::Direct,
            ylabel: Some("Bytes".to_string()),
        }
    }

    fn typed(plugin: &str, type_: &str, type_instance: &str, ylabel: Option<&str>) -> Self {
        Self {
            title: format!("{} {}", type_, type_instance),
            plugin: plugin.to_string(),
            plugin_instance: None,
            type_: Some(type_.to_string()),
            type_instance: Some(type_instance.to_string()),
            descriptors: DescriptorSource::RowColumns,
            mode: TransformMode::Pairwise,
            ylabel: ylabel.map(str::to_string),
        }
    }

    fn filter(&self, host: &str) -> SeriesFilter {
        SeriesFilter {
            plugin: self.plugin.clone(),
            host: Some(host.to_string()),
            plugin_instance: self.plugin_instance.clone(),
            type_: self.type_.clone(),
            type_instance: self.type_instance.clone(),
            meta: Vec::new(),
        }
    }

    /// Descriptor rows are read past the first row for delta charts; that row never yields a point.
    fn descriptor_offset(&self) -> u32 {
        if self.mode == TransformMode::Direct { 0 } else { 1 }
    }
}

/// Build one chart for `host`. No data in the window gives an empty chart, not an error.
pub async fn build_chart(
    repo: &ValueRepo,
    host: &str,
    params: &ChartParams,
    spec: &ChartQuerySpec,
) -> anyhow::Result<Chart> {
    let window = params.window()?;
    let range = RowRange::Window(window);
    let base = spec.filter(host);
    let offset = spec.descriptor_offset();

    let (descriptors, series) = match &spec.descriptors {
        DescriptorSource::RowColumns => {
            let Some(descriptors) = repo.get_descriptors(&base, range, offset).await? else {
                return Ok(empty_chart(spec));
            };
            let rows = repo.get_rows(&base, range).await?;
            let samples = pivot::vector_samples(&rows)?;
            let series = transform::compute_series(&samples, &descriptors, spec.mode)?;
            (descriptors, series)
        }
        DescriptorSource::TypeInstances {
            baseline_type_instance,
            listing_plugin_instance,
            per_instance,
        } => {
            let mut baseline_filter = base.clone();
            if let Some(ti) = baseline_type_instance {
                baseline_filter.type_instance = Some(ti.clone());
            }
            let Some(baseline) = repo
                .get_row_at_offset(&baseline_filter, range, offset)
                .await?
            else {
                return Ok(empty_chart(spec));
            };

            let mut listing_filter = base.clone();
            if let Some(pi) = listing_plugin_instance {
                listing_filter.plugin_instance = Some(pi.clone());
            }
            let descriptors = repo
                .get_type_instance_descriptors(&listing_filter, RowRange::At(baseline.time_ms))
                .await?;
            if descriptors.is_empty() {
                return Ok(empty_chart(spec));
            }

            let series = if *per_instance {
                per_instance_series(repo, &base, range, &descriptors, spec.mode).await?
            } else {
                let names: Vec<String> = descriptors.iter().map(|d| d.name.clone()).collect();
                let rows = repo.get_rows(&base, range).await?;
                let samples = pivot::type_instance_samples(&rows, &names)?;
                transform::compute_series(&samples, &descriptors, spec.mode)?
            };
            (descriptors, series)
        }
    };

    tracing::debug!(
        host,
        plugin = %spec.plugin,
        sources = descriptors.len(),
        points = series.iter().map(|s| s.points.len()).sum::<usize>(),
        "chart built"
    );

    Ok(Chart {
        title: spec.title.clone(),
        ylabel: spec.ylabel.clone(),
        legend: descriptors.into_iter().map(|d| d.name).collect(),
        series,
    })
}

/// One engine run per type_instance, each over its own rows and timestamps.
async fn per_instance_series(
    repo: &ValueRepo,
    base: &SeriesFilter,
    range: RowRange,
    descriptors: &[DataSourceDescriptor],
    mode: TransformMode,
) -> anyhow::Result<Vec<Series>> {
    let mut out = Vec::with_capacity(descriptors.len());
    for d in descriptors {
        let filter = base.clone().type_instance(d.name.clone());
        let rows = repo.get_rows(&filter, range).await?;
        let samples = pivot::type_instance_samples(&rows, std::slice::from_ref(&d.name))?;
        let mut series =
            transform::compute_series(&samples, std::slice::from_ref(d), mode)?;
        out.append(&mut series);
    }
    Ok(out)
}

fn empty_chart(spec: &ChartQuerySpec) -> Chart {
    Chart::empty(spec.title.clone(), spec.ylabel.as_deref())
}
