// CSV export: one column per data source, one row per stored sample after the first.
// Header: timestamp,<host with '.' -> '_'>.<plugin[.plugin_instance].type[.type_instance]>.<dsname>,...
// The first row is always dropped: it has no previous row to compute rates against.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::models::ValueList;
use crate::transform::percentage_of;
use crate::value_repo::{RowRange, SeriesFilter, ValueRepo, pivot};

const MS_PER_HOUR: i64 = 60 * 60 * 1000;

/// Parsed `data.csv/{plugin}/{host}` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvQuery {
    pub plugin: String,
    pub host: String,
    pub plugin_instance: Option<String>,
    pub type_: Option<String>,
    pub type_instance: Option<String>,
    /// Columns to keep; empty keeps all.
    pub dsnames: Vec<String>,
    pub meta: Vec<(String, String)>,
    pub percentage: bool,
    pub time_range_hours: u32,
}

impl CsvQuery {
    /// Build from query-string pairs. Repeated keys: `dsnames=a&dsnames=b`; meta filters are
    /// named by `meta=key` and valued by `key=value`.
    pub fn from_pairs(
        plugin: &str,
        host: &str,
        pairs: &[(String, String)],
        default_time_range_hours: u32,
    ) -> anyhow::Result<Self> {
        let first = |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        };

        let mut meta = Vec::new();
        for (_, key) in pairs.iter().filter(|(k, _)| k == "meta") {
            anyhow::ensure!(!key.contains('"'), "meta key {:?} must not contain '\"'", key);
            let Some(value) = first(key.as_str()) else {
                anyhow::bail!("meta key {:?} has no value", key);
            };
            meta.push((key.clone(), value));
        }

        let time_range_hours = match first("time_range") {
            Some(v) => v
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("time_range {:?}: {}", v, e))?,
            None => default_time_range_hours,
        };
        anyhow::ensure!(time_range_hours > 0, "time_range must be > 0 hours");

        Ok(Self {
            plugin: plugin.to_string(),
            host: host.to_string(),
            plugin_instance: first("plugin_instance"),
            type_: first("type"),
            type_instance: first("type_instance"),
            dsnames: pairs
                .iter()
                .filter(|(k, _)| k == "dsnames")
                .map(|(_, v)| v.clone())
                .collect(),
            meta,
            percentage: first("percentage").as_deref() == Some("1"),
            time_range_hours,
        })
    }

    fn identity_filter(&self) -> SeriesFilter {
        SeriesFilter {
            plugin: self.plugin.clone(),
            host: None,
            plugin_instance: self.plugin_instance.clone(),
            type_: self.type_.clone(),
            type_instance: self.type_instance.clone(),
            meta: self.meta.clone(),
        }
    }

    /// Rows summed for percentage totals: every host, any type_instance and meta.
    fn totals_filter(&self) -> SeriesFilter {
        SeriesFilter {
            plugin: self.plugin.clone(),
            host: None,
            plugin_instance: self.plugin_instance.clone(),
            type_: self.type_.clone(),
            type_instance: None,
            meta: Vec::new(),
        }
    }
}

/// Render the CSV body, or None when the query selects nothing to plot.
#[tracing::instrument(skip(repo), fields(plugin = %query.plugin, host = %query.host))]
pub async fn export_csv(
    repo: &ValueRepo,
    query: &CsvQuery,
    now_ms: i64,
) -> anyhow::Result<Option<String>> {
    let identity = query.identity_filter();

    // dsnames/dstypes are consistent within a plugin/type; any row describes them.
    let Some(first) = repo.get_row_at_offset(&identity, RowRange::Since(0), 0).await? else {
        return Ok(None);
    };
    let columns: Vec<usize> = first
        .dsnames
        .iter()
        .enumerate()
        .filter(|(_, name)| query.dsnames.is_empty() || query.dsnames.contains(name))
        .map(|(i, _)| i)
        .collect();
    if columns.is_empty() {
        return Ok(None);
    }

    let since_ms = now_ms - i64::from(query.time_range_hours) * MS_PER_HOUR;
    let rows = repo
        .get_rows(&identity.clone().host(query.host.clone()), RowRange::Since(since_ms))
        .await?;
    if rows.is_empty() {
        return Ok(None);
    }

    let totals = if query.percentage {
        let all = repo
            .get_rows(&query.totals_filter(), RowRange::Since(since_ms))
            .await?;
        Some(pivot::elementwise_totals(&all))
    } else {
        None
    };

    Ok(Some(render(&query.host, &first, &columns, &rows, totals.as_ref())?))
}

/// Per-element totals at each timestamp.
type Totals = BTreeMap<i64, Vec<f64>>;

fn render(
    host: &str,
    first: &ValueList,
    columns: &[usize],
    rows: &[ValueList],
    totals: Option<&Totals>,
) -> anyhow::Result<String> {
    let host_label = host.replace('.', "_");
    let prefix = first.prefix();

    let mut csv = String::from("timestamp");
    for &i in columns {
        write!(csv, ",{}.{}.{}", host_label, prefix, first.dsnames[i])?;
    }
    csv.push('\n');

    // In percentage mode rows without a total at their timestamp are left out before pairing.
    let rows: Vec<(&ValueList, Option<&Vec<f64>>)> = match totals {
        Some(totals) => rows
            .iter()
            .filter_map(|r| totals.get(&r.time_ms).map(|t| (r, Some(t))))
            .collect(),
        None => rows.iter().map(|r| (r, None)).collect(),
    };

    for pair in rows.windows(2) {
        let ((prev, prev_total), (curr, curr_total)) = (pair[0], pair[1]);
        write!(csv, "{}", curr.time_ms)?;
        for &i in columns {
            let (Some(value), Some(previous)) = (curr.values.get(i), prev.values.get(i)) else {
                anyhow::bail!(
                    "row at {} ms has {} values, expected at least {}",
                    curr.time_ms,
                    curr.values.len().min(prev.values.len()),
                    i + 1
                );
            };
            let delta = first.dstypes[i].is_delta();
            // Counter wraparound is not corrected.
            let datum = match (curr_total, prev_total) {
                (Some(ct), Some(pt)) => {
                    let total = element(ct, i);
                    if delta {
                        percentage_of(value - previous, total - element(pt, i))
                    } else {
                        percentage_of(*value, total)
                    }
                }
                _ if delta => value - previous,
                _ => *value,
            };
            write!(csv, ",{}", datum)?;
        }
        csv.push('\n');
    }
    Ok(csv)
}

fn element(values: &[f64], i: usize) -> f64 {
    values.get(i).copied().unwrap_or(0.0)
}
