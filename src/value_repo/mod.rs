// SQLite value store. One value_list row per collectd value list.
// dsnames/dstypes/meta are JSON text; values are a versioned wincode BLOB.

mod blob;
mod filter;
pub mod pivot;

pub use filter::{RowRange, SeriesFilter};

use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

use crate::models::{DataSourceDescriptor, SystemSummary, ValueKind, ValueList};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::instrument;

const ROW_COLUMNS: &str = "time, interval, host, plugin, plugin_instance, type, type_instance, dsnames, dstypes, vals, meta";

pub struct ValueRepo {
    pool: SqlitePool,
    retention_ms: i64,
}

impl ValueRepo {
    pub async fn connect(path: &str, retention_days: u32, max_pool_size: u32) -> anyhow::Result<Self> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        let retention_ms = (retention_days as i64) * 24 * 60 * 60 * 1000;
        Ok(Self { pool, retention_ms })
    }

    pub async fn init(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS value_list (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                time INTEGER NOT NULL,
                interval INTEGER NOT NULL,
                host TEXT NOT NULL,
                plugin TEXT NOT NULL,
                plugin_instance TEXT NOT NULL DEFAULT '',
                type TEXT NOT NULL,
                type_instance TEXT NOT NULL DEFAULT '',
                dsnames TEXT NOT NULL,
                dstypes TEXT NOT NULL,
                vals BLOB NOT NULL,
                meta TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_value_list_plugin_host_time ON value_list(plugin, host, time)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_value_list_time ON value_list(time)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    #[instrument(skip(self, lists), fields(repo = "values", operation = "save_value_lists", lists_count = lists.len()))]
    pub async fn save_value_lists(&self, lists: &[ValueList]) -> anyhow::Result<()> {
        if lists.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for vl in lists {
            let dsnames = serde_json::to_string(&vl.dsnames)?;
            let dstypes = serde_json::to_string(&vl.dstypes)?;
            let vals = blob::encode_values(&vl.values)?;
            let meta = vl.meta.as_ref().map(serde_json::to_string).transpose()?;
            sqlx::query(
                "INSERT INTO value_list (time, interval, host, plugin, plugin_instance, type, type_instance, dsnames, dstypes, vals, meta) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
            )
            .bind(vl.time_ms)
            .bind(vl.interval)
            .bind(&vl.host)
            .bind(&vl.plugin)
            .bind(&vl.plugin_instance)
            .bind(&vl.type_)
            .bind(&vl.type_instance)
            .bind(&dsnames)
            .bind(&dstypes)
            .bind(&vals)
            .bind(&meta)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Rows matching `filter` within `range`. Order: ascending by time.
    #[instrument(skip(self), fields(repo = "values", operation = "get_rows"))]
    pub async fn get_rows(
        &self,
        filter: &SeriesFilter,
        range: RowRange,
    ) -> anyhow::Result<Vec<ValueList>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ROW_COLUMNS} FROM value_list WHERE 1 = 1"));
        filter.push_conditions(&mut qb);
        range.push_conditions(&mut qb);
        qb.push(" ORDER BY time ASC, id ASC");

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_row(&row)?);
        }
        Ok(out)
    }

    /// The `offset`-th row (by time) matching `filter` within `range`.
    #[instrument(skip(self), fields(repo = "values", operation = "get_row_at_offset"))]
    pub async fn get_row_at_offset(
        &self,
        filter: &SeriesFilter,
        range: RowRange,
        offset: u32,
    ) -> anyhow::Result<Option<ValueList>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ROW_COLUMNS} FROM value_list WHERE 1 = 1"));
        filter.push_conditions(&mut qb);
        range.push_conditions(&mut qb);
        qb.push(" ORDER BY time ASC, id ASC LIMIT 1 OFFSET ")
            .push_bind(offset as i64);

        let row = qb.build().fetch_optional(&self.pool).await?;
        row.map(|r| Self::parse_row(&r)).transpose()
    }

    /// Data sources described by the `offset`-th matching row's dsnames/dstypes.
    pub async fn get_descriptors(
        &self,
        filter: &SeriesFilter,
        range: RowRange,
        offset: u32,
    ) -> anyhow::Result<Option<Vec<DataSourceDescriptor>>> {
        let Some(row) = self.get_row_at_offset(filter, range, offset).await? else {
            return Ok(None);
        };
        Ok(Some(descriptors_of(&row)))
    }

    /// One descriptor per distinct type_instance matching `filter` at `range`, ordered by name.
    /// Kind comes from the first dstype of the row.
    #[instrument(skip(self), fields(repo = "values", operation = "get_type_instance_descriptors"))]
    pub async fn get_type_instance_descriptors(
        &self,
        filter: &SeriesFilter,
        range: RowRange,
    ) -> anyhow::Result<Vec<DataSourceDescriptor>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT type_instance, MIN(dstypes) AS dstypes FROM value_list WHERE 1 = 1",
        );
        filter.push_conditions(&mut qb);
        range.push_conditions(&mut qb);
        qb.push(" GROUP BY type_instance ORDER BY type_instance");

        let rows = qb.build().fetch_all(&self.pool).await?;
        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row.try_get("type_instance")?;
            let dstypes: String = row.try_get("dstypes")?;
            let dstypes: Vec<ValueKind> = serde_json::from_str(&dstypes)
                .map_err(|e| anyhow::anyhow!("dstypes of {:?}: {}", name, e))?;
            let Some(kind) = dstypes.first().copied() else {
                anyhow::bail!("type_instance {:?} has no dstypes", name);
            };
            out.push(DataSourceDescriptor::new(name, kind));
        }
        Ok(out)
    }

    /// Distinct plugins with stored data.
    pub async fn list_plugins(&self) -> anyhow::Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT plugin FROM value_list ORDER BY plugin",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn list_hosts(&self, plugin: &str) -> anyhow::Result<Vec<String>> {
        self.distinct_column("host", plugin).await
    }

    pub async fn list_plugin_instances(&self, plugin: &str) -> anyhow::Result<Vec<String>> {
        self.distinct_column("plugin_instance", plugin).await
    }

    pub async fn list_types(&self, plugin: &str) -> anyhow::Result<Vec<String>> {
        self.distinct_column("type", plugin).await
    }

    pub async fn list_type_instances(&self, plugin: &str) -> anyhow::Result<Vec<String>> {
        self.distinct_column("type_instance", plugin).await
    }

    /// dsnames of any row for `plugin`/`type`; None when there is no such row.
    pub async fn get_dsnames(&self, plugin: &str, type_: &str) -> anyhow::Result<Option<Vec<String>>> {
        let row = sqlx::query_scalar::<_, String>(
            "SELECT dsnames FROM value_list WHERE plugin = $1 AND type = $2 LIMIT 1",
        )
        .bind(plugin)
        .bind(type_)
        .fetch_optional(&self.pool)
        .await?;
        row.map(|s| serde_json::from_str(&s).map_err(anyhow::Error::from))
            .transpose()
    }

    #[instrument(skip(self), fields(repo = "values", operation = "list_systems"))]
    pub async fn list_systems(&self) -> anyhow::Result<Vec<SystemSummary>> {
        let hosts = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT host FROM value_list WHERE host <> '' ORDER BY host",
        )
        .fetch_all(&self.pool)
        .await?;
        let mut out = Vec::with_capacity(hosts.len());
        for host in hosts {
            out.push(self.summarize(host).await?);
        }
        Ok(out)
    }

    pub async fn get_system(&self, host: &str) -> anyhow::Result<Option<SystemSummary>> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM (SELECT 1 FROM value_list WHERE host = $1 LIMIT 1)",
        )
        .bind(host)
        .fetch_one(&self.pool)
        .await?;
        if exists == 0 {
            return Ok(None);
        }
        Ok(Some(self.summarize(host.to_string()).await?))
    }

    async fn summarize(&self, host: String) -> anyhow::Result<SystemSummary> {
        let plugins = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT plugin FROM value_list WHERE host = $1 ORDER BY plugin",
        )
        .bind(&host)
        .fetch_all(&self.pool)
        .await?;
        let lprocs = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT plugin_instance) FROM value_list WHERE host = $1 AND plugin = 'cpu'",
        )
        .bind(&host)
        .fetch_one(&self.pool)
        .await?;
        let disks = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT plugin_instance FROM value_list WHERE host = $1 AND plugin = 'disk' AND plugin_instance <> '' ORDER BY plugin_instance",
        )
        .bind(&host)
        .fetch_all(&self.pool)
        .await?;
        let interfaces = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT type_instance FROM value_list WHERE host = $1 AND plugin = 'interface' AND type_instance <> '' ORDER BY type_instance",
        )
        .bind(&host)
        .fetch_all(&self.pool)
        .await?;
        Ok(SystemSummary {
            name: host,
            plugins,
            lprocs: u32::try_from(lprocs)?,
            interfaces,
            disks,
        })
    }

    /// Delete rows older than the retention period. Returns rows removed.
    #[instrument(skip(self), fields(repo = "values", operation = "prune_old_data"))]
    pub async fn prune_old_data(&self) -> anyhow::Result<u64> {
        let cutoff = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)?
            .as_millis() as i64)
            - self.retention_ms;
        let r = sqlx::query("DELETE FROM value_list WHERE time < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "values", operation = "vacuum"))]
    pub async fn vacuum(&self) -> anyhow::Result<()> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    async fn distinct_column(&self, column: &'static str, plugin: &str) -> anyhow::Result<Vec<String>> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM value_list WHERE plugin = $1 AND {column} <> '' ORDER BY {column}"
        );
        let rows = sqlx::query_scalar::<_, String>(&sql)
            .bind(plugin)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    fn parse_row(row: &sqlx::sqlite::SqliteRow) -> anyhow::Result<ValueList> {
        let time_ms: i64 = row.try_get("time")?;
        let interval: i64 = row.try_get("interval")?;
        let host: String = row.try_get("host")?;
        let plugin: String = row.try_get("plugin")?;
        let plugin_instance: String = row.try_get("plugin_instance")?;
        let type_: String = row.try_get("type")?;
        let type_instance: String = row.try_get("type_instance")?;
        let dsnames: String = row.try_get("dsnames")?;
        let dstypes: String = row.try_get("dstypes")?;
        let vals: Vec<u8> = row.try_get("vals")?;
        let meta: Option<String> = row.try_get("meta")?;

        let dsnames: Vec<String> = serde_json::from_str(&dsnames)
            .map_err(|e| anyhow::anyhow!("dsnames at {}: {}", time_ms, e))?;
        let dstypes: Vec<ValueKind> = serde_json::from_str(&dstypes)
            .map_err(|e| anyhow::anyhow!("dstypes at {}: {}", time_ms, e))?;
        let values = blob::decode_values(&vals)?;
        let meta: Option<BTreeMap<String, String>> = meta
            .map(|m| serde_json::from_str(&m))
            .transpose()
            .map_err(|e| anyhow::anyhow!("meta at {}: {}", time_ms, e))?;

        Ok(ValueList {
            time_ms,
            interval,
            host,
            plugin,
            plugin_instance,
            type_,
            type_instance,
            dsnames,
            dstypes,
            values,
            meta,
        })
    }
}

/// Descriptors from a stored row's dsnames/dstypes (already validated on write).
/// Category is the row's instance: plugin_instance, else type_instance, else none.
fn descriptors_of(row: &ValueList) -> Vec<DataSourceDescriptor> {
    let category = [&row.plugin_instance, &row.type_instance]
        .into_iter()
        .find(|s| !s.is_empty());
    row.dsnames
        .iter()
        .zip(&row.dstypes)
        .map(|(name, kind)| {
            let d = DataSourceDescriptor::new(name.clone(), *kind);
            match category {
                Some(c) => d.with_category(c.clone()),
                None => d,
            }
        })
        .collect()
}
