use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub charts: ChartsConfig,
    pub ingest: IngestConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

fn default_retention_days() -> u32 {
    3
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartsConfig {
    /// Window length for chart pages when the request gives no `duration`.
    pub default_duration_secs: u64,
    /// Window length for CSV export when the request gives no `time_range`.
    #[serde(default = "default_csv_time_range_hours")]
    pub csv_time_range_hours: u32,
}

fn default_csv_time_range_hours() -> u32 {
    1
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    /// Flush posted value lists to the DB once this many are buffered.
    pub flush_rate: u64,
    /// Flush whatever is buffered at least this often.
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,
}

/// Upper bound for ingest.flush_rate; the writer channel holds twice this many lists.
const MAX_FLUSH_RATE: u64 = 1_000_000;

fn default_flush_interval_secs() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct MaintenanceConfig {
    #[serde(default = "default_prune_interval_secs")]
    pub prune_interval_secs: u64,
    /// Cron expression for VACUUM (local time), e.g. "0 0 3 * * *". Overrides vacuum_interval_secs.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
    #[serde(default = "default_vacuum_interval_secs")]
    pub vacuum_interval_secs: u64,
}

fn default_prune_interval_secs() -> u64 {
    3600
}

fn default_vacuum_interval_secs() -> u64 {
    24 * 3600
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            prune_interval_secs: default_prune_interval_secs(),
            vacuum_schedule: None,
            vacuum_interval_secs: default_vacuum_interval_secs(),
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        anyhow::ensure!(
            self.database.retention_days > 0,
            "database.retention_days must be > 0, got {}",
            self.database.retention_days
        );
        anyhow::ensure!(
            self.charts.default_duration_secs > 0,
            "charts.default_duration_secs must be > 0, got {}",
            self.charts.default_duration_secs
        );
        anyhow::ensure!(
            self.charts.csv_time_range_hours > 0,
            "charts.csv_time_range_hours must be > 0, got {}",
            self.charts.csv_time_range_hours
        );
        anyhow::ensure!(
            self.ingest.flush_rate > 0 && self.ingest.flush_rate <= MAX_FLUSH_RATE,
            "ingest.flush_rate must be between 1 and {}, got {}",
            MAX_FLUSH_RATE,
            self.ingest.flush_rate
        );
        anyhow::ensure!(
            self.ingest.flush_interval_secs > 0,
            "ingest.flush_interval_secs must be > 0, got {}",
            self.ingest.flush_interval_secs
        );
        anyhow::ensure!(
            self.maintenance.prune_interval_secs > 0,
            "maintenance.prune_interval_secs must be > 0, got {}",
            self.maintenance.prune_interval_secs
        );
        anyhow::ensure!(
            self.maintenance.vacuum_interval_secs > 0,
            "maintenance.vacuum_interval_secs must be > 0, got {}",
            self.maintenance.vacuum_interval_secs
        );
        if let Some(schedule) = &self.maintenance.vacuum_schedule {
            anyhow::ensure!(
                <cron::Schedule as std::str::FromStr>::from_str(schedule).is_ok(),
                "maintenance.vacuum_schedule is not a valid cron expression: {:?}",
                schedule
            );
        }
        Ok(())
    }
}
