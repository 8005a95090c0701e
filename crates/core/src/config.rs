use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub retriever: RetrieverConfig,
    pub staging: StagingConfig,
    pub loader: LoaderConfig,
    pub deadletter: DeadletterConfig,
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieverConfig {
    /// Base URL of the historical-data source. The symbol is appended
    /// as a path segment.
    pub base_url: String,
    pub user_agent: String,
    /// Extra headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,
    pub timeout_secs: u64,
    /// Additional attempts after the first failure, not total attempts.
    pub max_retries: u32,
    pub retry_base_delay_secs: u64,
    pub rate_limit_per_second: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingConfig {
    /// Root directory holding staged/, done/ and deadletter/ subdirectories.
    pub root: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Records per upsert transaction. At 8 columns per row this stays
    /// far below the Postgres bind-parameter ceiling (~65k).
    pub batch_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeadletterConfig {
    pub retry_interval_hours: i64,
    pub retry_ceiling: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    pub enabled: bool,
    pub cron_schedule: String,
    pub max_concurrent_fetches: usize,
    pub cycle_timeout_secs: u64,
    pub fetch_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "postgresql://localhost/stock_track".to_string(),
                max_connections: 10,
            },
            retriever: RetrieverConfig {
                base_url: "https://finance.example.com/quote".to_string(),
                user_agent: concat!("stock-track/", env!("CARGO_PKG_VERSION")).to_string(),
                headers: HashMap::new(),
                timeout_secs: 30,
                max_retries: 3,
                retry_base_delay_secs: 5,
                rate_limit_per_second: 2,
            },
            staging: StagingConfig {
                root: "data/staging".to_string(),
            },
            loader: LoaderConfig { batch_size: 1000 },
            deadletter: DeadletterConfig {
                retry_interval_hours: 24,
                retry_ceiling: 5,
            },
            scheduler: SchedulerConfig {
                enabled: true,
                cron_schedule: "0 */5 * * * *".to_string(),
                max_concurrent_fetches: 5,
                cycle_timeout_secs: 240,
                fetch_timeout_secs: 60,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_policy() {
        let config = AppConfig::default();

        assert_eq!(config.retriever.max_retries, 3);
        assert_eq!(config.retriever.retry_base_delay_secs, 5);
        assert_eq!(config.loader.batch_size, 1000);
        assert_eq!(config.deadletter.retry_interval_hours, 24);
        assert_eq!(config.deadletter.retry_ceiling, 5);
        assert_eq!(config.scheduler.max_concurrent_fetches, 5);
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = AppConfig::default();
        let json = serde_json::to_string(&config).expect("serialization failed");
        let back: AppConfig = serde_json::from_str(&json).expect("deserialization failed");

        assert_eq!(back.database.url, config.database.url);
        assert_eq!(back.scheduler.cron_schedule, config.scheduler.cron_schedule);
        assert_eq!(back.deadletter.retry_ceiling, config.deadletter.retry_ceiling);
    }
}
