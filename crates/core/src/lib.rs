pub mod config;
pub mod config_loader;

pub use config::{
    AppConfig, DatabaseConfig, DeadletterConfig, LoaderConfig, RetrieverConfig, SchedulerConfig,
    StagingConfig,
};
pub use config_loader::ConfigLoader;
