pub mod env;
mod loader;

pub use env::{
    AppConfig, DirectoryConfig, RemovalMode, RunMode, ScanConfig, ScanTarget, SchedulerConfig,
};
pub use loader::load_config;
