mod app;
mod classifier;
mod config;
mod domain;
mod infrastructure;
mod tasks;
mod youtube;

use anyhow::Result;
use infrastructure::{directories, instance_guard::InstanceGuard, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories, &config.youtube.token_path)?;
    logging::init_tracing(&config, &paths)?;
    let _instance = InstanceGuard::acquire(&paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown::install_signal_handlers(shutdown.clone());

    let app = app::SweeperApp::initialize(config, paths, shutdown.clone()).await?;
    app.run().await
}
