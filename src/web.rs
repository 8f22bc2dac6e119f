#![cfg(not(tarpaulin_include))]

use exam_results::app;
use exam_results::config::Config;
use exam_results::logging;

/// Main entry point for the exam results web application
///
/// Configuration is read from the environment (`EXAM_DATA_DIR`, `HOST`,
/// `PORT`, `ADMIN_USERNAME`, `ADMIN_PASSWORD` or `ADMIN_PASSWORD_HASH`,
/// `SESSION_TTL_SECS`, `STATIC_DIR`).
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("info");

    let config = Config::from_env()?;
    log::info!("Serving exam results from {}", config.data_dir.display());

    app::run(config).await
}
