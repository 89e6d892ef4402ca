#![cfg(not(tarpaulin_include))]

use tercih::{Config, app};

/// Main entry point for the web application
///
/// Reads configuration from the environment (and `.env` when present),
/// then serves the pages and the JSON API until the process is stopped.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    app::run(config).await
}
