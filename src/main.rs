use anyhow::Context;
use clap::Parser;

use movieshelf::config::Config;

mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; real environment variables still apply.
    let dotenv = dotenvy::dotenv();
    logging::setup_logging();
    if let Ok(path) = dotenv {
        log::debug!("Loaded environment from {}", path.display());
    }

    let config = Config::parse();
    let storage = config.storage.clone();

    movieshelf::run(config)
        .await
        .with_context(|| format!("movieshelf stopped (storage: {})", storage.display()))
}
