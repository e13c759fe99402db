use std::io;

use thiserror::Error;

pub mod app;
pub mod clients;
pub mod commands;
pub mod config;
pub mod extractors;
pub mod model;
pub mod storage;
pub mod website;

use app::{MovieApp, WebsiteSettings};
use clients::omdb_client::{LookupError, MovieLookup, OmdbClient};
use config::Config;
use storage::StorageError;
use website::WebsiteError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Website(#[from] WebsiteError),

    #[error("terminal I/O failed: {0}")]
    Io(#[from] io::Error),
}

pub async fn run(config: Config) -> Result<(), AppError> {
    let storage = storage::open_storage(&config.storage)?;
    log::info!("Using movie storage at {}", config.storage.display());

    let lookup: Option<Box<dyn MovieLookup>> = match config
        .omdb_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
    {
        Some(api_key) => Some(Box::new(OmdbClient::new(api_key)?)),
        None => {
            log::warn!("OMDB_API_KEY is not set. Adding movies is disabled.");
            None
        }
    };

    let mut movie_app = MovieApp::new(storage, lookup, WebsiteSettings::from(&config));
    movie_app.run(io::stdin().lock(), io::stdout()).await
}
