//! Pluggable persistence for the movie collection.
//!
//! Every backend implements [`MovieStorage`] over a single flat file. The file
//! is the source of truth: mutations load the whole collection, change it in
//! memory and rewrite the file in full. Backends differ only in whether they
//! keep a resident copy between calls:
//!
//! - [`JsonStorage`] reads the file once when opened and serves every call from
//!   that copy. Another process writing the same file will not be noticed.
//! - [`CsvStorage`] keeps nothing and re-reads the file on every call.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;

use crate::model::movie::MovieCollection;

pub mod csv_storage;
pub mod json_storage;

pub use csv_storage::CsvStorage;
pub use json_storage::JsonStorage;

/// Result of a mutation that targets an existing title.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Applied,
    /// The title is not in the collection. Nothing was written.
    NotFound,
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("could not access storage file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("storage file {} is not a valid JSON movie collection: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage file {} is not valid CSV: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("malformed record {record} in {}: {reason}", .path.display())]
    MalformedRecord {
        path: PathBuf,
        record: String,
        reason: String,
    },

    /// NaN and infinities cannot be written to JSON, so no backend stores them.
    #[error("rating {rating} for '{title}' is not a finite number")]
    InvalidRating { title: String, rating: f64 },

    #[error("unsupported storage format for {} (expected a .json or .csv file)", .0.display())]
    UnsupportedFormat(PathBuf),
}

impl StorageError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        StorageError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Operations every storage backend provides.
///
/// A write is always visible to the next read on the same instance.
pub trait MovieStorage {
    fn list_movies(&self) -> Result<MovieCollection, StorageError>;

    /// Inserts the movie, overwriting any existing record with the same title.
    fn add_movie(
        &mut self,
        title: &str,
        year: i32,
        rating: f64,
        poster: &str,
    ) -> Result<(), StorageError>;

    fn delete_movie(&mut self, title: &str) -> Result<Mutation, StorageError>;

    /// Replaces only the rating of an existing movie.
    fn update_movie(&mut self, title: &str, rating: f64) -> Result<Mutation, StorageError>;
}

/// Opens the backend matching the extension of `path`.
pub fn open_storage(path: impl AsRef<Path>) -> Result<Box<dyn MovieStorage>, StorageError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("json") => Ok(Box::new(JsonStorage::open(path)?)),
        Some("csv") => Ok(Box::new(CsvStorage::open(path)?)),
        _ => Err(StorageError::UnsupportedFormat(path.to_path_buf())),
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<(), StorageError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))
        }
        _ => Ok(()),
    }
}

/// Writes `contents` to a sibling temp file and renames it over `path`, so a
/// failed write never leaves a truncated storage file behind.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), StorageError> {
    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);

    fs::write(&tmp_path, contents).map_err(|e| StorageError::io(&tmp_path, e))?;
    if let Err(e) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(StorageError::io(path, e));
    }

    log::debug!("Saved {} bytes to {}", contents.len(), path.display());
    Ok(())
}

/// Checked before any read or write so both backends refuse the same values.
pub(crate) fn check_rating(title: &str, rating: f64) -> Result<(), StorageError> {
    if rating.is_finite() {
        Ok(())
    } else {
        Err(StorageError::InvalidRating {
            title: title.to_string(),
            rating,
        })
    }
}

pub(crate) fn log_not_found(title: &str) {
    log::warn!("Movie '{}' not found.", title);
}
