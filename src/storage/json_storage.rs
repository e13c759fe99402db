use std::{
    fs,
    path::{Path, PathBuf},
};

use indexmap::IndexMap;
use serde::Serialize;
use serde_json::{ser::PrettyFormatter, Serializer, Value};

use crate::model::movie::{Movie, MovieCollection};

use super::{
    check_rating, ensure_parent_dir, log_not_found, write_atomically, MovieStorage, Mutation,
    StorageError,
};

/// JSON file backend.
///
/// The collection is read once in [`JsonStorage::open`] and kept resident.
/// Reads are served from memory and never notice out-of-band changes to the
/// file; every mutation rewrites the file from the resident copy.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    movies: MovieCollection,
}

impl JsonStorage {
    /// Opens `path`, creating it with an empty collection if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();

        if !path.exists() {
            ensure_parent_dir(&path)?;
            write_atomically(&path, b"{}")?;
            log::info!("Created empty movie storage at {}", path.display());
        }

        let movies = Self::load(&path)?;
        log::debug!("Loaded {} movies from {}", movies.len(), path.display());

        Ok(Self { path, movies })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<MovieCollection, StorageError> {
        let content = fs::read_to_string(path).map_err(|e| StorageError::io(path, e))?;
        let entries: IndexMap<String, Value> =
            serde_json::from_str(&content).map_err(|source| StorageError::Json {
                path: path.to_path_buf(),
                source,
            })?;

        entries
            .into_iter()
            .map(|(title, value)| match serde_json::from_value::<Movie>(value) {
                Ok(movie) => Ok((title, movie)),
                Err(e) => Err(StorageError::MalformedRecord {
                    path: path.to_path_buf(),
                    record: format!("'{}'", title),
                    reason: e.to_string(),
                }),
            })
            .collect()
    }

    fn save(&self, movies: &MovieCollection) -> Result<(), StorageError> {
        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"    "));
        movies
            .serialize(&mut serializer)
            .map_err(|source| StorageError::Json {
                path: self.path.clone(),
                source,
            })?;

        write_atomically(&self.path, &buffer)
    }

    /// Persists `movies` and only then makes it the resident copy, so a failed
    /// write leaves the cache as it was.
    fn commit(&mut self, movies: MovieCollection) -> Result<(), StorageError> {
        self.save(&movies)?;
        self.movies = movies;
        Ok(())
    }
}

impl MovieStorage for JsonStorage {
    fn list_movies(&self) -> Result<MovieCollection, StorageError> {
        Ok(self.movies.clone())
    }

    fn add_movie(
        &mut self,
        title: &str,
        year: i32,
        rating: f64,
        poster: &str,
    ) -> Result<(), StorageError> {
        check_rating(title, rating)?;
        let mut movies = self.movies.clone();
        movies.insert(title.to_string(), Movie::new(year, rating, poster));
        self.commit(movies)
    }

    fn delete_movie(&mut self, title: &str) -> Result<Mutation, StorageError> {
        if !self.movies.contains_key(title) {
            log_not_found(title);
            return Ok(Mutation::NotFound);
        }

        let mut movies = self.movies.clone();
        movies.shift_remove(title);
        self.commit(movies)?;
        Ok(Mutation::Applied)
    }

    fn update_movie(&mut self, title: &str, rating: f64) -> Result<Mutation, StorageError> {
        check_rating(title, rating)?;
        let mut movies = self.movies.clone();
        match movies.get_mut(title) {
            Some(movie) => movie.rating = rating,
            None => {
                log_not_found(title);
                return Ok(Mutation::NotFound);
            }
        }

        self.commit(movies)?;
        Ok(Mutation::Applied)
    }
}
