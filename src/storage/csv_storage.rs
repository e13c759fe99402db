use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};

use crate::model::movie::{Movie, MovieCollection};

use super::{
    check_rating, ensure_parent_dir, log_not_found, write_atomically, MovieStorage, Mutation,
    StorageError,
};

/// CSV file backend.
///
/// Holds no copy of the collection: every operation reads the whole file and
/// mutations write it back, so it always reflects what is on disk.
#[derive(Debug, Clone)]
pub struct CsvStorage {
    path: PathBuf,
}

/// Positions of the known columns within the header row.
struct Columns {
    title: usize,
    year: usize,
    rating: usize,
    poster: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord, path: &Path) -> Result<Self, StorageError> {
        let find = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| StorageError::MalformedRecord {
                    path: path.to_path_buf(),
                    record: "header".to_string(),
                    reason: format!("missing column {}", name),
                })
        };

        Ok(Columns {
            title: find("Title")?,
            year: find("Year")?,
            rating: find("Rating")?,
            poster: find("Poster")?,
        })
    }
}

impl CsvStorage {
    /// Opens `path`, creating it with only the header row if it does not exist.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let storage = Self { path: path.into() };

        if !storage.path.exists() {
            ensure_parent_dir(&storage.path)?;
            storage.save(&MovieCollection::new())?;
            log::info!("Created empty movie storage at {}", storage.path.display());
        }

        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn csv_error(&self, source: csv::Error) -> StorageError {
        StorageError::Csv {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, line: usize, title: &str, reason: String) -> StorageError {
        StorageError::MalformedRecord {
            path: self.path.clone(),
            record: format!("at line {} ('{}')", line, title),
            reason,
        }
    }

    fn load(&self) -> Result<MovieCollection, StorageError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .from_path(&self.path)
            .map_err(|e| self.csv_error(e))?;

        let headers = reader.headers().map_err(|e| self.csv_error(e))?.clone();
        let columns = Columns::from_headers(&headers, &self.path)?;

        let mut movies = MovieCollection::new();
        for (index, row) in reader.records().enumerate() {
            let record = row.map_err(|e| self.csv_error(e))?;
            // Line 1 is the header.
            let line = index + 2;
            let field = |column: usize| record.get(column).unwrap_or_default();

            let title = field(columns.title);
            let year_field = field(columns.year);
            let rating_field = field(columns.rating);

            let year = year_field.trim().parse::<i32>().map_err(|e| {
                self.malformed(line, title, format!("invalid Year {:?}: {}", year_field, e))
            })?;
            let rating = rating_field.trim().parse::<f64>().map_err(|e| {
                self.malformed(line, title, format!("invalid Rating {:?}: {}", rating_field, e))
            })?;

            movies.insert(
                title.to_string(),
                Movie::new(year, rating, field(columns.poster)),
            );
        }

        log::debug!("Loaded {} movies from {}", movies.len(), self.path.display());
        Ok(movies)
    }

    fn save(&self, movies: &MovieCollection) -> Result<(), StorageError> {
        let mut writer = WriterBuilder::new()
            .terminator(Terminator::CRLF)
            .from_writer(vec![]);

        writer
            .write_record(Movie::csv_titles())
            .map_err(|e| self.csv_error(e))?;
        for (title, movie) in movies.iter() {
            writer
                .write_record(movie.to_csvable_array(title))
                .map_err(|e| self.csv_error(e))?;
        }

        let buffer = writer
            .into_inner()
            .map_err(|e| StorageError::io(&self.path, e.into_error()))?;

        write_atomically(&self.path, &buffer)
    }
}

impl MovieStorage for CsvStorage {
    fn list_movies(&self) -> Result<MovieCollection, StorageError> {
        self.load()
    }

    fn add_movie(
        &mut self,
        title: &str,
        year: i32,
        rating: f64,
        poster: &str,
    ) -> Result<(), StorageError> {
        check_rating(title, rating)?;
        let mut movies = self.load()?;
        movies.insert(title.to_string(), Movie::new(year, rating, poster));
        self.save(&movies)
    }

    fn delete_movie(&mut self, title: &str) -> Result<Mutation, StorageError> {
        let mut movies = self.load()?;

        if movies.shift_remove(title).is_none() {
            log_not_found(title);
            return Ok(Mutation::NotFound);
        }

        self.save(&movies)?;
        Ok(Mutation::Applied)
    }

    fn update_movie(&mut self, title: &str, rating: f64) -> Result<Mutation, StorageError> {
        check_rating(title, rating)?;
        let mut movies = self.load()?;

        match movies.get_mut(title) {
            Some(movie) => movie.rating = rating,
            None => {
                log_not_found(title);
                return Ok(Mutation::NotFound);
            }
        }

        self.save(&movies)?;
        Ok(Mutation::Applied)
    }
}
