use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

use crate::{
    clients::omdb_client::{LookupError, MovieLookup},
    commands::{movie_stats, random_movie, rank_movies, search_movies},
    config::Config,
    storage::{MovieStorage, Mutation},
    website, AppError,
};

const MENU: [&str; 10] = [
    "0. Exit",
    "1. List movies",
    "2. Add movie",
    "3. Delete movie",
    "4. Update movie",
    "5. Stats",
    "6. Random movie",
    "7. Search movie",
    "8. Movies sorted by rating",
    "9. Generate website",
];

#[derive(Debug, Clone)]
pub struct WebsiteSettings {
    pub template: PathBuf,
    pub output: PathBuf,
    pub title: String,
}

impl From<&Config> for WebsiteSettings {
    fn from(config: &Config) -> Self {
        Self {
            template: config.template.clone(),
            output: config.output.clone(),
            title: config.title.clone(),
        }
    }
}

/// The interactive menu. Talks to storage only through [`MovieStorage`].
pub struct MovieApp {
    storage: Box<dyn MovieStorage>,
    lookup: Option<Box<dyn MovieLookup>>,
    website: WebsiteSettings,
}

impl MovieApp {
    pub fn new(
        storage: Box<dyn MovieStorage>,
        lookup: Option<Box<dyn MovieLookup>>,
        website: WebsiteSettings,
    ) -> Self {
        Self {
            storage,
            lookup,
            website,
        }
    }

    /// Runs the menu until the user picks "Exit" or the input ends.
    ///
    /// Failures of a single command are reported to the user and the menu
    /// carries on. Only failing to talk to the user ends the loop with an error.
    pub async fn run<R: BufRead, W: Write>(
        &mut self,
        mut input: R,
        mut output: W,
    ) -> Result<(), AppError> {
        writeln!(output, "********** My Movies Database **********\n")?;

        loop {
            writeln!(output, "Menu:")?;
            for entry in MENU {
                writeln!(output, "{}", entry)?;
            }

            let choice = match prompt(&mut input, &mut output, "\nEnter choice (0-9): ")? {
                Some(choice) => choice,
                None => break,
            };

            let result = match choice.trim() {
                "0" => break,
                "1" => self.command_list_movies(&mut output),
                "2" => self.command_add_movie(&mut input, &mut output).await,
                "3" => self.command_delete_movie(&mut input, &mut output),
                "4" => self.command_update_movie(&mut input, &mut output),
                "5" => self.command_movie_stats(&mut output),
                "6" => self.command_random_movie(&mut output),
                "7" => self.command_search_movie(&mut input, &mut output),
                "8" => self.command_movies_ranking(&mut output),
                "9" => self.command_generate_website(&mut output),
                _ => {
                    writeln!(output, "Invalid choice! Please enter a number between 0-9.\n")?;
                    continue;
                }
            };

            match result {
                Err(AppError::Io(e)) => return Err(AppError::Io(e)),
                Err(e) => {
                    log::error!("Command {} failed: {}", choice.trim(), e);
                    writeln!(output, "Error: {}", e)?;
                }
                Ok(()) => {}
            }

            if prompt(&mut input, &mut output, "\nPress enter to continue\n")?.is_none() {
                break;
            }
        }

        writeln!(output, "Bye")?;
        Ok(())
    }

    fn command_list_movies<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;

        writeln!(output, "\n{} movies in total", movies.len())?;
        for (title, movie) in &movies {
            writeln!(output, "{}: {}", title, movie.rating)?;
        }
        Ok(())
    }

    async fn command_add_movie<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), AppError> {
        let query = prompt(input, output, "\nEnter new movie name: ")?.unwrap_or_default();
        let query = query.trim();
        if query.is_empty() {
            writeln!(output, "Movie name cannot be empty.")?;
            return Ok(());
        }

        let lookup = match &self.lookup {
            Some(lookup) => lookup,
            None => {
                writeln!(
                    output,
                    "Adding movies needs an OMDb API key. Set OMDB_API_KEY and restart."
                )?;
                return Ok(());
            }
        };

        match lookup.fetch_movie(query).await {
            Ok(details) => {
                self.storage.add_movie(
                    &details.title,
                    details.year,
                    details.rating,
                    &details.poster,
                )?;
                writeln!(
                    output,
                    "Movie {} ({}) added with rating {}.",
                    details.title, details.year, details.rating
                )?;
            }
            Err(LookupError::NotFound(_)) => {
                writeln!(output, "Movie '{}' does not exist.", query)?;
            }
            Err(e @ LookupError::Unavailable(_)) => {
                log::warn!("{}", e);
                writeln!(
                    output,
                    "The movie service cannot be reached right now. Please try again later."
                )?;
            }
            Err(e) => {
                log::error!("Lookup for '{}' failed: {}", query, e);
                writeln!(output, "Could not add movie: {}", e)?;
            }
        }
        Ok(())
    }

    fn command_delete_movie<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), AppError> {
        let title = prompt(input, output, "\nEnter movie name to delete: ")?.unwrap_or_default();
        let title = title.trim();

        match self.storage.delete_movie(title)? {
            Mutation::Applied => writeln!(output, "Movie {} successfully deleted", title)?,
            Mutation::NotFound => writeln!(output, "Movie '{}' not found.", title)?,
        }
        Ok(())
    }

    fn command_update_movie<R: BufRead, W: Write>(
        &mut self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), AppError> {
        let title = prompt(input, output, "\nEnter movie name: ")?.unwrap_or_default();
        let title = title.trim();
        let rating = prompt(input, output, "Enter new movie rating (0-10): ")?.unwrap_or_default();

        let rating = match rating.trim().parse::<f64>() {
            Ok(rating) if rating.is_finite() => rating,
            _ => {
                writeln!(output, "Invalid rating! Please enter a number.")?;
                return Ok(());
            }
        };

        match self.storage.update_movie(title, rating)? {
            Mutation::Applied => writeln!(output, "Movie {} successfully updated", title)?,
            Mutation::NotFound => writeln!(output, "Movie '{}' not found.", title)?,
        }
        Ok(())
    }

    fn command_movie_stats<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;

        match movie_stats(&movies) {
            None => writeln!(output, "No movies in storage.")?,
            Some(stats) => {
                writeln!(output)?;
                writeln!(output, "Average rating: {}", stats.average)?;
                writeln!(output, "Median rating: {}", stats.median)?;
                writeln!(output, "Best movie: {} ({})", stats.best.0, stats.best.1)?;
                writeln!(output, "Worst movie: {} ({})", stats.worst.0, stats.worst.1)?;
            }
        }
        Ok(())
    }

    fn command_random_movie<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;

        match random_movie(&movies, &mut rand::thread_rng()) {
            None => writeln!(output, "No movies available.")?,
            Some((title, movie)) => writeln!(
                output,
                "\nYour movie for tonight: {}, it's rated {}",
                title, movie.rating
            )?,
        }
        Ok(())
    }

    fn command_search_movie<R: BufRead, W: Write>(
        &self,
        input: &mut R,
        output: &mut W,
    ) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;
        let query = prompt(input, output, "\nEnter part of movie name: ")?.unwrap_or_default();

        let found = search_movies(&movies, &query);
        if found.is_empty() {
            writeln!(output, "No matching movies found.")?;
        }
        for (title, movie) in found {
            writeln!(output, "{} ({}): {}", title, movie.year, movie.rating)?;
        }
        Ok(())
    }

    fn command_movies_ranking<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;

        writeln!(output)?;
        for (title, movie) in rank_movies(&movies) {
            writeln!(output, "{} ({}): {}", title, movie.year, movie.rating)?;
        }
        Ok(())
    }

    fn command_generate_website<W: Write>(&self, output: &mut W) -> Result<(), AppError> {
        let movies = self.storage.list_movies()?;

        website::generate(
            &self.website.template,
            &self.website.output,
            &self.website.title,
            &movies,
        )?;
        writeln!(output, "Website was generated successfully.")?;
        Ok(())
    }
}

/// Prints `message` and reads one line. `None` means the input has ended.
fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    message: &str,
) -> Result<Option<String>, AppError> {
    write!(output, "{}", message)?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
}
