//! Read-only views over a movie collection used by the menu.

use rand::{seq::IteratorRandom, Rng};

use crate::model::movie::{Movie, MovieCollection};

pub mod stats;

pub use stats::{movie_stats, MovieStats};

pub type Entry<'a> = (&'a str, &'a Movie);

fn entries(movies: &MovieCollection) -> impl Iterator<Item = Entry<'_>> {
    movies.iter().map(|(title, movie)| (title.as_str(), movie))
}

/// Movies whose title contains `query`, ignoring case, in collection order.
pub fn search_movies<'a>(movies: &'a MovieCollection, query: &str) -> Vec<Entry<'a>> {
    let query = query.trim().to_lowercase();
    entries(movies)
        .filter(|(title, _)| title.to_lowercase().contains(&query))
        .collect()
}

/// All movies, best rated first. Equal ratings keep collection order.
pub fn rank_movies(movies: &MovieCollection) -> Vec<Entry<'_>> {
    let mut ranking: Vec<_> = entries(movies).collect();
    ranking.sort_by(|(_, a), (_, b)| b.rating.total_cmp(&a.rating));
    ranking
}

pub fn random_movie<'a, R: Rng + ?Sized>(
    movies: &'a MovieCollection,
    rng: &mut R,
) -> Option<Entry<'a>> {
    entries(movies).choose(rng)
}
