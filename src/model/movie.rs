use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A collection of movies keyed by title, kept in insertion order.
pub type MovieCollection = IndexMap<String, Movie>;

#[derive(Debug, Clone, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "Year")]
    pub year: i32,
    #[serde(rename = "Rating")]
    pub rating: f64,
    #[serde(rename = "Poster")]
    pub poster: String,
}

impl Movie {
    pub fn new(year: i32, rating: f64, poster: impl Into<String>) -> Self {
        Self {
            year,
            rating,
            poster: poster.into(),
        }
    }

    pub fn to_csvable_array(&self, title: &str) -> Vec<String> {
        vec![
            title.to_string(),
            self.year.to_string(),
            // Debug keeps the trailing ".0" on whole ratings, as existing files have it.
            format!("{:?}", self.rating),
            self.poster.clone(),
        ]
    }

    pub fn csv_titles() -> Vec<&'static str> {
        vec!["Title", "Year", "Rating", "Poster"]
    }
}

/// A movie as returned by a metadata lookup, before it is stored.
#[derive(Debug, Clone, PartialEq)]
pub struct MovieDetails {
    pub title: String,
    pub year: i32,
    pub rating: f64,
    pub poster: String,
}
