use serde::Deserialize;

use crate::{clients::omdb_client::LookupError, model::movie::MovieDetails};

const NOT_AVAILABLE: &str = "N/A";

/// Body of an OMDb title lookup. Every field is a string, including numbers.
#[derive(Debug, Deserialize)]
struct OmdbResponse {
    #[serde(rename = "Response")]
    response: String,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Year")]
    year: Option<String>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<String>,
    #[serde(rename = "Poster")]
    poster: Option<String>,
    #[serde(rename = "Error")]
    error: Option<String>,
}

#[derive(Debug)]
pub struct MovieExtractor {}

impl MovieExtractor {
    pub fn extract_movie_from_json(body: &str, query: &str) -> Result<MovieDetails, LookupError> {
        let response: OmdbResponse = serde_json::from_str(body)
            .map_err(|e| LookupError::InvalidResponse(format!("{} (body: {:.200})", e, body)))?;

        if !response.response.eq_ignore_ascii_case("true") {
            let message = response
                .error
                .unwrap_or_else(|| "unknown error".to_string());
            if message.to_ascii_lowercase().contains("not found") {
                return Err(LookupError::NotFound(query.to_string()));
            }
            return Err(LookupError::Rejected(message));
        }

        let title = response
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| LookupError::InvalidResponse(format!("no title for '{}'", query)))?;

        Ok(MovieDetails {
            title,
            year: response.year.as_deref().map_or(0, MovieExtractor::extract_year),
            rating: response
                .imdb_rating
                .as_deref()
                .map_or(0.0, MovieExtractor::extract_rating),
            poster: response
                .poster
                .filter(|p| p != NOT_AVAILABLE)
                .unwrap_or_default(),
        })
    }

    /// Release year from values such as `"2010"`, `"2008–2013"` or `"2019–"`.
    /// Anything without a leading year becomes 0.
    fn extract_year(year: &str) -> i32 {
        let digits: String = year
            .trim()
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .take(4)
            .collect();
        digits.parse().unwrap_or(0)
    }

    /// `"N/A"`, garbage and non-finite values such as `"NaN"` become 0.0.
    fn extract_rating(rating: &str) -> f64 {
        rating
            .trim()
            .parse()
            .ok()
            .filter(|r: &f64| r.is_finite())
            .unwrap_or(0.0)
    }
}
