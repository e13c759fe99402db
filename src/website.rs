use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::model::movie::MovieCollection;

pub const TITLE_PLACEHOLDER: &str = "__TEMPLATE_TITLE__";
pub const MOVIE_GRID_PLACEHOLDER: &str = "__TEMPLATE_MOVIE_GRID__";

/// The `.html` suffix turns on Tera's autoescaping.
const MOVIE_GRID_TEMPLATE_NAME: &str = "movie_grid.html";
const MOVIE_GRID_TEMPLATE: &str = "{% for movie in movies %}<li>
<div class='movie'>
<img class='movie-poster' src='{{ movie.poster }}' title='{{ movie.title }}'/>
<div class='movie-title'>{{ movie.title }}</div>
<div class='movie-year'>{{ movie.year }}</div>
</div>
</li>
{% endfor %}";

#[derive(Debug, Error)]
pub enum WebsiteError {
    #[error("could not read website template {}: {source}", .path.display())]
    Template {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("could not render movie grid: {0}")]
    Render(#[from] tera::Error),

    #[error("could not write website to {}: {source}", .path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Serialize)]
struct GridMovie<'a> {
    title: &'a str,
    year: i32,
    poster: &'a str,
}

/// Fills the template placeholders with the site title and one grid item
/// per movie.
pub fn render(
    template: &str,
    title: &str,
    movies: &MovieCollection,
) -> Result<String, WebsiteError> {
    let grid = movie_grid(movies)?;

    Ok(template
        .replace(TITLE_PLACEHOLDER, &tera::escape_html(title))
        .replace(MOVIE_GRID_PLACEHOLDER, &grid))
}

pub fn generate(
    template_path: &Path,
    output_path: &Path,
    title: &str,
    movies: &MovieCollection,
) -> Result<(), WebsiteError> {
    let template = fs::read_to_string(template_path).map_err(|source| WebsiteError::Template {
        path: template_path.to_path_buf(),
        source,
    })?;
    let html = render(&template, title, movies)?;

    let output_error = |source: io::Error| WebsiteError::Output {
        path: output_path.to_path_buf(),
        source,
    };
    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(output_error)?;
    }
    fs::write(output_path, html).map_err(output_error)?;

    log::info!(
        "Generated website with {} movies at {}",
        movies.len(),
        output_path.display()
    );
    Ok(())
}

fn movie_grid(movies: &MovieCollection) -> Result<String, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(MOVIE_GRID_TEMPLATE_NAME, MOVIE_GRID_TEMPLATE)?;

    let grid_movies: Vec<_> = movies
        .iter()
        .map(|(title, movie)| GridMovie {
            title,
            year: movie.year,
            poster: &movie.poster,
        })
        .collect();

    let mut context = Context::new();
    context.insert("movies", &grid_movies);
    tera.render(MOVIE_GRID_TEMPLATE_NAME, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::movie::Movie;
    use select::{
        document::Document,
        predicate::{Class, Name},
    };
    use tempfile::TempDir;

    const TEMPLATE: &str =
        "<html><head><title>__TEMPLATE_TITLE__</title></head><body><ol>__TEMPLATE_MOVIE_GRID__</ol></body></html>";

    fn collection() -> MovieCollection {
        let mut movies = MovieCollection::new();
        movies.insert("Inception".to_string(), Movie::new(2010, 8.8, "inception.jpg"));
        movies.insert(
            "Tom & Jerry's <Movie>".to_string(),
            Movie::new(1992, 5.4, "https://example.com/a.jpg?x=1&y=2"),
        );
        movies
    }

    #[test]
    fn renders_one_item_per_movie() {
        let html = render(TEMPLATE, "My Movies", &collection()).unwrap();
        let document = Document::from(html.as_str());

        let titles: Vec<_> = document
            .find(Class("movie-title"))
            .map(|n| n.text())
            .collect();
        assert_eq!(titles, vec!["Inception", "Tom & Jerry's <Movie>"]);

        let years: Vec<_> = document.find(Class("movie-year")).map(|n| n.text()).collect();
        assert_eq!(years, vec!["2010", "1992"]);

        let posters: Vec<_> = document
            .find(Name("img"))
            .filter_map(|n| n.attr("src").map(str::to_string))
            .collect();
        assert_eq!(
            posters,
            vec!["inception.jpg", "https://example.com/a.jpg?x=1&y=2"]
        );

        let page_title = document.find(Name("title")).next().map(|n| n.text());
        assert_eq!(page_title.as_deref(), Some("My Movies"));
    }

    #[test]
    fn escapes_markup_in_titles() {
        let html = render(TEMPLATE, "<b>", &collection()).unwrap();

        assert!(html.contains("Tom &amp; Jerry&#x27;s &lt;Movie&gt;"));
        assert!(html.contains("<title>&lt;b&gt;</title>"));
        assert!(html.contains("a.jpg?x=1&amp;y=2"));
        assert!(!html.contains("<Movie>"));
    }

    #[test]
    fn empty_collection_renders_empty_grid() {
        let html = render(TEMPLATE, "Empty", &MovieCollection::new()).unwrap();

        assert!(html.contains("<ol></ol>"));
    }

    #[test]
    fn generate_writes_output_next_to_new_directories() {
        let dir = TempDir::new().unwrap();
        let template_path = dir.path().join("index_template.html");
        fs::write(&template_path, TEMPLATE).unwrap();
        let output_path = dir.path().join("site").join("index.html");

        generate(&template_path, &output_path, "My Movies", &collection()).unwrap();

        let html = fs::read_to_string(&output_path).unwrap();
        assert!(html.contains("<div class='movie-title'>Inception</div>"));
    }

    #[test]
    fn missing_template_is_reported() {
        let dir = TempDir::new().unwrap();

        let err = generate(
            &dir.path().join("missing.html"),
            &dir.path().join("index.html"),
            "My Movies",
            &collection(),
        )
        .unwrap_err();

        assert!(matches!(err, WebsiteError::Template { .. }));
        assert!(!dir.path().join("index.html").exists());
    }
}
