use std::path::PathBuf;

use clap::Parser;

/// Command line and environment configuration.
///
/// Values can also come from a `.env` file, which the binary loads before
/// parsing.
#[derive(Debug, Clone, Parser)]
#[command(name = "movieshelf", version, about = "Keep track of your movie collection")]
pub struct Config {
    /// Storage file. The extension selects the format (.json or .csv).
    #[arg(long, env = "MOVIESHELF_STORAGE", default_value = "data/movies.json")]
    pub storage: PathBuf,

    /// HTML template used by "Generate website".
    #[arg(long, default_value = "_static/index_template.html")]
    pub template: PathBuf,

    /// Where the generated website is written.
    #[arg(long, default_value = "_static/index.html")]
    pub output: PathBuf,

    /// Title shown on the generated website.
    #[arg(long, default_value = "My Movie App")]
    pub title: String,

    /// OMDb API key used to look up movies when adding them.
    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    pub omdb_api_key: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags() {
        let config = Config::try_parse_from([
            "movieshelf",
            "--storage",
            "db/movies.csv",
            "--title",
            "Weekend picks",
            "--omdb-api-key",
            "abc123",
        ])
        .unwrap();

        assert_eq!(config.storage, PathBuf::from("db/movies.csv"));
        assert_eq!(config.title, "Weekend picks");
        assert_eq!(config.omdb_api_key.as_deref(), Some("abc123"));
        assert_eq!(config.output, PathBuf::from("_static/index.html"));
    }

    #[test]
    fn rejects_unknown_flags() {
        assert!(Config::try_parse_from(["movieshelf", "--colour", "red"]).is_err());
    }
}
