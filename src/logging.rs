/// Logs go to stderr so they never mix with the menu on stdout.
///
/// Defaults to `info` for this crate and `warn` for dependencies. `RUST_LOG`
/// overrides both.
pub fn setup_logging() {
    let mut builder = env_logger::Builder::new();

    builder
        .filter(None, log::LevelFilter::Warn)
        .filter(Some("movieshelf"), log::LevelFilter::Info)
        .target(env_logger::Target::Stderr)
        .format_timestamp(None);

    if let Ok(rust_log) = std::env::var("RUST_LOG") {
        builder.parse_filters(&rust_log);
    }

    builder.init();
}
