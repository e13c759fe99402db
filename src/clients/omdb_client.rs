use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client};
use thiserror::Error;
use tokio_retry::{
    strategy::{jitter, ExponentialBackoff},
    RetryIf,
};

use crate::{extractors::movie_extractor::MovieExtractor, model::movie::MovieDetails};

pub const OMDB_BASE_URL: &str = "http://www.omdbapi.com/";

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("no movie found for '{0}'")]
    NotFound(String),

    /// The service answered but refused the request, e.g. an invalid API key.
    #[error("movie service rejected the request: {0}")]
    Rejected(String),

    #[error("movie service is unavailable: {0}")]
    Unavailable(String),

    #[error("unexpected response from movie service: {0}")]
    InvalidResponse(String),
}

impl LookupError {
    pub fn is_transient(&self) -> bool {
        matches!(self, LookupError::Unavailable(_))
    }
}

/// Finds movie details from a free-text title query.
#[async_trait]
pub trait MovieLookup: Send + Sync {
    async fn fetch_movie(&self, query: &str) -> Result<MovieDetails, LookupError>;
}

#[derive(Debug, Clone)]
pub struct OmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OmdbClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, OMDB_BASE_URL)
    }

    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, LookupError> {
        let user_agent = header::HeaderValue::from_static(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        let client = Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| LookupError::Unavailable(format!("could not build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    async fn fetch_movie_no_retry(&self, query: &str) -> Result<MovieDetails, LookupError> {
        let resp = self
            .client
            .get(&self.base_url)
            .query(&[("apikey", self.api_key.as_str()), ("t", query)])
            .send()
            .await
            .map_err(|e| {
                LookupError::Unavailable(format!("request for '{}' failed: {}", query, e))
            })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(LookupError::Unavailable(format!(
                "server answered {} for '{}'",
                status, query
            )));
        }

        // OMDb reports client errors (bad key, missing title) in a JSON body.
        let body = resp.text().await.map_err(|e| {
            LookupError::Unavailable(format!("could not read response for '{}': {}", query, e))
        })?;

        MovieExtractor::extract_movie_from_json(&body, query)
    }
}

#[async_trait]
impl MovieLookup for OmdbClient {
    async fn fetch_movie(&self, query: &str) -> Result<MovieDetails, LookupError> {
        // Waits of roughly 100, 200, 400 and 800ms before giving up.
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(4);
        RetryIf::spawn(
            retry_strategy,
            || self.fetch_movie_no_retry(query),
            |e: &LookupError| {
                if e.is_transient() {
                    log::warn!("Retrying lookup for '{}': {}", query, e);
                }
                e.is_transient()
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    };
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    /// Serves the given responses in order, one per connection, and counts
    /// the requests it received.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<AtomicUsize>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();

        tokio::spawn(async move {
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut buf).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    request.extend_from_slice(&buf[..n]);
                }
                counter.fetch_add(1, Ordering::SeqCst);

                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });

        (url, hits)
    }

    #[tokio::test]
    async fn fetches_movie_details() {
        let (url, hits) = serve(vec![(
            200,
            r#"{"Title":"Inception","Year":"2010","imdbRating":"8.8","Poster":"p.jpg","Response":"True"}"#,
        )])
        .await;
        let client = OmdbClient::with_base_url("key", url).unwrap();

        let movie = client.fetch_movie("inception").await.unwrap();

        assert_eq!(movie.title, "Inception");
        assert_eq!(movie.year, 2010);
        assert_eq!(movie.rating, 8.8);
        assert_eq!(movie.poster, "p.jpg");
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let (url, hits) = serve(vec![(
            200,
            r#"{"Response":"False","Error":"Movie not found!"}"#,
        )])
        .await;
        let client = OmdbClient::with_base_url("key", url).unwrap();

        let err = client.fetch_movie("qwertyuiop").await.unwrap_err();

        assert!(matches!(err, LookupError::NotFound(_)));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalid_key_is_rejected() {
        let (url, _) = serve(vec![(
            401,
            r#"{"Response":"False","Error":"Invalid API key!"}"#,
        )])
        .await;
        let client = OmdbClient::with_base_url("bad", url).unwrap();

        let err = client.fetch_movie("inception").await.unwrap_err();

        assert!(matches!(err, LookupError::Rejected(_)));
    }

    #[tokio::test]
    async fn server_errors_are_retried() {
        let (url, hits) = serve(vec![
            (503, "{}"),
            (
                200,
                r#"{"Title":"Heat","Year":"1995","imdbRating":"8.3","Poster":"N/A","Response":"True"}"#,
            ),
        ])
        .await;
        let client = OmdbClient::with_base_url("key", url).unwrap();

        let movie = client.fetch_movie("heat").await.unwrap();

        assert_eq!(movie.title, "Heat");
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        drop(listener);
        let client = OmdbClient::with_base_url("key", url).unwrap();

        let err = client.fetch_movie("inception").await.unwrap_err();

        assert!(err.is_transient());
    }
}
