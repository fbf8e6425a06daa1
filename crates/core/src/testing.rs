//! Test doubles: an in-process HTTP stub answering each accepted connection
//! with the next canned response, plus trait mocks for the collaborators.

use std::{
    collections::HashMap,
    error::Error,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
    task::JoinHandle,
};

use crate::{
    catalog::{CatalogRequest, MovieCatalog},
    counter::PopularityCounter,
    error::{CinefindError, Result},
    report::FailureSink,
    types::{Movie, MoviePage, TrendingEntry},
};

pub struct CannedResponse {
    pub status: &'static str,
    pub body: String,
}

impl CannedResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: "200 OK",
            body: body.into(),
        }
    }

    pub fn status(status: &'static str, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub target: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Serve `responses` in order, one per connection. The handle resolves to
/// the recorded requests once every response has been sent.
pub async fn serve(responses: Vec<CannedResponse>) -> (String, JoinHandle<Vec<RecordedRequest>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut recorded = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();

            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            let head_end = loop {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "client closed before sending a request");
                buf.extend_from_slice(&chunk[..n]);
                if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
            let mut lines = head.split("\r\n");
            let request_line = lines.next().unwrap_or_default();
            let mut parts = request_line.split(' ');
            let method = parts.next().unwrap_or_default().to_string();
            let target = parts.next().unwrap_or_default().to_string();
            let headers: Vec<(String, String)> = lines
                .filter_map(|line| line.split_once(':'))
                .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
                .collect();

            let content_length = headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
                .and_then(|(_, v)| v.parse::<usize>().ok())
                .unwrap_or(0);
            while buf.len() < head_end + content_length {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            let body = String::from_utf8_lossy(&buf[head_end..]).to_string();

            recorded.push(RecordedRequest {
                method,
                target,
                headers,
                body,
            });

            let reply = format!(
                "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                response.status,
                response.body.len(),
                response.body
            );
            stream.write_all(reply.as_bytes()).await.unwrap();
            stream.shutdown().await.unwrap();
        }
        recorded
    });

    (base_url, handle)
}

/// Catalog double: answers from a closure, optionally after a per-query delay.
pub struct MockCatalog {
    pub requests: Mutex<Vec<CatalogRequest>>,
    delays: HashMap<String, Duration>,
    answer: Box<dyn Fn(&CatalogRequest) -> Result<MoviePage> + Send + Sync>,
}

impl MockCatalog {
    pub fn new<F>(answer: F) -> Self
    where
        F: Fn(&CatalogRequest) -> Result<MoviePage> + Send + Sync + 'static,
    {
        Self {
            requests: Mutex::new(Vec::new()),
            delays: HashMap::new(),
            answer: Box::new(answer),
        }
    }

    /// Every search returns one movie per character of the query, titled
    /// after the query; discover returns a single "Popular" movie.
    pub fn echo() -> Self {
        Self::new(|request| Ok(page(echo_movies(request))))
    }

    pub fn with_delay(mut self, query: &str, delay: Duration) -> Self {
        self.delays.insert(query.to_string(), delay);
        self
    }

    pub fn requests(&self) -> Vec<CatalogRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl MovieCatalog for MockCatalog {
    async fn fetch(&self, request: &CatalogRequest) -> Result<MoviePage> {
        self.requests.lock().unwrap().push(request.clone());
        let key = match request {
            CatalogRequest::SearchText { query } => query.as_str(),
            CatalogRequest::DiscoverPopular => "",
        };
        if let Some(delay) = self.delays.get(key) {
            tokio::time::sleep(*delay).await;
        }
        (self.answer)(request)
    }
}

pub fn movie(id: u64, title: &str) -> Movie {
    Movie {
        id,
        title: title.to_string(),
        poster_path: Some(format!("/{id}.jpg")),
        release_date: Some("2001-01-01".to_string()),
        vote_average: Some(7.0),
        original_language: Some("en".to_string()),
        overview: None,
    }
}

pub fn page(movies: Vec<Movie>) -> MoviePage {
    MoviePage {
        results: Some(movies),
        ..MoviePage::default()
    }
}

pub fn echo_movies(request: &CatalogRequest) -> Vec<Movie> {
    match request {
        CatalogRequest::SearchText { query } => (0..query.chars().count() as u64)
            .map(|i| movie(i + 1, query))
            .collect(),
        CatalogRequest::DiscoverPopular => vec![movie(100, "Popular")],
    }
}

/// Counter double recording increments; can be told to fail.
#[derive(Default)]
pub struct MockCounter {
    pub increments: Mutex<Vec<(String, Movie)>>,
    pub trending_calls: AtomicUsize,
    pub entries: Vec<TrendingEntry>,
    pub fail: bool,
    pub increment_delay: Option<Duration>,
}

impl MockCounter {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn with_entries(entries: Vec<TrendingEntry>) -> Self {
        Self {
            entries,
            ..Self::default()
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            increment_delay: Some(delay),
            ..Self::default()
        }
    }

    pub fn increments(&self) -> Vec<(String, Movie)> {
        self.increments.lock().unwrap().clone()
    }
}

#[async_trait]
impl PopularityCounter for MockCounter {
    async fn increment_search_count(&self, query: &str, movie: &Movie) -> Result<()> {
        if let Some(delay) = self.increment_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(unavailable());
        }
        self.increments
            .lock()
            .unwrap()
            .push((query.to_string(), movie.clone()));
        Ok(())
    }

    async fn trending(&self) -> Result<Vec<TrendingEntry>> {
        self.trending_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(unavailable());
        }
        Ok(self.entries.clone())
    }
}

pub fn unavailable() -> CinefindError {
    CinefindError::Io(std::io::Error::new(
        std::io::ErrorKind::ConnectionRefused,
        "service unavailable",
    ))
}

/// Keeps every report so tests can assert on the failure channel.
#[derive(Default)]
pub struct RecordingSink {
    pub reports: Mutex<Vec<(&'static str, String)>>,
}

impl RecordingSink {
    pub fn operations(&self) -> Vec<&'static str> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|(operation, _)| *operation)
            .collect()
    }
}

impl FailureSink for RecordingSink {
    fn report(&self, operation: &'static str, error: &(dyn Error + 'static)) {
        self.reports
            .lock()
            .unwrap()
            .push((operation, error.to_string()));
    }
}
