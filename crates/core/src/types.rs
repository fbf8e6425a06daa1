use serde::{Deserialize, Serialize};

use crate::error::FALLBACK_FETCH_ERROR;

pub const POSTER_BASE_URL: &str = "https://image.tmdb.org/t/p/w500";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub vote_average: Option<f64>,
    #[serde(default)]
    pub original_language: Option<String>,
    #[serde(default)]
    pub overview: Option<String>,
}

impl Movie {
    pub fn poster_url(&self) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(|path| format!("{POSTER_BASE_URL}{path}"))
    }

    /// Release year taken from the `YYYY-MM-DD` release date.
    pub fn release_year(&self) -> Option<&str> {
        self.release_date
            .as_deref()
            .and_then(|date| date.split('-').next())
            .filter(|year| !year.is_empty())
    }
}

/// Body of a catalog listing. `Response`/`Error` are the legacy failure
/// sentinel; the catalog normally omits them.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MoviePage {
    #[serde(default)]
    pub results: Option<Vec<Movie>>,
    #[serde(rename = "Response", default)]
    pub response: Option<String>,
    #[serde(rename = "Error", default)]
    pub error: Option<String>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub total_results: Option<u64>,
}

impl MoviePage {
    pub fn is_failure(&self) -> bool {
        self.response.as_deref() == Some("False")
    }

    /// Movies on success, the user-facing message on a flagged failure.
    pub fn into_outcome(self) -> Result<Vec<Movie>, String> {
        if self.is_failure() {
            return Err(self
                .error
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| FALLBACK_FETCH_ERROR.to_string()));
        }
        Ok(self.results.unwrap_or_default())
    }
}

/// One search term document in the popularity counter collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCountRecord {
    #[serde(rename = "$id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "searchTerm")]
    pub search_term: String,
    pub count: u64,
    pub movie_id: u64,
    #[serde(default)]
    pub poster_url: String,
}

impl SearchCountRecord {
    pub fn first_search(query: &str, movie: &Movie) -> Self {
        Self {
            id: None,
            search_term: query.to_string(),
            count: 1,
            movie_id: movie.id,
            poster_url: movie.poster_url().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendingEntry {
    pub rank: usize,
    pub search_term: String,
    pub poster_url: String,
    pub movie_id: u64,
    pub count: u64,
}
