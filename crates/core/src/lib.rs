//! Cinefind Core Library
//!
//! Debounced movie search against the TMDB catalog, popular titles when the
//! query is empty, and trending searches backed by a popularity counter.

pub mod appwrite;
pub mod catalog;
pub mod config;
pub mod counter;
pub mod debounce;
pub mod error;
pub mod format;
pub mod report;
pub mod search;
pub mod session;
pub mod trending;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

// Re-export commonly used items at crate root
pub use appwrite::AppwriteCounter;
pub use catalog::{CatalogRequest, MovieCatalog, TmdbClient};
pub use config::{AppwriteConfig, Config, TmdbConfig};
pub use counter::{DisabledCounter, FileCounter, PopularityCounter};
pub use debounce::DebouncedInput;
pub use error::{CinefindError, FALLBACK_FETCH_ERROR, GENERIC_FETCH_ERROR, Result};
pub use format::{format_movie_line, format_movies, format_rating, format_trending};
pub use report::{FailureSink, TracingSink};
pub use search::{ResolutionPolicy, SearchExecutor, SearchRun, SearchTicket};
pub use session::DiscoverySession;
pub use trending::TrendingLoader;
pub use types::{Movie, MoviePage, SearchCountRecord, TrendingEntry};
pub use view::ViewState;
