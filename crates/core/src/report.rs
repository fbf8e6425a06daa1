use std::error::Error;

use crate::error::GENERIC_FETCH_ERROR;

/// Where failures that must never reach the user end up: the search-count
/// side effect, trending loads and the catalog errors behind the generic
/// message.
pub trait FailureSink: Send + Sync {
    fn report(&self, operation: &'static str, error: &(dyn Error + 'static));
}

/// The catalog failures behind the generic message are logged under that same message.
pub const FETCH_MOVIES: &str = GENERIC_FETCH_ERROR;
pub const FETCH_TRENDING: &str = "Error Fetching Trending Movies";
pub const UPDATE_SEARCH_COUNT: &str = "Error Updating Search Count";

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl FailureSink for TracingSink {
    fn report(&self, operation: &'static str, error: &(dyn Error + 'static)) {
        tracing::error!(operation, error = %error, "{operation}: {error}");
    }
}
