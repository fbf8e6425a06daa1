use std::time::Duration;

use crate::error::{CinefindError, Result};

pub const DEFAULT_TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_APPWRITE_ENDPOINT: &str = "https://cloud.appwrite.io/v1";
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);
pub const DEFAULT_TRENDING_LIMIT: usize = 5;

/// Connection settings for the movie metadata service.
#[derive(Clone, Debug)]
pub struct TmdbConfig {
    pub api_key: String,
    pub base_url: String,
}

/// Connection settings for the hosted search-count collection.
#[derive(Clone, Debug)]
pub struct AppwriteConfig {
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub collection_id: String,
    pub api_key: Option<String>,
}

/// Everything read from the environment, built once at startup and handed
/// to the clients and the session.
#[derive(Clone, Debug)]
pub struct Config {
    pub tmdb: TmdbConfig,
    pub appwrite: Option<AppwriteConfig>,
    pub debounce: Duration,
    pub trending_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let tmdb = TmdbConfig {
            // A missing key is not fatal here: the catalog rejects the first
            // request and the user sees the generic fetch error.
            api_key: get("TMDB_API_KEY").unwrap_or_default(),
            base_url: get("TMDB_BASE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|| DEFAULT_TMDB_BASE_URL.to_string()),
        };

        let appwrite = {
            let ids = [
                ("APPWRITE_PROJECT_ID", get("APPWRITE_PROJECT_ID")),
                ("APPWRITE_DATABASE_ID", get("APPWRITE_DATABASE_ID")),
                ("APPWRITE_COLLECTION_ID", get("APPWRITE_COLLECTION_ID")),
            ];

            if ids.iter().all(|(_, value)| value.is_none()) {
                None
            } else {
                if let Some((env_var, _)) = ids.iter().find(|(_, value)| value.is_none()) {
                    return Err(CinefindError::MissingConfig {
                        env_var: env_var.to_string(),
                    });
                }
                let [project, database, collection] = ids.map(|(_, value)| value.unwrap_or_default());
                Some(AppwriteConfig {
                    endpoint: get("APPWRITE_ENDPOINT")
                        .map(|url| url.trim_end_matches('/').to_string())
                        .unwrap_or_else(|| DEFAULT_APPWRITE_ENDPOINT.to_string()),
                    project_id: project,
                    database_id: database,
                    collection_id: collection,
                    api_key: get("APPWRITE_API_KEY"),
                })
            }
        };

        let debounce = match get("CINEFIND_DEBOUNCE_MS") {
            Some(raw) => Duration::from_millis(parse_number("CINEFIND_DEBOUNCE_MS", &raw)?),
            None => DEFAULT_DEBOUNCE,
        };

        let trending_limit = match get("CINEFIND_TRENDING_LIMIT") {
            Some(raw) => {
                let limit = parse_number("CINEFIND_TRENDING_LIMIT", &raw)?;
                if limit == 0 {
                    return Err(CinefindError::InvalidConfig {
                        key: "CINEFIND_TRENDING_LIMIT".to_string(),
                        reason: "must be greater than zero".to_string(),
                    });
                }
                limit as usize
            }
            None => DEFAULT_TRENDING_LIMIT,
        };

        Ok(Self {
            tmdb,
            appwrite,
            debounce,
            trending_limit,
        })
    }

    pub fn has_api_key(&self) -> bool {
        !self.tmdb.api_key.is_empty()
    }
}

fn parse_number(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|e| CinefindError::InvalidConfig {
            key: key.to_string(),
            reason: format!("{raw:?} is not a number ({e})"),
        })
}
