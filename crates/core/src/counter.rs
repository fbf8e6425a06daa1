use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs, sync::Mutex};

use crate::{
    error::Result,
    types::{Movie, SearchCountRecord, TrendingEntry},
};

/// Tracks how often each term is searched and which terms lead.
#[async_trait]
pub trait PopularityCounter: Send + Sync {
    /// Record one more search for `query`; `movie` is its top result.
    async fn increment_search_count(&self, query: &str, movie: &Movie) -> Result<()>;

    /// The most searched terms, best first.
    async fn trending(&self) -> Result<Vec<TrendingEntry>>;
}

/// Order records by count (ties keep their stored order) and number them from 1.
pub fn rank_entries(mut records: Vec<SearchCountRecord>, limit: usize) -> Vec<TrendingEntry> {
    records.sort_by(|a, b| b.count.cmp(&a.count));
    records
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(index, record)| TrendingEntry {
            rank: index + 1,
            search_term: record.search_term,
            poster_url: record.poster_url,
            movie_id: record.movie_id,
            count: record.count,
        })
        .collect()
}

/// Counting switched off: nothing is recorded and nothing trends.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledCounter;

#[async_trait]
impl PopularityCounter for DisabledCounter {
    async fn increment_search_count(&self, _query: &str, _movie: &Movie) -> Result<()> {
        Ok(())
    }

    async fn trending(&self) -> Result<Vec<TrendingEntry>> {
        Ok(Vec::new())
    }
}

pub fn get_root_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("cinefind")
}

/// Get the path of the local search count store
pub fn get_search_counts_path(data_dir: &Path) -> PathBuf {
    data_dir.join("search_counts.json")
}

/// Search counts kept in a JSON file, for running without a hosted backend.
pub struct FileCounter {
    path: PathBuf,
    limit: usize,
    write_lock: Mutex<()>,
}

impl FileCounter {
    pub fn new(path: PathBuf, limit: usize) -> Self {
        Self {
            path,
            limit,
            write_lock: Mutex::new(()),
        }
    }

    pub fn in_data_dir(limit: usize) -> Self {
        Self::new(get_search_counts_path(&get_root_data_dir()), limit)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<SearchCountRecord>> {
        match fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, records: &[SearchCountRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(records)?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl PopularityCounter for FileCounter {
    async fn increment_search_count(&self, query: &str, movie: &Movie) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut records = self.load().await?;

        match records.iter_mut().find(|r| r.search_term == query) {
            Some(record) => record.count += 1,
            None => records.push(SearchCountRecord::first_search(query, movie)),
        }

        self.save(&records).await?;
        tracing::debug!(query, path = %self.path.display(), "Search count updated");
        Ok(())
    }

    async fn trending(&self) -> Result<Vec<TrendingEntry>> {
        Ok(rank_entries(self.load().await?, self.limit))
    }
}
