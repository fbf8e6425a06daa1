use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;

use crate::{
    counter::PopularityCounter,
    report::{FETCH_TRENDING, FailureSink},
    types::TrendingEntry,
};

/// Loads the trending searches once per mount. A failed load leaves the
/// previous list in place and is only reported to the sink.
pub struct TrendingLoader {
    counter: Arc<dyn PopularityCounter>,
    sink: Arc<dyn FailureSink>,
    entries: watch::Sender<Vec<TrendingEntry>>,
    started: AtomicBool,
}

impl TrendingLoader {
    pub fn new(counter: Arc<dyn PopularityCounter>, sink: Arc<dyn FailureSink>) -> Self {
        let (entries, _) = watch::channel(Vec::new());
        Self {
            counter,
            sink,
            entries,
            started: AtomicBool::new(false),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<TrendingEntry>> {
        self.entries.subscribe()
    }

    pub fn current(&self) -> Vec<TrendingEntry> {
        self.entries.borrow().clone()
    }

    /// Returns `false` without calling the counter if a load already ran.
    pub async fn load_once(&self) -> bool {
        if self.started.swap(true, Ordering::SeqCst) {
            return false;
        }

        match self.counter.trending().await {
            Ok(entries) => {
                tracing::debug!(count = entries.len(), "Trending searches loaded");
                self.entries.send_replace(entries);
            }
            Err(e) => self.sink.report(FETCH_TRENDING, &e),
        }
        true
    }
}
