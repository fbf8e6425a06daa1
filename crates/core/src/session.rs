use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{broadcast, watch},
    task::JoinSet,
};

use crate::{
    catalog::MovieCatalog,
    config::Config,
    counter::PopularityCounter,
    debounce::DebouncedInput,
    report::FailureSink,
    search::{ResolutionPolicy, SearchExecutor},
    trending::TrendingLoader,
    types::TrendingEntry,
    view::ViewState,
};

/// How long unmount waits for in-flight searches and their count updates.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The mounted discovery page: keystrokes in, view state and trending
/// searches out.
pub struct DiscoverySession {
    input: Arc<DebouncedInput>,
    executor: Arc<SearchExecutor>,
    trending: Arc<TrendingLoader>,
}

impl DiscoverySession {
    pub fn new(
        config: &Config,
        catalog: Arc<dyn MovieCatalog>,
        counter: Arc<dyn PopularityCounter>,
        sink: Arc<dyn FailureSink>,
        policy: ResolutionPolicy,
    ) -> Self {
        Self {
            input: Arc::new(DebouncedInput::new(config.debounce)),
            executor: Arc::new(SearchExecutor::new(
                catalog,
                Arc::clone(&counter),
                Arc::clone(&sink),
                policy,
            )),
            trending: Arc::new(TrendingLoader::new(counter, sink)),
        }
    }

    pub fn set_query(&self, value: impl Into<String>) {
        self.input.set_query(value);
    }

    pub fn query(&self) -> String {
        self.input.query()
    }

    /// The query the current results were requested for.
    pub fn stabilized_query(&self) -> String {
        self.input.stabilized().borrow().clone()
    }

    pub fn view(&self) -> watch::Receiver<ViewState> {
        self.executor.subscribe()
    }

    pub fn trending(&self) -> watch::Receiver<Vec<TrendingEntry>> {
        self.trending.subscribe()
    }

    /// Mount the page: load trending once, show popular titles, then search
    /// again each time the query settles. Searches run as separate tasks, so
    /// a slow one may still be in flight when the next starts. On shutdown,
    /// in-flight searches and their count updates get [`SHUTDOWN_GRACE`] to
    /// finish before they are aborted.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) {
        let trending = Arc::clone(&self.trending);
        tokio::spawn(async move {
            trending.load_once().await;
        });

        let input = Arc::clone(&self.input);
        let input_shutdown = shutdown.resubscribe();
        let driver = tokio::spawn(async move { input.run(input_shutdown).await });

        let mut searches = JoinSet::new();
        let mut stabilized = self.input.stabilized();
        let initial = stabilized.borrow_and_update().clone();
        self.spawn_search(&mut searches, initial);

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                changed = stabilized.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let query = stabilized.borrow_and_update().clone();
                    self.spawn_search(&mut searches, query);
                }
                Some(finished) = searches.join_next(), if !searches.is_empty() => {
                    if let Err(e) = finished {
                        tracing::warn!(error = %e, "Search task ended abnormally");
                    }
                }
            }
        }

        drain(searches).await;

        if let Err(e) = driver.await {
            tracing::warn!(error = %e, "Debounce driver ended abnormally");
        }
    }

    fn spawn_search(&self, searches: &mut JoinSet<()>, query: String) {
        // Start order is fixed here, not when the task first gets polled.
        let ticket = self.executor.ticket();
        let executor = Arc::clone(&self.executor);
        searches.spawn(async move {
            let run = executor.execute_with(ticket, &query).await;
            if let Some(count) = run.search_count
                && let Err(e) = count.await
            {
                tracing::warn!(query, error = %e, "Search count task ended abnormally");
            }
        });
    }
}

async fn drain(mut searches: JoinSet<()>) {
    if searches.is_empty() {
        return;
    }

    let pending = searches.len();
    let finished = tokio::time::timeout(SHUTDOWN_GRACE, async {
        while let Some(result) = searches.join_next().await {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Search task ended abnormally");
            }
        }
    })
    .await;

    if finished.is_err() {
        tracing::warn!(
            pending,
            remaining = searches.len(),
            "Aborting searches still running at shutdown"
        );
        searches.shutdown().await;
    }
}
