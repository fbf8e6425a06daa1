use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use tokio::{sync::watch, task::JoinHandle};

use crate::{
    catalog::{CatalogRequest, MovieCatalog},
    counter::PopularityCounter,
    error::GENERIC_FETCH_ERROR,
    report::{FETCH_MOVIES, FailureSink, UPDATE_SEARCH_COUNT},
    types::Movie,
    view::ViewState,
};

/// Which completion reaches the view when searches overlap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionPolicy {
    /// Every completion is published; a slow earlier search can overwrite a
    /// newer one.
    #[default]
    LastResolvedWins,
    /// Only the most recently started search is published.
    LatestRequestWins,
}

/// Position of a search in start order, taken when the search is decided
/// on rather than when its task first runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SearchTicket(u64);

/// Result of one [`SearchExecutor::execute`] call.
#[derive(Debug)]
pub struct SearchRun {
    /// The state this search resolved to.
    pub state: ViewState,
    /// A newer search started first, so `state` was not published.
    pub superseded: bool,
    /// The detached search-count update, when one was started.
    pub search_count: Option<JoinHandle<()>>,
}

pub struct SearchExecutor {
    catalog: Arc<dyn MovieCatalog>,
    counter: Arc<dyn PopularityCounter>,
    sink: Arc<dyn FailureSink>,
    policy: ResolutionPolicy,
    view: watch::Sender<ViewState>,
    generation: AtomicU64,
}

impl SearchExecutor {
    pub fn new(
        catalog: Arc<dyn MovieCatalog>,
        counter: Arc<dyn PopularityCounter>,
        sink: Arc<dyn FailureSink>,
        policy: ResolutionPolicy,
    ) -> Self {
        let (view, _) = watch::channel(ViewState::Idle);
        Self {
            catalog,
            counter,
            sink,
            policy,
            view,
            generation: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view.subscribe()
    }

    pub fn current(&self) -> ViewState {
        self.view.borrow().clone()
    }

    pub fn policy(&self) -> ResolutionPolicy {
        self.policy
    }

    /// Reserve the next place in start order. Under
    /// [`ResolutionPolicy::LatestRequestWins`] only the newest ticket publishes.
    pub fn ticket(&self) -> SearchTicket {
        SearchTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Fetch the listing for `query` (popular titles when empty) and publish
    /// the outcome. The view shows `Loading` until the fetch resolves.
    pub async fn execute(&self, query: &str) -> SearchRun {
        let ticket = self.ticket();
        self.execute_with(ticket, query).await
    }

    /// [`execute`](Self::execute) with a ticket taken earlier.
    pub async fn execute_with(&self, ticket: SearchTicket, query: &str) -> SearchRun {
        let SearchTicket(generation) = ticket;
        self.view.send_replace(ViewState::Loading);

        let request = CatalogRequest::for_query(query);
        let state = match self.catalog.fetch(&request).await {
            Ok(page) => match page.into_outcome() {
                Ok(movies) => ViewState::Loaded(movies),
                Err(message) => {
                    tracing::warn!(query, %message, "Catalog flagged the request as failed");
                    ViewState::Error(message)
                }
            },
            Err(e) => {
                self.sink.report(FETCH_MOVIES, &e);
                ViewState::Error(GENERIC_FETCH_ERROR.to_string())
            }
        };

        let superseded = self.policy == ResolutionPolicy::LatestRequestWins
            && self.generation.load(Ordering::SeqCst) != generation;

        if superseded {
            // The newer search owns the view, Loading included.
            tracing::debug!(query, generation, "Discarding superseded search result");
        } else {
            self.view.send_replace(state.clone());
        }

        let search_count = match (&state, query.is_empty()) {
            (ViewState::Loaded(movies), false) => movies
                .first()
                .map(|top| self.spawn_search_count(query, top.clone())),
            _ => None,
        };

        SearchRun {
            state,
            superseded,
            search_count,
        }
    }

    fn spawn_search_count(&self, query: &str, movie: Movie) -> JoinHandle<()> {
        let counter = Arc::clone(&self.counter);
        let sink = Arc::clone(&self.sink);
        let query = query.to_string();

        tokio::spawn(async move {
            if let Err(e) = counter.increment_search_count(&query, &movie).await {
                sink.report(UPDATE_SEARCH_COUNT, &e);
            }
        })
    }
}
