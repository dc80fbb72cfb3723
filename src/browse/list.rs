//! The visible issue list.

use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::remote::{GitLabApi, IssueSummary};
use crate::types::PaginationInfo;

use super::epoch::Epoch;
use super::filter::{FilterCoordinator, FilterPatch, FilterState};
use super::query::IssueQueryEngine;

/// Snapshot of what the list view should render.
#[derive(Debug, Clone, Default)]
pub struct IssueListState {
    /// Filter of the most recent request, which may still be loading.
    pub filter: FilterState,
    /// Epoch of the page currently in `items`.
    pub applied_epoch: Epoch,
    pub items: Vec<IssueSummary>,
    pub pagination: PaginationInfo,
    pub loading: bool,
    pub error: Option<String>,
}

/// What happened to a list request once it returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListOutcome {
    Applied,
    Failed,
    /// A newer filter was set while the request was in flight.
    Stale,
}

/// Filter coordinator, query engine and list state wired together.
///
/// Each [`IssueBrowser::apply`] mints an epoch and fetches under it. When
/// the reply arrives it is written to the list state only if no later
/// apply has happened in the meantime, so out-of-order replies never
/// overwrite newer ones. Observers follow changes through
/// [`IssueBrowser::subscribe`].
pub struct IssueBrowser<A> {
    engine: IssueQueryEngine<A>,
    coordinator: Mutex<FilterCoordinator>,
    state: watch::Sender<IssueListState>,
}

impl<A: GitLabApi> IssueBrowser<A> {
    pub fn new(engine: IssueQueryEngine<A>) -> Self {
        Self::with_filter(engine, FilterState::default())
    }

    /// Start from `filter` without fetching anything yet.
    pub fn with_filter(engine: IssueQueryEngine<A>, filter: FilterState) -> Self {
        let coordinator = FilterCoordinator::with_state(filter);
        let state = IssueListState {
            filter: coordinator.state(),
            pagination: PaginationInfo {
                per_page: engine.per_page(),
                ..PaginationInfo::default()
            },
            ..IssueListState::default()
        };
        let (state, _) = watch::channel(state);

        Self {
            engine,
            coordinator: Mutex::new(coordinator),
            state,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<IssueListState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> IssueListState {
        self.state.borrow().clone()
    }

    pub fn filter(&self) -> FilterState {
        self.coordinator.lock().state()
    }

    pub fn current_epoch(&self) -> Epoch {
        self.coordinator.lock().epoch()
    }

    /// Update the filter and fetch the resulting page.
    pub async fn apply(&self, patch: FilterPatch) -> ListOutcome {
        let (filter, epoch) = {
            let mut coordinator = self.coordinator.lock();
            let filter = coordinator.set_filter(patch);
            (filter, coordinator.epoch())
        };

        self.state.send_modify(|s| {
            s.filter = filter;
            s.loading = true;
        });

        let result = self.engine.list_issues(&filter, epoch).await;

        // Held while writing so no newer apply can slip in between the
        // epoch check and the state update.
        let coordinator = self.coordinator.lock();
        if !coordinator.is_current(epoch) {
            debug!(
                epoch = %epoch,
                current = %coordinator.epoch(),
                "dropping stale issue list response"
            );
            return ListOutcome::Stale;
        }

        match result {
            Ok(page) => {
                self.state.send_modify(|s| {
                    s.applied_epoch = page.epoch;
                    s.items = page.items;
                    s.pagination = page.pagination;
                    s.loading = false;
                    s.error = None;
                });
                ListOutcome::Applied
            }
            Err(e) => {
                warn!(epoch = %epoch, error = %e, "issue list request failed");
                self.state.send_modify(|s| {
                    s.loading = false;
                    s.error = Some(e.user_message());
                });
                ListOutcome::Failed
            }
        }
    }

    pub async fn set_page(&self, page: u32) -> ListOutcome {
        self.apply(FilterPatch::page(page)).await
    }

    /// Refetch the current filter.
    pub async fn refresh(&self) -> ListOutcome {
        self.apply(FilterPatch::default()).await
    }
}
