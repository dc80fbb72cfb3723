//! Debounced type-ahead lookups.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::Result;

/// Default quiet period before a search is sent.
pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

/// The variable part of a debounced search: how to fetch candidates for a
/// term and which of them to keep.
pub trait Lookup: Send + Sync {
    type Item: Clone + Send;

    fn lookup(&self, term: &str) -> impl Future<Output = Result<Vec<Self::Item>>> + Send;

    /// Local filter applied to whatever `lookup` returned.
    fn matches(&self, item: &Self::Item, term: &str) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome<T> {
    /// Results for the term. Empty when nothing matched or the lookup
    /// failed.
    Results(Vec<T>),
    /// A newer search or a cancel arrived before this one finished.
    Superseded,
}

impl<T> SearchOutcome<T> {
    pub fn into_results(self) -> Option<Vec<T>> {
        match self {
            SearchOutcome::Results(items) => Some(items),
            SearchOutcome::Superseded => None,
        }
    }
}

/// Trailing-edge debouncer around a [`Lookup`].
///
/// Each call to [`SearchDebouncer::search`] waits out the quiet interval and
/// then runs the lookup. A newer call or [`SearchDebouncer::cancel`] bumps
/// the generation, which wakes every older call and makes it return
/// [`SearchOutcome::Superseded`], dropping its timer or in-flight lookup.
/// A burst of keystrokes inside one interval therefore sends one request.
pub struct SearchDebouncer<L> {
    lookup: L,
    interval: Duration,
    generation: watch::Sender<u64>,
}

impl<L: Lookup> SearchDebouncer<L> {
    pub fn new(lookup: L, interval: Duration) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            lookup,
            interval,
            generation,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    pub async fn search(&self, term: &str) -> SearchOutcome<L::Item> {
        let generation = self.bump();
        let mut changes = self.generation.subscribe();

        let superseded = async move {
            // An error means the sender is gone, which also ends the search.
            let _ = changes.wait_for(|current| *current != generation).await;
        };

        let work = async {
            tokio::time::sleep(self.interval).await;
            debug!(term, generation, "dispatching search");
            self.lookup.lookup(term).await
        };

        tokio::select! {
            biased;
            _ = superseded => SearchOutcome::Superseded,
            result = work => {
                if *self.generation.borrow() != generation {
                    return SearchOutcome::Superseded;
                }
                match result {
                    Ok(items) => SearchOutcome::Results(
                        items
                            .into_iter()
                            .filter(|item| self.lookup.matches(item, term))
                            .collect(),
                    ),
                    Err(e) => {
                        warn!(term, error = %e, "search failed, showing no results");
                        SearchOutcome::Results(Vec::new())
                    }
                }
            }
        }
    }

    /// Abandon any pending or in-flight search, e.g. when the input is
    /// cleared or the picker closes.
    pub fn cancel(&self) {
        self.bump();
    }

    fn bump(&self) -> u64 {
        let mut next = 0;
        self.generation.send_modify(|current| {
            *current += 1;
            next = *current;
        });
        next
    }
}

/// Case-insensitive substring test used by the lookup filters. An empty
/// needle matches everything.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}
