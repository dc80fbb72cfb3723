//! Browsing orchestration.
//!
//! Everything between user intent (pick a project, type a search term,
//! open an issue) and the [`GitLabApi`](crate::remote::GitLabApi) calls
//! that satisfy it. The common thread is staleness: filters, selections
//! and search terms change while requests are in flight, and only the
//! reply for the latest one may reach the visible state.

pub mod assets;
pub mod debounce;
pub mod detail;
pub mod epoch;
pub mod filter;
pub mod list;
pub mod query;
pub mod search;

pub use assets::{AssetResolver, AssetState, AssetStore, TempAssetStore};
pub use debounce::{DEFAULT_SEARCH_DEBOUNCE, Lookup, SearchDebouncer, SearchOutcome};
pub use detail::{DetailLoader, DetailState};
pub use epoch::Epoch;
pub use filter::{FilterCoordinator, FilterPatch, FilterState};
pub use list::{IssueBrowser, IssueListState, ListOutcome};
pub use query::{IssuePage, IssueQueryEngine};
pub use search::{MemberLookup, MemberSearch, ProjectLookup, ProjectSearch, member_search, project_search};
