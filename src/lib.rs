pub mod browse;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod remote;
pub mod types;

pub use browse::{
    AssetResolver, AssetStore, DetailLoader, DetailState, Epoch, FilterCoordinator, FilterPatch,
    FilterState, IssueBrowser, IssueListState, IssueQueryEngine, SearchDebouncer, SearchOutcome,
    TempAssetStore,
};
pub use config::{ConfigFile, ConfigProvider, FileConfigProvider, GitLabConfig};
pub use error::{IssueLensError, Result};
pub use remote::{GitLabApi, GitLabClient, IssueDetail, IssueKey, IssueSummary, Note, Project, User};
pub use types::{IssueIid, IssueState, PaginationInfo, ProjectId, UserId};
