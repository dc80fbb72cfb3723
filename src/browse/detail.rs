//! Selected-issue detail and notes.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::Result;
use crate::remote::{GitLabApi, IssueDetail, IssueKey, Note};

use super::assets::{AssetResolver, AssetStore, TempAssetStore};
use super::epoch::Epoch;

/// What the detail pane should render.
///
/// Detail and notes load and fail independently: an error in one never
/// clears a value already present in the other.
#[derive(Debug, Clone, Default)]
pub struct DetailState {
    pub epoch: Epoch,
    pub selected: Option<IssueKey>,
    pub detail: Option<IssueDetail>,
    /// Oldest first. System notes are kept; hiding them is up to the view.
    pub notes: Option<Vec<Note>>,
    pub detail_loading: bool,
    pub notes_loading: bool,
    pub detail_error: Option<String>,
    pub notes_error: Option<String>,
}

impl DetailState {
    pub fn is_open(&self) -> bool {
        self.selected.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.detail_loading || self.notes_loading
    }
}

/// Loads detail and notes for the selected issue.
///
/// Every [`DetailLoader::start`] and [`DetailLoader::close`] starts a new
/// selection epoch. Both requests of a selection run concurrently on their
/// own task and each result is applied only if its epoch is still current,
/// so a slow reply for an issue the user has already left is dropped.
pub struct DetailLoader<A, S = TempAssetStore> {
    api: Arc<A>,
    assets: Arc<AssetResolver<A, S>>,
    state: Arc<watch::Sender<DetailState>>,
}

impl<A: GitLabApi + 'static, S: AssetStore + 'static> DetailLoader<A, S> {
    pub fn new(api: Arc<A>, assets: Arc<AssetResolver<A, S>>) -> Self {
        let (state, _) = watch::channel(DetailState::default());
        Self {
            api,
            assets,
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DetailState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> DetailState {
        self.state.borrow().clone()
    }

    pub fn assets(&self) -> &Arc<AssetResolver<A, S>> {
        &self.assets
    }

    /// Select `issue` and start loading its detail and notes.
    ///
    /// The selection takes effect immediately. The requests keep running
    /// when the handle is dropped; await it only to know both have settled.
    pub fn start(&self, issue: IssueKey) -> JoinHandle<()> {
        let epoch = begin(&self.state, Some(issue));
        debug!(epoch = %epoch, issue = %issue, "loading issue");

        let api = Arc::clone(&self.api);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let detail = async {
                let result = api.issue_detail(issue.project_id, issue.iid).await;
                apply_detail(&state, epoch, result);
            };
            let notes = async {
                let result = api.issue_notes(issue.project_id, issue.iid).await;
                apply_notes(&state, epoch, result);
            };

            tokio::join!(detail, notes);
        })
    }

    /// Select `issue` and wait until detail and notes have both settled.
    pub async fn select(&self, issue: IssueKey) {
        if let Err(e) = self.start(issue).await {
            warn!(issue = %issue, error = %e, "issue loading task ended abnormally");
        }
    }

    /// Leave the current issue. In-flight replies for it are discarded.
    pub fn close(&self) {
        let epoch = begin(&self.state, None);
        debug!(epoch = %epoch, "detail closed");
    }

    /// Resolve an inline reference from the selected issue's markdown.
    /// With nothing selected the reference is returned unchanged.
    pub async fn resolve_asset(&self, source: &str) -> String {
        let project_id = self.state.borrow().selected.map(|key| key.project_id);
        match project_id {
            Some(project_id) => self.assets.resolve(project_id, source).await,
            None => source.to_string(),
        }
    }
}

fn begin(state: &watch::Sender<DetailState>, selected: Option<IssueKey>) -> Epoch {
    let mut epoch = Epoch::ZERO;
    state.send_modify(|s| {
        epoch = s.epoch.next();
        *s = DetailState {
            epoch,
            selected,
            detail_loading: selected.is_some(),
            notes_loading: selected.is_some(),
            ..DetailState::default()
        };
    });
    epoch
}

/// Run `f` on the state if `epoch` is still current.
fn apply_if_current(
    state: &watch::Sender<DetailState>,
    epoch: Epoch,
    what: &str,
    f: impl FnOnce(&mut DetailState),
) {
    let applied = state.send_if_modified(|s| {
        if s.epoch != epoch {
            return false;
        }
        f(s);
        true
    });
    if !applied {
        debug!(epoch = %epoch, what, "dropping stale response");
    }
}

fn apply_detail(state: &watch::Sender<DetailState>, epoch: Epoch, result: Result<IssueDetail>) {
    apply_if_current(state, epoch, "detail", |s| {
        s.detail_loading = false;
        match result {
            Ok(detail) => {
                s.detail = Some(detail);
                s.detail_error = None;
            }
            Err(e) => {
                warn!(epoch = %epoch, error = %e, "issue detail request failed");
                s.detail_error = Some(e.user_message());
            }
        }
    });
}

fn apply_notes(state: &watch::Sender<DetailState>, epoch: Epoch, result: Result<Vec<Note>>) {
    apply_if_current(state, epoch, "notes", |s| {
        s.notes_loading = false;
        match result {
            Ok(mut notes) => {
                notes.sort_by_key(|n| n.created_at);
                s.notes = Some(notes);
                s.notes_error = None;
            }
            Err(e) => {
                warn!(epoch = %epoch, error = %e, "issue notes request failed");
                s.notes_error = Some(e.user_message());
            }
        }
    });
}
