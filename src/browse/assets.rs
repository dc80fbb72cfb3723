//! Protected inline assets.
//!
//! Images in issue markdown that point at `/uploads/...` need the API
//! credential to download, so they cannot be handed to a renderer as-is.
//! [`AssetResolver`] fetches each one once, stores the bytes through an
//! [`AssetStore`] and hands out the local reference instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt, Shared};
use tempfile::TempDir;
use tokio::sync::OnceCell;
use tracing::{debug, warn};
use url::Url;

use crate::error::{IssueLensError, Result};
use crate::remote::{AssetPayload, GitLabApi};
use crate::types::ProjectId;

pub const UPLOAD_PREFIX: &str = "/uploads/";

/// Whether `source` needs an authenticated fetch.
pub fn is_protected(source: &str) -> bool {
    source.starts_with(UPLOAD_PREFIX)
}

/// Lifecycle of a cached asset as seen from outside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetState {
    Pending,
    Resolved(String),
    /// Fetch failed; the original reference is used from now on.
    Failed,
}

/// Where fetched bytes go and how they are referenced afterwards.
pub trait AssetStore: Send + Sync {
    /// Persist `payload` and return a reference the renderer can load.
    fn materialize(&self, source: &str, payload: AssetPayload) -> Result<String>;

    /// Free whatever `materialize` allocated for `local`.
    fn release(&self, local: &str);
}

enum StoreRoot {
    Temp(TempDir),
    Kept(PathBuf),
}

/// Writes assets as files and refers to them by `file://` URL.
///
/// [`TempAssetStore::new`] uses a private temporary directory that is
/// removed when the store is dropped. [`TempAssetStore::in_dir`] writes
/// into a caller-owned directory and leaves it in place.
pub struct TempAssetStore {
    root: StoreRoot,
    counter: AtomicU64,
}

impl TempAssetStore {
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("issuelens-assets-").tempdir()?;
        Ok(Self {
            root: StoreRoot::Temp(dir),
            counter: AtomicU64::new(0),
        })
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = std::path::absolute(dir.into())?;
        fs::create_dir_all(&dir)?;
        Ok(Self {
            root: StoreRoot::Kept(dir),
            counter: AtomicU64::new(0),
        })
    }

    pub fn dir(&self) -> &Path {
        match &self.root {
            StoreRoot::Temp(dir) => dir.path(),
            StoreRoot::Kept(dir) => dir,
        }
    }

    fn file_name(&self, source: &str, content_type: Option<&str>) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let stem = Path::new(source)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "asset".to_string());
        let extension = Path::new(source)
            .extension()
            .and_then(|e| e.to_str())
            .map(sanitize)
            .filter(|e| !e.is_empty())
            .or_else(|| content_type.and_then(extension_for).map(str::to_string));

        match extension {
            Some(ext) => format!("{n:04}-{stem}.{ext}"),
            None => format!("{n:04}-{stem}"),
        }
    }
}

fn sanitize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
        .collect()
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or_default().trim();
    match mime {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "application/pdf" => Some("pdf"),
        _ => None,
    }
}

impl AssetStore for TempAssetStore {
    fn materialize(&self, source: &str, payload: AssetPayload) -> Result<String> {
        let path = self
            .dir()
            .join(self.file_name(source, payload.content_type.as_deref()));
        fs::write(&path, &payload.bytes)?;

        let url = Url::from_file_path(&path).map_err(|_| {
            IssueLensError::InvalidArgument(format!("not an absolute path: {}", path.display()))
        })?;
        Ok(url.to_string())
    }

    fn release(&self, local: &str) {
        let Some(path) = Url::parse(local).ok().and_then(|u| u.to_file_path().ok()) else {
            return;
        };
        if !path.starts_with(self.dir()) {
            return;
        }
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "failed to remove asset"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct AssetKey {
    project_id: ProjectId,
    source: String,
}

/// One spawned fetch. `outcome` is written by the task itself, so it is
/// filled even when every caller stopped waiting; `done` is what callers
/// await. Both hold `Some(local)` once resolved and `None` once failed.
#[derive(Clone)]
struct Slot {
    outcome: Arc<OnceCell<Option<String>>>,
    done: Shared<BoxFuture<'static, Option<String>>>,
}

/// Session cache of protected assets.
///
/// Each `(project, reference)` pair is fetched at most once. The fetch runs
/// on its own task, so callers that give up waiting never abort it and
/// later callers join the same outcome instead of starting another one. A
/// failed fetch is remembered too, and every later call gets the original
/// reference back without another attempt. Non-`/uploads/` references are
/// passed through untouched and never enter the cache.
pub struct AssetResolver<A, S = TempAssetStore> {
    api: Arc<A>,
    store: Arc<S>,
    entries: DashMap<AssetKey, Slot>,
}

impl<A: GitLabApi + 'static, S: AssetStore + 'static> AssetResolver<A, S> {
    pub fn new(api: Arc<A>, store: S) -> Self {
        Self {
            api,
            store: Arc::new(store),
            entries: DashMap::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Local reference for `source`, or `source` itself if it is not a
    /// protected upload or could not be fetched.
    pub async fn resolve(&self, project_id: ProjectId, source: &str) -> String {
        if !is_protected(source) {
            return source.to_string();
        }

        let key = AssetKey {
            project_id,
            source: source.to_string(),
        };
        let slot = self
            .entries
            .entry(key)
            .or_insert_with(|| self.spawn_fetch(project_id, source))
            .clone();

        slot.done.await.unwrap_or_else(|| source.to_string())
    }

    fn spawn_fetch(&self, project_id: ProjectId, source: &str) -> Slot {
        let api = Arc::clone(&self.api);
        let store = Arc::clone(&self.store);
        let source = source.to_string();
        let outcome = Arc::new(OnceCell::new());

        let written = Arc::clone(&outcome);
        let task = tokio::spawn(async move {
            let local = fetch(&*api, &*store, project_id, &source).await;
            written.set(local.clone()).ok();
            local
        });

        let aborted = Arc::clone(&outcome);
        let done = async move {
            task.await.unwrap_or_else(|e| {
                warn!(error = %e, "asset fetch task ended abnormally");
                aborted.set(None).ok();
                None
            })
        }
        .boxed()
        .shared();

        Slot { outcome, done }
    }

    pub fn state(&self, project_id: ProjectId, source: &str) -> Option<AssetState> {
        let key = AssetKey {
            project_id,
            source: source.to_string(),
        };
        let slot = self.entries.get(&key)?;
        Some(match slot.outcome.get() {
            None => AssetState::Pending,
            Some(Some(local)) => AssetState::Resolved(local.clone()),
            Some(None) => AssetState::Failed,
        })
    }

    /// Release a reference handed out by [`AssetResolver::resolve`] and
    /// forget its cache entry. Returns false if `local` is not one of ours.
    pub fn release(&self, local: &str) -> bool {
        let key = self.entries.iter().find_map(|entry| {
            matches!(entry.value().outcome.get(), Some(Some(l)) if l.as_str() == local)
                .then(|| entry.key().clone())
        });

        match key {
            Some(key) => {
                self.entries.remove(&key);
                self.store.release(local);
                true
            }
            None => false,
        }
    }

    /// Release every resolved asset and clear the cache.
    pub fn release_all(&self) {
        let locals: Vec<String> = self
            .entries
            .iter()
            .filter_map(|entry| entry.value().outcome.get().cloned().flatten())
            .collect();
        self.entries.clear();
        for local in locals {
            self.store.release(&local);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

async fn fetch<A: GitLabApi, S: AssetStore>(
    api: &A,
    store: &S,
    project_id: ProjectId,
    source: &str,
) -> Option<String> {
    debug!(project_id = %project_id, source, "fetching protected asset");

    let payload = match api.fetch_upload(project_id, source).await {
        Ok(payload) => payload,
        Err(e) => {
            warn!(project_id = %project_id, source, error = %e, "asset fetch failed");
            return None;
        }
    };

    match store.materialize(source, payload) {
        Ok(local) => Some(local),
        Err(e) => {
            warn!(project_id = %project_id, source, error = %e, "could not store asset");
            None
        }
    }
}
