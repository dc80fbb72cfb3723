//! In-memory [`GitLabApi`] with scripted latency, for orchestration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use jiff::Timestamp;
use parking_lot::Mutex;
use reqwest::StatusCode;

use crate::error::{IssueLensError, Result};
use crate::types::{IssueIid, IssueState, ProjectId, UserId};

use super::models::{References, TaskCompletionStatus, TimeStats};
use super::{
    AssetPayload, GitLabApi, IssueDetail, IssueQuery, IssueSummary, Note, PageMeta, Paged,
    Project, User,
};

type Reply<T> = (Duration, Result<T>);
type Handler<A, T> = Box<dyn Fn(A) -> Reply<T> + Send + Sync>;

fn not_found<T>() -> Reply<T> {
    (
        Duration::ZERO,
        Err(IssueLensError::Remote {
            status: StatusCode::NOT_FOUND,
        }),
    )
}

pub(crate) struct FakeGitLab {
    list: Handler<IssueQuery, Paged<IssueSummary>>,
    detail: Handler<(ProjectId, IssueIid), IssueDetail>,
    notes: Handler<(ProjectId, IssueIid), Vec<Note>>,
    projects: Handler<String, Vec<Project>>,
    users: Handler<ProjectId, Vec<User>>,
    upload: Handler<(ProjectId, String), AssetPayload>,
    pub list_calls: AtomicUsize,
    pub detail_calls: AtomicUsize,
    pub notes_calls: AtomicUsize,
    pub project_calls: AtomicUsize,
    pub user_calls: AtomicUsize,
    pub upload_calls: AtomicUsize,
    pub log: Mutex<Vec<String>>,
}

impl FakeGitLab {
    pub fn new() -> Self {
        Self {
            list: Box::new(|_| not_found()),
            detail: Box::new(|_| not_found()),
            notes: Box::new(|_| not_found()),
            projects: Box::new(|_| not_found()),
            users: Box::new(|_| not_found()),
            upload: Box::new(|_| not_found()),
            list_calls: AtomicUsize::new(0),
            detail_calls: AtomicUsize::new(0),
            notes_calls: AtomicUsize::new(0),
            project_calls: AtomicUsize::new(0),
            user_calls: AtomicUsize::new(0),
            upload_calls: AtomicUsize::new(0),
            log: Mutex::new(Vec::new()),
        }
    }

    pub fn on_list(
        mut self,
        f: impl Fn(IssueQuery) -> Reply<Paged<IssueSummary>> + Send + Sync + 'static,
    ) -> Self {
        self.list = Box::new(f);
        self
    }

    pub fn on_detail(
        mut self,
        f: impl Fn((ProjectId, IssueIid)) -> Reply<IssueDetail> + Send + Sync + 'static,
    ) -> Self {
        self.detail = Box::new(f);
        self
    }

    pub fn on_notes(
        mut self,
        f: impl Fn((ProjectId, IssueIid)) -> Reply<Vec<Note>> + Send + Sync + 'static,
    ) -> Self {
        self.notes = Box::new(f);
        self
    }

    pub fn on_projects(
        mut self,
        f: impl Fn(String) -> Reply<Vec<Project>> + Send + Sync + 'static,
    ) -> Self {
        self.projects = Box::new(f);
        self
    }

    pub fn on_users(
        mut self,
        f: impl Fn(ProjectId) -> Reply<Vec<User>> + Send + Sync + 'static,
    ) -> Self {
        self.users = Box::new(f);
        self
    }

    pub fn on_upload(
        mut self,
        f: impl Fn((ProjectId, String)) -> Reply<AssetPayload> + Send + Sync + 'static,
    ) -> Self {
        self.upload = Box::new(f);
        self
    }

    pub fn calls(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    fn record(&self, counter: &AtomicUsize, entry: String) {
        counter.fetch_add(1, Ordering::SeqCst);
        self.log.lock().push(entry);
    }
}

async fn deliver<T>((delay, result): Reply<T>) -> Result<T> {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    result
}

impl GitLabApi for FakeGitLab {
    async fn list_issues(&self, query: &IssueQuery) -> Result<Paged<IssueSummary>> {
        self.record(&self.list_calls, format!("list page={}", query.page));
        deliver((self.list)(query.clone())).await
    }

    async fn issue_detail(&self, project_id: ProjectId, iid: IssueIid) -> Result<IssueDetail> {
        self.record(&self.detail_calls, format!("detail {project_id}#{iid}"));
        deliver((self.detail)((project_id, iid))).await
    }

    async fn issue_notes(&self, project_id: ProjectId, iid: IssueIid) -> Result<Vec<Note>> {
        self.record(&self.notes_calls, format!("notes {project_id}#{iid}"));
        deliver((self.notes)((project_id, iid))).await
    }

    async fn search_projects(&self, term: &str) -> Result<Vec<Project>> {
        self.record(&self.project_calls, format!("projects {term}"));
        deliver((self.projects)(term.to_string())).await
    }

    async fn project_users(&self, project_id: ProjectId) -> Result<Vec<User>> {
        self.record(&self.user_calls, format!("users {project_id}"));
        deliver((self.users)(project_id)).await
    }

    async fn current_user(&self) -> Result<User> {
        Ok(user(1, "root"))
    }

    async fn fetch_upload(&self, project_id: ProjectId, upload_path: &str) -> Result<AssetPayload> {
        self.record(&self.upload_calls, format!("upload {project_id}{upload_path}"));
        deliver((self.upload)((project_id, upload_path.to_string()))).await
    }
}

pub(crate) fn user(id: u64, username: &str) -> User {
    User {
        id: UserId(id),
        username: username.to_string(),
        name: format!("{username} name"),
        state: "active".to_string(),
        avatar_url: None,
        web_url: format!("https://gitlab.example.com/{username}"),
    }
}

pub(crate) fn issue(project_id: u64, iid: u64) -> IssueSummary {
    IssueSummary {
        id: project_id * 1000 + iid,
        iid: IssueIid(iid),
        project_id: ProjectId(project_id),
        title: format!("Issue {iid} of project {project_id}"),
        description: Some(String::new()),
        state: IssueState::Opened,
        created_at: Timestamp::from_second(1_700_000_000).unwrap(),
        updated_at: Timestamp::from_second(1_700_000_000).unwrap(),
        closed_at: None,
        labels: vec![],
        milestone: None,
        author: user(1, "alice"),
        assignee: None,
        assignees: vec![],
        web_url: String::new(),
        time_stats: TimeStats::default(),
        task_completion_status: TaskCompletionStatus::default(),
    }
}

pub(crate) fn detail(project_id: u64, iid: u64) -> IssueDetail {
    IssueDetail {
        issue: issue(project_id, iid),
        closed_by: None,
        user_notes_count: 0,
        merge_requests_count: 0,
        upvotes: 0,
        downvotes: 0,
        due_date: None,
        confidential: false,
        discussion_locked: None,
        issue_type: Some("issue".to_string()),
        blocking_issues_count: 0,
        has_tasks: false,
        task_status: None,
        references: References::default(),
        severity: None,
        subscribed: None,
        health_status: None,
    }
}

pub(crate) fn note(id: u64, created_second: i64, system: bool) -> Note {
    Note {
        id,
        body: format!("note {id}"),
        author: user(2, "bob"),
        created_at: Timestamp::from_second(created_second).unwrap(),
        updated_at: None,
        system,
        note_type: None,
        project_id: None,
        noteable_iid: None,
        resolvable: false,
        confidential: false,
        internal: false,
    }
}

pub(crate) fn project(id: u64, name: &str) -> Project {
    Project {
        id: ProjectId(id),
        name: name.to_string(),
        name_with_namespace: format!("group / {name}"),
        path: name.to_lowercase(),
        path_with_namespace: format!("group/{}", name.to_lowercase()),
        description: None,
        web_url: String::new(),
        avatar_url: None,
        star_count: 0,
        forks_count: 0,
        last_activity_at: None,
    }
}

pub(crate) fn page(items: Vec<IssueSummary>, meta: PageMeta) -> Paged<IssueSummary> {
    Paged { items, meta }
}
