//! Project and member pickers built on [`SearchDebouncer`].

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OnceCell;

use crate::error::Result;
use crate::remote::{GitLabApi, Project, User};
use crate::types::ProjectId;

use super::debounce::{Lookup, SearchDebouncer, contains_ignore_case};

/// Projects the current user is a member of, searched server-side.
pub struct ProjectLookup<A> {
    api: Arc<A>,
}

impl<A> ProjectLookup<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

impl<A: GitLabApi> Lookup for ProjectLookup<A> {
    type Item = Project;

    async fn lookup(&self, term: &str) -> Result<Vec<Project>> {
        self.api.search_projects(term).await
    }

    /// The server already applied `term`, including fields such as the
    /// description that are not part of the listing.
    fn matches(&self, _project: &Project, _term: &str) -> bool {
        true
    }
}

/// Members of one project.
///
/// The member list is fetched on the first search and reused for every
/// later term; matching happens locally. A failed fetch is retried on the
/// next search.
pub struct MemberLookup<A> {
    api: Arc<A>,
    project_id: ProjectId,
    members: OnceCell<Vec<User>>,
}

impl<A> MemberLookup<A> {
    pub fn new(api: Arc<A>, project_id: ProjectId) -> Self {
        Self {
            api,
            project_id,
            members: OnceCell::new(),
        }
    }

    pub fn project_id(&self) -> ProjectId {
        self.project_id
    }
}

impl<A: GitLabApi> Lookup for MemberLookup<A> {
    type Item = User;

    async fn lookup(&self, _term: &str) -> Result<Vec<User>> {
        let members = self
            .members
            .get_or_try_init(|| self.api.project_users(self.project_id))
            .await?;
        Ok(members.clone())
    }

    fn matches(&self, user: &User, term: &str) -> bool {
        contains_ignore_case(&user.name, term) || contains_ignore_case(&user.username, term)
    }
}

pub type ProjectSearch<A> = SearchDebouncer<ProjectLookup<A>>;
pub type MemberSearch<A> = SearchDebouncer<MemberLookup<A>>;

pub fn project_search<A: GitLabApi>(api: Arc<A>, interval: Duration) -> ProjectSearch<A> {
    SearchDebouncer::new(ProjectLookup::new(api), interval)
}

/// Assignee/author picker for `project_id`. Build a new one when the
/// project filter changes.
pub fn member_search<A: GitLabApi>(
    api: Arc<A>,
    project_id: ProjectId,
    interval: Duration,
) -> MemberSearch<A> {
    SearchDebouncer::new(MemberLookup::new(api, project_id), interval)
}
