//! GitLab REST transport.
//!
//! The orchestration layer in [`crate::browse`] talks to the server only
//! through the [`GitLabApi`] trait. [`GitLabClient`] is the reqwest-backed
//! implementation; tests substitute their own.

pub mod auth;
pub mod client;
pub mod models;
pub mod pagination;

#[cfg(test)]
pub(crate) mod testing;

use std::future::Future;
use std::sync::Arc;

use crate::error::Result;
use crate::types::{IssueIid, ProjectId, UserId};

pub use client::GitLabClient;
pub use models::{IssueDetail, IssueKey, IssueSummary, Milestone, Note, Project, User};
pub use pagination::PageMeta;

/// Parameters of one issue-list request.
///
/// Unset filters are left out of the query string entirely; with no project
/// the request goes to the instance-wide `/issues` endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueQuery {
    pub project_id: Option<ProjectId>,
    pub assignee_id: Option<UserId>,
    pub author_id: Option<UserId>,
    pub page: u32,
    pub per_page: u32,
}

impl IssueQuery {
    pub fn path(&self) -> String {
        match self.project_id {
            Some(project_id) => format!("/projects/{project_id}/issues"),
            None => "/issues".to_string(),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("per_page", self.per_page.to_string()),
        ];
        if let Some(assignee) = self.assignee_id {
            pairs.push(("assignee_id", assignee.to_string()));
        }
        if let Some(author) = self.author_id {
            pairs.push(("author_id", author.to_string()));
        }
        pairs
    }
}

/// A page of records plus whatever pagination metadata came with it
#[derive(Debug, Clone)]
pub struct Paged<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

/// Raw bytes of an authenticated download
#[derive(Debug, Clone)]
pub struct AssetPayload {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// The endpoints the browser depends on.
pub trait GitLabApi: Send + Sync {
    /// `GET /issues` or `GET /projects/:id/issues`
    fn list_issues(
        &self,
        query: &IssueQuery,
    ) -> impl Future<Output = Result<Paged<IssueSummary>>> + Send;

    /// `GET /projects/:id/issues/:iid`
    fn issue_detail(
        &self,
        project_id: ProjectId,
        iid: IssueIid,
    ) -> impl Future<Output = Result<IssueDetail>> + Send;

    /// `GET /projects/:id/issues/:iid/notes?sort=asc`
    fn issue_notes(
        &self,
        project_id: ProjectId,
        iid: IssueIid,
    ) -> impl Future<Output = Result<Vec<Note>>> + Send;

    /// `GET /projects?membership=true&search=term`
    fn search_projects(&self, term: &str) -> impl Future<Output = Result<Vec<Project>>> + Send;

    /// `GET /projects/:id/users`
    fn project_users(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send;

    /// `GET /user`
    fn current_user(&self) -> impl Future<Output = Result<User>> + Send;

    /// Authenticated download of a `/uploads/...` reference from a
    /// project's markdown.
    fn fetch_upload(
        &self,
        project_id: ProjectId,
        upload_path: &str,
    ) -> impl Future<Output = Result<AssetPayload>> + Send;
}

impl<A: GitLabApi + ?Sized> GitLabApi for Arc<A> {
    fn list_issues(
        &self,
        query: &IssueQuery,
    ) -> impl Future<Output = Result<Paged<IssueSummary>>> + Send {
        (**self).list_issues(query)
    }

    fn issue_detail(
        &self,
        project_id: ProjectId,
        iid: IssueIid,
    ) -> impl Future<Output = Result<IssueDetail>> + Send {
        (**self).issue_detail(project_id, iid)
    }

    fn issue_notes(
        &self,
        project_id: ProjectId,
        iid: IssueIid,
    ) -> impl Future<Output = Result<Vec<Note>>> + Send {
        (**self).issue_notes(project_id, iid)
    }

    fn search_projects(&self, term: &str) -> impl Future<Output = Result<Vec<Project>>> + Send {
        (**self).search_projects(term)
    }

    fn project_users(
        &self,
        project_id: ProjectId,
    ) -> impl Future<Output = Result<Vec<User>>> + Send {
        (**self).project_users(project_id)
    }

    fn current_user(&self) -> impl Future<Output = Result<User>> + Send {
        (**self).current_user()
    }

    fn fetch_upload(
        &self,
        project_id: ProjectId,
        upload_path: &str,
    ) -> impl Future<Output = Result<AssetPayload>> + Send {
        (**self).fetch_upload(project_id, upload_path)
    }
}
