//! Wire records for the GitLab v4 REST API.
//!
//! Every field the client reads has a fixed type here. Fields the server may
//! omit or null out carry `#[serde(default)]`; identity fields (ids, iid,
//! project id, title, timestamps) are required and a response missing them
//! fails to decode instead of flowing through half-populated.

use jiff::Timestamp;
use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::types::{IssueIid, IssueState, ProjectId, UserId};

/// User as embedded in issues, notes and member lists
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub web_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    pub id: u64,
    pub iid: u64,
    pub title: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub start_date: Option<Date>,
    #[serde(default)]
    pub web_url: String,
}

/// Time tracking counters, in seconds
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStats {
    #[serde(default)]
    pub time_estimate: i64,
    #[serde(default)]
    pub total_time_spent: i64,
    #[serde(default)]
    pub human_time_estimate: Option<String>,
    #[serde(default)]
    pub human_total_time_spent: Option<String>,
}

impl TimeStats {
    pub fn is_tracked(&self) -> bool {
        self.time_estimate > 0 || self.total_time_spent > 0
    }
}

/// Checklist progress parsed by the server from the description
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletionStatus {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub completed_count: u32,
}

impl TaskCompletionStatus {
    /// Completed share in whole percent, `None` when there are no tasks.
    pub fn percent(&self) -> Option<u8> {
        if self.count == 0 {
            return None;
        }
        let done = self.completed_count.min(self.count);
        Some(((u64::from(done) * 100) / u64::from(self.count)) as u8)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct References {
    #[serde(default)]
    pub short: String,
    #[serde(default)]
    pub relative: String,
    #[serde(default)]
    pub full: String,
}

/// Stable identity of an issue across listings and detail fetches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IssueKey {
    pub project_id: ProjectId,
    pub iid: IssueIid,
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.project_id, self.iid)
    }
}

/// Row of an issue listing. Replaced wholesale on refetch, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSummary {
    /// Instance-wide id
    pub id: u64,
    pub iid: IssueIid,
    pub project_id: ProjectId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub state: IssueState,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    #[serde(default)]
    pub closed_at: Option<Timestamp>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub milestone: Option<Milestone>,
    pub author: User,
    #[serde(default)]
    pub assignee: Option<User>,
    #[serde(default)]
    pub assignees: Vec<User>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub time_stats: TimeStats,
    #[serde(default)]
    pub task_completion_status: TaskCompletionStatus,
}

impl IssueSummary {
    pub fn key(&self) -> IssueKey {
        IssueKey {
            project_id: self.project_id,
            iid: self.iid,
        }
    }
}

/// Full issue as returned by `GET /projects/:id/issues/:iid`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueDetail {
    #[serde(flatten)]
    pub issue: IssueSummary,
    #[serde(default)]
    pub closed_by: Option<User>,
    #[serde(default)]
    pub user_notes_count: u32,
    #[serde(default)]
    pub merge_requests_count: u32,
    #[serde(default)]
    pub upvotes: u32,
    #[serde(default)]
    pub downvotes: u32,
    #[serde(default)]
    pub due_date: Option<Date>,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub discussion_locked: Option<bool>,
    #[serde(default)]
    pub issue_type: Option<String>,
    #[serde(default)]
    pub blocking_issues_count: u32,
    #[serde(default)]
    pub has_tasks: bool,
    #[serde(default)]
    pub task_status: Option<String>,
    #[serde(default)]
    pub references: References,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub subscribed: Option<bool>,
    #[serde(default)]
    pub health_status: Option<String>,
}

impl IssueDetail {
    pub fn key(&self) -> IssueKey {
        self.issue.key()
    }
}

/// Discussion entry on an issue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    #[serde(default)]
    pub body: String,
    pub author: User,
    pub created_at: Timestamp,
    #[serde(default)]
    pub updated_at: Option<Timestamp>,
    /// Generated by GitLab itself ("changed the description", label events...)
    #[serde(default)]
    pub system: bool,
    #[serde(default, rename = "type")]
    pub note_type: Option<String>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
    #[serde(default)]
    pub noteable_iid: Option<IssueIid>,
    #[serde(default)]
    pub resolvable: bool,
    #[serde(default)]
    pub confidential: bool,
    #[serde(default)]
    pub internal: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub name_with_namespace: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub path_with_namespace: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub web_url: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub star_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub last_activity_at: Option<Timestamp>,
}
