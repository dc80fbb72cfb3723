use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::remote::{IssueDetail, IssueSummary, Note, Project, User};
use crate::types::{IssueState, PaginationInfo};

pub mod markdown;

/// Number of page links shown around the current page.
pub const PAGE_WINDOW: u32 = 5;

pub fn format_state_colored(state: &IssueState) -> String {
    let badge = format!("[{state}]");
    match state {
        IssueState::Opened => badge.green().to_string(),
        IssueState::Closed => badge.dimmed().to_string(),
        IssueState::Other(_) => badge.yellow().to_string(),
    }
}

/// Notes the detail view shows: everything except system events.
pub fn rendered_notes(notes: &[Note]) -> Vec<&Note> {
    notes.iter().filter(|n| !n.system).collect()
}

fn user_list(users: &[User]) -> String {
    if users.is_empty() {
        "-".to_string()
    } else {
        users
            .iter()
            .map(|u| format!("@{}", u.username))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[derive(Tabled)]
struct IssueRow {
    #[tabled(rename = "Issue")]
    key: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Author")]
    author: String,
    #[tabled(rename = "Assignees")]
    assignees: String,
    #[tabled(rename = "Labels")]
    labels: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

pub fn format_issue_table(issues: &[IssueSummary]) -> String {
    let rows: Vec<IssueRow> = issues
        .iter()
        .map(|issue| IssueRow {
            key: issue.key().to_string(),
            state: issue.state.to_string(),
            title: issue.title.clone(),
            author: format!("@{}", issue.author.username),
            assignees: user_list(&issue.assignees),
            labels: if issue.labels.is_empty() {
                "-".to_string()
            } else {
                issue.labels.join(", ")
            },
            updated: issue.updated_at.strftime("%Y-%m-%d").to_string(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// `Page 2 of 5 (93 issues)  1 [2] 3 4 5`
pub fn format_pagination(pagination: &PaginationInfo) -> String {
    let pages = pagination
        .visible_pages(PAGE_WINDOW)
        .map(|page| {
            if page == pagination.current_page {
                format!("[{page}]").bold().to_string()
            } else {
                page.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    format!(
        "Page {} of {} ({} issues)  {}",
        pagination.current_page, pagination.total_pages, pagination.total_items, pages
    )
}

#[derive(Tabled)]
struct ProjectRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Project")]
    path: String,
    #[tabled(rename = "Description")]
    description: String,
}

pub fn format_project_table(projects: &[Project]) -> String {
    let rows: Vec<ProjectRow> = projects
        .iter()
        .map(|p| ProjectRow {
            id: p.id.0,
            path: p.path_with_namespace.clone(),
            description: p.description.clone().unwrap_or_default(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

#[derive(Tabled)]
struct UserRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Username")]
    username: String,
    #[tabled(rename = "Name")]
    name: String,
}

pub fn format_user_table(users: &[User]) -> String {
    let rows: Vec<UserRow> = users
        .iter()
        .map(|u| UserRow {
            id: u.id.0,
            username: format!("@{}", u.username),
            name: u.name.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.to_string()
}

/// Header block for the detail view. `description` is the body after
/// image rewriting.
pub fn format_issue_detail(detail: &IssueDetail, description: &str) -> String {
    let issue = &detail.issue;
    let mut output = format!(
        "{} {} {}\n",
        format_state_colored(&issue.state),
        issue.key().to_string().cyan(),
        issue.title.bold()
    );

    output.push_str(&format!(
        "Opened {} by @{}",
        issue.created_at.strftime("%Y-%m-%d"),
        issue.author.username
    ));
    if let Some(closed_at) = issue.closed_at {
        output.push_str(&format!(", closed {}", closed_at.strftime("%Y-%m-%d")));
        if let Some(ref closed_by) = detail.closed_by {
            output.push_str(&format!(" by @{}", closed_by.username));
        }
    }
    output.push('\n');

    output.push_str(&format!("Assignees: {}\n", user_list(&issue.assignees)));
    if !issue.labels.is_empty() {
        output.push_str(&format!("Labels: {}\n", issue.labels.join(", ")));
    }
    if let Some(ref milestone) = issue.milestone {
        output.push_str(&format!("Milestone: {}\n", milestone.title));
    }
    if let Some(due) = detail.due_date {
        output.push_str(&format!("Due: {due}\n"));
    }
    if let Some(percent) = issue.task_completion_status.percent() {
        output.push_str(&format!(
            "Tasks: {}/{} ({percent}%)\n",
            issue.task_completion_status.completed_count, issue.task_completion_status.count
        ));
    }
    if issue.time_stats.is_tracked() {
        output.push_str(&format!(
            "Time: {} spent / {} estimated\n",
            issue
                .time_stats
                .human_total_time_spent
                .as_deref()
                .unwrap_or("0h"),
            issue.time_stats.human_time_estimate.as_deref().unwrap_or("-")
        ));
    }
    if detail.confidential {
        output.push_str(&format!("{}\n", "Confidential".red()));
    }
    output.push_str(&format!(
        "{} {}  {} {}  Merge requests: {}\n",
        "+".green(),
        detail.upvotes,
        "-".red(),
        detail.downvotes,
        detail.merge_requests_count
    ));

    let description = description.trim();
    if !description.is_empty() {
        output.push('\n');
        output.push_str(description);
        output.push('\n');
    }
    output
}

/// One note as shown under the detail. `body` is the note body after
/// image rewriting.
pub fn format_note(note: &Note, body: &str) -> String {
    let mut output = format!(
        "{} {}",
        format!("@{}", note.author.username).cyan(),
        note.created_at.strftime("%Y-%m-%d %H:%M").dimmed()
    );
    if note.internal || note.confidential {
        output.push_str(&format!(" {}", "(internal)".yellow()));
    }
    for line in body.trim().lines() {
        output.push_str(&format!("\n  {line}"));
    }
    output
}
