use std::sync::Arc;

use serde_json::json;

use super::{CommandOutput, connect};
use crate::browse::{SearchOutcome, member_search, project_search};
use crate::config::FileConfigProvider;
use crate::display::{format_project_table, format_user_table};
use crate::error::Result;
use crate::types::ProjectId;

/// Search projects the current user is a member of
pub async fn cmd_projects(
    provider: FileConfigProvider,
    term: Option<&str>,
    output_json: bool,
) -> Result<()> {
    let session = connect(provider)?;
    let search = project_search(Arc::clone(&session.api), session.config.search_debounce());

    let projects = match search.search(term.unwrap_or_default()).await {
        SearchOutcome::Results(projects) => projects,
        SearchOutcome::Superseded => Vec::new(),
    };

    let text_output = if projects.is_empty() {
        "No projects found.".to_string()
    } else {
        format!(
            "{}\n\n{} project(s)",
            format_project_table(&projects),
            projects.len()
        )
    };

    CommandOutput::new(json!(projects))
        .with_text(text_output)
        .print(output_json)
}

/// Search members of a project, as offered by the assignee and author
/// pickers
pub async fn cmd_users(
    provider: FileConfigProvider,
    project_id: ProjectId,
    term: Option<&str>,
    output_json: bool,
) -> Result<()> {
    let session = connect(provider)?;
    let search = member_search(
        Arc::clone(&session.api),
        project_id,
        session.config.search_debounce(),
    );

    let users = search
        .search(term.unwrap_or_default())
        .await
        .into_results()
        .unwrap_or_default();

    let text_output = if users.is_empty() {
        "No users found.".to_string()
    } else {
        format!("{}\n\n{} user(s)", format_user_table(&users), users.len())
    };

    CommandOutput::new(json!(users))
        .with_text(text_output)
        .print(output_json)
}
