use std::sync::Arc;

use serde_json::json;

use super::{CommandOutput, connect};
use crate::browse::{FilterState, IssueBrowser, IssueQueryEngine, ListOutcome};
use crate::config::FileConfigProvider;
use crate::display::{format_issue_table, format_pagination};
use crate::error::{IssueLensError, Result};
use crate::types::{ProjectId, UserId};

/// Filters given on the command line
#[derive(Debug, Clone, Copy, Default)]
pub struct IssuesOptions {
    pub project: Option<ProjectId>,
    pub assignee: Option<UserId>,
    pub author: Option<UserId>,
    pub page: u32,
}

/// List one page of issues
pub async fn cmd_issues(
    provider: FileConfigProvider,
    options: IssuesOptions,
    output_json: bool,
) -> Result<()> {
    let session = connect(provider)?;
    let engine = IssueQueryEngine::new(Arc::clone(&session.api), session.config.per_page());
    let browser = IssueBrowser::with_filter(
        engine,
        FilterState {
            project_id: options.project,
            assignee_id: options.assignee,
            author_id: options.author,
            page: options.page,
        },
    );

    let outcome = browser.refresh().await;
    let state = browser.snapshot();

    if outcome == ListOutcome::Failed {
        return Err(IssueLensError::View(
            state
                .error
                .unwrap_or_else(|| "Could not load issues.".to_string()),
        ));
    }

    let pagination = state.pagination;
    if state.filter.page > 1 && !pagination.contains_page(state.filter.page) {
        return Err(IssueLensError::InvalidArgument(format!(
            "page {} is past the last page ({})",
            state.filter.page, pagination.total_pages
        )));
    }

    let json_output = json!({
        "filter": state.filter,
        "pagination": pagination,
        "issues": state.items,
    });

    let text_output = if state.items.is_empty() {
        "No issues found.".to_string()
    } else {
        format!(
            "{}\n{}",
            format_issue_table(&state.items),
            format_pagination(&pagination)
        )
    };

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}
