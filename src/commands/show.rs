use std::path::PathBuf;
use std::sync::Arc;

use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, connect};
use crate::browse::{AssetResolver, AssetStore, DetailLoader, TempAssetStore};
use crate::config::FileConfigProvider;
use crate::display::markdown::resolve_images;
use crate::display::{format_issue_detail, format_note, rendered_notes};
use crate::error::{IssueLensError, Result};
use crate::remote::{GitLabApi, IssueKey};
use crate::types::{IssueIid, ProjectId};

#[derive(Debug, Clone, Default)]
pub struct ShowOptions {
    /// Keep downloaded images here instead of a temporary directory.
    pub assets_dir: Option<PathBuf>,
    /// Leave image references as written.
    pub no_assets: bool,
}

/// Display an issue with its notes
pub async fn cmd_show(
    provider: FileConfigProvider,
    project_id: ProjectId,
    iid: IssueIid,
    options: ShowOptions,
    output_json: bool,
) -> Result<()> {
    let session = connect(provider)?;
    let keep_assets = options.assets_dir.is_some();
    let store = match options.assets_dir {
        Some(ref dir) => TempAssetStore::in_dir(dir)?,
        None => TempAssetStore::new()?,
    };
    let assets = Arc::new(AssetResolver::new(Arc::clone(&session.api), store));
    let loader = DetailLoader::new(Arc::clone(&session.api), Arc::clone(&assets));

    loader.select(IssueKey { project_id, iid }).await;
    let state = loader.snapshot();

    let Some(detail) = state.detail else {
        return Err(IssueLensError::View(
            state
                .detail_error
                .unwrap_or_else(|| "Could not load the issue.".to_string()),
        ));
    };
    let notes = state.notes.unwrap_or_default();

    if output_json {
        return CommandOutput::new(json!({
            "issue": detail,
            "notes": notes,
            "notes_error": state.notes_error,
        }))
        .print(true);
    }

    let rewrite = !options.no_assets;
    let description = detail.issue.description.clone().unwrap_or_default();
    let description = render_body(&loader, &description, rewrite).await;
    let mut text_output = format_issue_detail(&detail, &description);

    match state.notes_error {
        Some(message) => {
            text_output.push_str(&format!("\n{} {}", "Notes unavailable:".yellow(), message));
        }
        None => {
            let shown = rendered_notes(&notes);
            if !shown.is_empty() {
                text_output.push_str(&format!("\n{}", format!("Notes ({})", shown.len()).bold()));
            }
            for note in shown {
                let body = render_body(&loader, &note.body, rewrite).await;
                text_output.push_str(&format!("\n\n{}", format_note(note, &body)));
            }
        }
    }

    println!("{text_output}");

    if !keep_assets {
        assets.release_all();
    }
    Ok(())
}

async fn render_body<A: GitLabApi + 'static, S: AssetStore + 'static>(
    loader: &DetailLoader<A, S>,
    body: &str,
    rewrite: bool,
) -> String {
    if !rewrite {
        return body.to_string();
    }
    resolve_images(body, |source| async move { loader.resolve_asset(&source).await }).await
}
