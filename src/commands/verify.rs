use owo_colors::OwoColorize;
use serde_json::json;

use super::{CommandOutput, connect};
use crate::config::FileConfigProvider;
use crate::error::Result;
use crate::remote::GitLabApi;

/// Check that the configured URL and token work by fetching the current
/// user
pub async fn cmd_verify(provider: FileConfigProvider, output_json: bool) -> Result<()> {
    let session = connect(provider)?;
    let user = session.api.current_user().await?;

    let json_output = json!({
        "url": session.config.base_url(),
        "user": user,
    });
    let text_output = format!(
        "{} Connected to {} as @{} ({})",
        "ok".green().bold(),
        session.config.base_url(),
        user.username,
        user.name
    );

    CommandOutput::new(json_output)
        .with_text(text_output)
        .print(output_json)
}
