mod config;
mod issues;
mod search;
mod show;
mod verify;

pub use config::cmd_config_show;
pub use issues::{IssuesOptions, cmd_issues};
pub use search::{cmd_projects, cmd_users};
pub use show::{ShowOptions, cmd_show};
pub use verify::cmd_verify;

use std::sync::Arc;

use serde_json::Value;

use crate::config::{ConfigProvider, FileConfigProvider, GitLabConfig};
use crate::error::Result;
use crate::remote::GitLabClient;

pub type Client = GitLabClient<FileConfigProvider>;

/// A client plus the settings that were current when it was built.
///
/// The client itself re-reads configuration on every request; the
/// snapshot is only used for values a command needs up front, such as the
/// page size.
pub(crate) struct Session {
    pub api: Arc<Client>,
    pub config: GitLabConfig,
}

pub(crate) fn connect(provider: FileConfigProvider) -> Result<Session> {
    let config = provider.current()?;
    let api = Arc::new(GitLabClient::new(provider)?);
    Ok(Session { api, config })
}

/// Output of a command in both of its forms.
pub struct CommandOutput {
    json: Value,
    text: Option<String>,
}

impl CommandOutput {
    pub fn new(json: Value) -> Self {
        Self { json, text: None }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Print as JSON when `json` is set, else as text. Falls back to
    /// JSON when no text form was given.
    pub fn print(self, json: bool) -> Result<()> {
        match (json, self.text) {
            (false, Some(text)) => {
                println!("{text}");
                Ok(())
            }
            _ => print_json(&self.json),
        }
    }
}

pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
