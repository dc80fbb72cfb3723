use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IssueLensError {
    /// The server answered with a non-2xx status.
    #[error("GitLab API returned HTTP {status}")]
    Remote { status: StatusCode },

    /// The request never produced a response (DNS, TLS, timeout, reset...).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The response body did not match the expected shape.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A list or detail request failed and its message was already put in
    /// view state.
    #[error("{0}")]
    View(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml_ng::Error),
}

impl IssueLensError {
    /// Short text suitable for showing next to the pane that failed.
    pub fn user_message(&self) -> String {
        match self {
            IssueLensError::Remote { status } if *status == StatusCode::UNAUTHORIZED => {
                "GitLab rejected the token (401). Check GITLAB_TOKEN.".to_string()
            }
            IssueLensError::Remote { status } if *status == StatusCode::NOT_FOUND => {
                "Not found on the server (404).".to_string()
            }
            IssueLensError::Remote { status } => {
                format!("GitLab request failed with HTTP {}", status.as_u16())
            }
            IssueLensError::Network(_) => "Could not reach the GitLab server.".to_string(),
            IssueLensError::Decode(_) => "GitLab sent a response that could not be read.".to_string(),
            other => other.to_string(),
        }
    }

    /// HTTP status for `Remote` errors.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            IssueLensError::Remote { status } => Some(*status),
            IssueLensError::Network(e) => e.status(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, IssueLensError>;
