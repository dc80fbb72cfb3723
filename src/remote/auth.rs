//! Credential attachment.
//!
//! Every request, API call or upload download alike, carries the token as
//! `Authorization: Bearer <token>`. The header value is flagged sensitive so
//! reqwest and hyper print it as `Sensitive` if request logging is enabled.

use reqwest::RequestBuilder;
use reqwest::header::{self, HeaderValue};
use secrecy::{ExposeSecret, SecretBox};

use crate::config::GitLabConfig;
use crate::error::{IssueLensError, Result};

pub fn authorization_value(token: &SecretBox<String>) -> Result<HeaderValue> {
    let token = token.expose_secret();
    if token.is_empty() {
        return Err(IssueLensError::Auth("GitLab token is empty".to_string()));
    }

    let mut value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|_| {
        IssueLensError::Auth("GitLab token contains characters not allowed in a header".to_string())
    })?;
    value.set_sensitive(true);
    Ok(value)
}

/// Attach the configured credential to `request`.
pub fn authorize(request: RequestBuilder, config: &GitLabConfig) -> Result<RequestBuilder> {
    Ok(request.header(header::AUTHORIZATION, authorization_value(config.token())?))
}
