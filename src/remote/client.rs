//! reqwest implementation of [`GitLabApi`].

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::{ConfigProvider, GitLabConfig};
use crate::error::{IssueLensError, Result};
use crate::types::{IssueIid, ProjectId};

use super::auth;
use super::{
    AssetPayload, GitLabApi, IssueDetail, IssueQuery, IssueSummary, Note, PageMeta, Paged,
    Project, User,
};

/// Page size for endpoints the client drains completely (notes, members).
const DRAIN_PAGE_SIZE: u32 = 100;

/// Upper bound on pages fetched while draining a collection.
const MAX_DRAIN_PAGES: u32 = 50;

/// GitLab v4 REST client.
///
/// Holds no connection settings of its own: base URL, token and timeout are
/// read from the [`ConfigProvider`] at the start of every request.
pub struct GitLabClient<P> {
    http: Client,
    config: P,
}

impl<P: ConfigProvider> GitLabClient<P> {
    /// Create a client with a 30s connect timeout. The total timeout is
    /// taken per request from the configuration.
    pub fn new(config: P) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .user_agent(concat!("issuelens/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { http, config })
    }

    pub fn config_provider(&self) -> &P {
        &self.config
    }

    async fn send(&self, config: &GitLabConfig, url: Url, query: &[(&str, String)]) -> Result<Response> {
        tracing::debug!(url = %url, "GET");

        let request = self.http.get(url).query(query).timeout(config.timeout());
        let response = auth::authorize(request, config)?.send().await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(IssueLensError::Remote { status });
        }

        Ok(response)
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Response> {
        let config = self.config.current()?;
        let url = config.api_url(path)?;
        self.send(&config, url, query).await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.get(path, query).await?;
        decode(response).await
    }

    async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Paged<T>> {
        let response = self.get(path, query).await?;
        let meta = PageMeta::from_headers(response.headers());
        let items: Vec<T> = decode(response).await?;
        Ok(Paged { items, meta })
    }

    /// Fetch every page of a collection endpoint.
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        extra: &[(&str, String)],
    ) -> Result<Vec<T>> {
        let mut all = Vec::new();
        let mut page = 1;

        loop {
            let mut query = extra.to_vec();
            query.push(("page", page.to_string()));
            query.push(("per_page", DRAIN_PAGE_SIZE.to_string()));

            let Paged { items, meta } = self.get_page::<T>(path, &query).await?;
            let returned = items.len();
            all.extend(items);

            let more = match meta.total_pages {
                Some(total_pages) => page < total_pages,
                None => returned as u32 >= DRAIN_PAGE_SIZE,
            };
            if !more || page >= MAX_DRAIN_PAGES {
                break;
            }
            page += 1;
        }

        Ok(all)
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.bytes().await?;
    Ok(serde_json::from_slice(&body)?)
}

impl<P: ConfigProvider> GitLabApi for GitLabClient<P> {
    async fn list_issues(&self, query: &IssueQuery) -> Result<Paged<IssueSummary>> {
        self.get_page(&query.path(), &query.query_pairs()).await
    }

    async fn issue_detail(&self, project_id: ProjectId, iid: IssueIid) -> Result<IssueDetail> {
        self.get_json(&format!("/projects/{project_id}/issues/{iid}"), &[])
            .await
    }

    async fn issue_notes(&self, project_id: ProjectId, iid: IssueIid) -> Result<Vec<Note>> {
        self.get_all(
            &format!("/projects/{project_id}/issues/{iid}/notes"),
            &[
                ("sort", "asc".to_string()),
                ("order_by", "created_at".to_string()),
            ],
        )
        .await
    }

    async fn search_projects(&self, term: &str) -> Result<Vec<Project>> {
        let mut query = vec![("membership", "true".to_string())];
        let term = term.trim();
        if !term.is_empty() {
            query.push(("search", term.to_string()));
        }
        self.get_json("/projects", &query).await
    }

    async fn project_users(&self, project_id: ProjectId) -> Result<Vec<User>> {
        self.get_all(&format!("/projects/{project_id}/users"), &[])
            .await
    }

    async fn current_user(&self) -> Result<User> {
        self.get_json("/user", &[]).await
    }

    async fn fetch_upload(&self, project_id: ProjectId, upload_path: &str) -> Result<AssetPayload> {
        let config = self.config.current()?;
        let url = upload_url(&config, project_id, upload_path)?;
        let response = self.send(&config, url, &[]).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let bytes = response.bytes().await?.to_vec();

        Ok(AssetPayload {
            bytes,
            content_type,
        })
    }
}

/// Canonical download URL for a markdown upload reference:
/// `/uploads/<secret>/<file>` in project P maps to
/// `{base}/api/v4/projects/P/uploads/<secret>/<file>`.
///
/// References that could leave the uploads route once the URL is
/// normalized (dot segments, backslashes, query or fragment) are rejected.
pub fn upload_url(config: &GitLabConfig, project_id: ProjectId, upload_path: &str) -> Result<Url> {
    let Some(rest) = upload_path.strip_prefix("/uploads/") else {
        return Err(IssueLensError::InvalidArgument(format!(
            "not an upload reference: {upload_path}"
        )));
    };
    if rest.contains(['\\', '?', '#']) || rest.split('/').any(is_dot_segment) {
        return Err(IssueLensError::InvalidArgument(format!(
            "upload reference escapes the uploads route: {upload_path}"
        )));
    }
    config.api_url(&format!("/projects/{project_id}{upload_path}"))
}

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().as_str(),
        "." | ".." | "%2e" | "%2e%2e" | ".%2e" | "%2e."
    )
}
