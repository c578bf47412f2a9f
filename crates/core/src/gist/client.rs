//! GitHub Gist REST API client.

use std::collections::BTreeMap;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::errors::GistError;
use crate::models::SourceFile;

/// Response body of `GET /gists/{gist_id}` (the fields we use).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gist {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: Option<String>,
    /// Keyed by filename. Sorted, which fixes the source order of a run.
    #[serde(default)]
    pub files: BTreeMap<String, GistFile>,
}

/// One file entry of a gist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GistFile {
    #[serde(default)]
    pub truncated: bool,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub raw_url: Option<String>,
}

/// A gist file whose content is either inline or must be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingFile {
    Inline(SourceFile),
    Raw { name: String, raw_url: String },
}

/// Split a gist into inline files and files that need a raw download,
/// keeping filename order.
pub fn pending_files(gist: Gist) -> Result<Vec<PendingFile>, GistError> {
    let mut pending = Vec::with_capacity(gist.files.len());
    for (name, file) in gist.files {
        match (file.truncated, file.content, file.raw_url) {
            (false, Some(content), _) => {
                pending.push(PendingFile::Inline(SourceFile::new(name, content)));
            }
            (_, _, Some(raw_url)) => pending.push(PendingFile::Raw { name, raw_url }),
            (_, _, None) => {
                return Err(GistError::ParseError(format!(
                    "file '{}' has neither inline content nor a raw_url",
                    name
                )));
            }
        }
    }
    Ok(pending)
}

/// Asynchronous Gist API client.
#[derive(Clone)]
pub struct GistClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
}

impl GistClient {
    pub fn new(api_url: impl Into<String>, token: Option<String>) -> Result<Self, GistError> {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("gistsync/0.1"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;
        info!(api_url = %api_url, authenticated = token.is_some(), "created GistClient");
        Ok(Self {
            http,
            api_url,
            token,
        })
    }

    /// Fetch gist metadata and inline content.
    #[instrument(skip(self))]
    pub async fn get_gist(&self, gist_id: &str) -> Result<Gist, GistError> {
        let url = format!("{}/gists/{}", self.api_url, gist_id);
        let resp = self.authorized(self.http.get(&url)).send().await?;
        Self::check_response(&resp, gist_id)?;
        let gist: Gist = resp
            .json()
            .await
            .map_err(|e| GistError::ParseError(e.to_string()))?;
        debug!(
            files = gist.files.len(),
            html_url = gist.html_url.as_deref().unwrap_or("-"),
            description = gist.description.as_deref().unwrap_or(""),
            "fetched gist"
        );
        Ok(gist)
    }

    /// Fetch every file of a gist, sorted by filename. Truncated files are
    /// downloaded from their raw URL so the content is complete.
    #[instrument(skip(self))]
    pub async fn fetch_files(&self, gist_id: &str) -> Result<Vec<SourceFile>, GistError> {
        info!(gist_id, "fetching gist");
        let gist = self.get_gist(gist_id).await?;

        let mut files = Vec::new();
        for pending in pending_files(gist)? {
            match pending {
                PendingFile::Inline(file) => files.push(file),
                PendingFile::Raw { name, raw_url } => {
                    debug!(file = %name, "content truncated, downloading raw file");
                    let content = self.fetch_raw(gist_id, &raw_url).await?;
                    files.push(SourceFile::new(name, content));
                }
            }
        }

        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        info!(count = files.len(), ?names, "found files in gist");
        Ok(files)
    }

    async fn fetch_raw(&self, gist_id: &str, raw_url: &str) -> Result<Vec<u8>, GistError> {
        let resp = self.authorized(self.http.get(raw_url)).send().await?;
        Self::check_response(&resp, gist_id)?;
        Ok(resp.bytes().await?.to_vec())
    }

    fn authorized(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn check_response(resp: &reqwest::Response, gist_id: &str) -> Result<(), GistError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let header = |name: &str| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let rate_limited = status.as_u16() == 429
            || (status.as_u16() == 403 && header("x-ratelimit-remaining").as_deref() == Some("0"));
        if rate_limited {
            return Err(GistError::RateLimited {
                reset_at: header("x-ratelimit-reset").unwrap_or_else(|| "unknown".into()),
            });
        }
        if status.as_u16() == 404 {
            return Err(GistError::NotFound(gist_id.to_string()));
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(GistError::AuthenticationFailed(format!("HTTP {}", status)));
        }
        Err(GistError::ApiError {
            status: status.as_u16(),
            body: format!("HTTP {}", status),
        })
    }
}
