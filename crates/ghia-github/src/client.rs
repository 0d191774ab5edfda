//! REST client for GitHub issues.

use crate::IssueTracker;
use crate::error::{GitHubError, Result};
use crate::model::{IssuePatch, RawIssue, RemoteIssue};
use ghia_core::Reposlug;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK, USER_AGENT};
use reqwest::{Client, Response};
use tracing::{debug, info};

/// Public GitHub API root.
pub const GITHUB_API: &str = "https://api.github.com";
const ACCEPT_V3: &str = "application/vnd.github.v3+json";
const PAGE_SIZE: u32 = 100;

/// Authenticated GitHub API client.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: Client,
    base_url: String,
}

impl GitHubClient {
    /// Create a client for the public API.
    ///
    /// # Errors
    /// Returns error if the token is not a valid header value or the HTTP
    /// client cannot be built.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(token, GITHUB_API)
    }

    /// Create a client for a GitHub Enterprise or test endpoint.
    ///
    /// # Errors
    /// See [`GitHubClient::new`].
    pub fn with_base_url(token: &str, base_url: impl Into<String>) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("token {token}"))
            .map_err(|e| GitHubError::InvalidToken(e.to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_V3));
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("ghia/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder().default_headers(headers).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn issues_url(&self, reposlug: &Reposlug) -> String {
        format!(
            "{}/repos/{}/{}/issues?state=open&per_page={PAGE_SIZE}",
            self.base_url,
            reposlug.owner(),
            reposlug.name()
        )
    }
}

fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(GitHubError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}

/// URL of the `rel="next"` page in a `Link` header.
#[must_use]
pub fn next_link(link_header: &str) -> Option<String> {
    link_header.split(',').find_map(|part| {
        let mut pieces = part.split(';');
        let url = pieces.next()?.trim();
        let is_next = pieces.any(|p| {
            let p = p.trim();
            p == r#"rel="next""# || p == "rel=next"
        });
        is_next
            .then(|| url.strip_prefix('<')?.strip_suffix('>').map(str::to_string))
            .flatten()
    })
}

impl IssueTracker for GitHubClient {
    async fn list_issues(&self, reposlug: &Reposlug) -> Result<Vec<RemoteIssue>> {
        let mut issues = Vec::new();
        let mut url = Some(self.issues_url(reposlug));

        while let Some(page_url) = url {
            let response = check_status(self.client.get(&page_url).send().await?)?;
            url = response
                .headers()
                .get(LINK)
                .and_then(|h| h.to_str().ok())
                .and_then(next_link);

            let page: Vec<RawIssue> = response.json().await?;
            debug!(reposlug = %reposlug, url = %page_url, count = page.len(), "Fetched issue page");
            issues.extend(page.into_iter().map(RemoteIssue::from));
        }

        info!(reposlug = %reposlug, count = issues.len(), "Listed issues");
        Ok(issues)
    }

    async fn update_issue(&self, issue: &RemoteIssue, patch: &IssuePatch) -> Result<()> {
        check_status(self.client.patch(&issue.url).json(patch).send().await?)?;
        info!(number = issue.number, url = %issue.url, "Updated issue");
        Ok(())
    }
}
