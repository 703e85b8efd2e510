//! GitHub REST API provider.
//!
//! Fetches the pull request, its commits and (when needed) per-commit line
//! stats, and manages the report comment. Requests are sequential with no
//! retry; the first failure aborts the run.

use crate::config::GithubSettings;
use crate::core::error::{Error, Result};
use crate::core::model::{CommitInfo, PullRequestInfo};
use crate::core::provider::{CommentSink, DataNeeds, PostedComment, Provider};
use crate::report::comment::is_report_comment;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use url::Url;

/// Public GitHub API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Token environment variable.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

/// API base override environment variable.
pub const API_URL_ENV: &str = "GITHUB_API_URL";

const PER_PAGE: usize = 100;

// =============================================================================
// Pull request reference
// =============================================================================

/// A pull request identified by its web URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequestRef {
    /// Web host, e.g. `github.com`.
    pub host: String,
    /// Repository owner.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PullRequestRef {
    /// Returns the API base URL for this host.
    #[must_use]
    pub fn default_api_url(&self) -> String {
        if self.host == "github.com" {
            DEFAULT_API_URL.to_string()
        } else {
            // GitHub Enterprise Server
            format!("https://{}/api/v3", self.host)
        }
    }
}

impl std::fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

impl std::str::FromStr for PullRequestRef {
    type Err = Error;

    fn from_str(url: &str) -> Result<Self> {
        let invalid = || Error::InvalidPrUrl {
            url: url.to_string(),
        };

        let parsed = Url::parse(url).map_err(|_| invalid())?;
        if !matches!(parsed.scheme(), "https" | "http") {
            return Err(invalid());
        }
        let host = match (parsed.host_str(), parsed.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(invalid()),
        };

        // owner/repo/pull/<n>, optionally followed by a tab such as /files
        let mut segments = parsed.path_segments().ok_or_else(invalid)?;
        let owner = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        let repo = segments.next().filter(|s| !s.is_empty()).ok_or_else(invalid)?;
        if segments.next() != Some("pull") {
            return Err(invalid());
        }
        let number = segments
            .next()
            .and_then(|n| n.parse::<u64>().ok())
            .filter(|n| *n > 0)
            .ok_or_else(invalid)?;

        Ok(Self {
            host,
            owner: owner.to_string(),
            repo: repo.to_string(),
            number,
        })
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PullPayload {
    title: String,
    body: Option<String>,
    head: HeadPayload,
}

#[derive(Debug, Deserialize)]
struct HeadPayload {
    #[serde(rename = "ref")]
    ref_name: String,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
    html_url: Option<String>,
    commit: CommitDetailPayload,
}

#[derive(Debug, Deserialize)]
struct CommitDetailPayload {
    message: String,
}

#[derive(Debug, Deserialize)]
struct CommitStatsPayload {
    stats: Option<StatsPayload>,
}

#[derive(Debug, Deserialize)]
struct StatsPayload {
    additions: u64,
    deletions: u64,
}

#[derive(Debug, Deserialize)]
struct CommentPayload {
    id: u64,
    body: Option<String>,
    html_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    message: String,
}

// =============================================================================
// Client
// =============================================================================

/// Client for one pull request.
#[derive(Debug, Clone)]
pub struct GithubClient {
    http: reqwest::Client,
    api_url: String,
    token: Option<String>,
    pr: PullRequestRef,
}

impl GithubClient {
    /// Creates a client for a pull request.
    pub fn new(
        pr: PullRequestRef,
        api_url: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static("2022-11-28"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("prgate/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::http("build HTTP client", e))?;

        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            pr,
        })
    }

    /// Creates a client from settings and the environment.
    ///
    /// The API URL comes from the settings, then `GITHUB_API_URL`, then the
    /// pull request's host.
    pub fn from_env(pr: PullRequestRef, settings: &GithubSettings) -> Result<Self> {
        let api_url = settings
            .api_url
            .clone()
            .or_else(|| non_empty_env(API_URL_ENV))
            .unwrap_or_else(|| pr.default_api_url());
        let token = non_empty_env(TOKEN_ENV);
        if token.is_none() {
            tracing::warn!("{TOKEN_ENV} is not set; API requests are unauthenticated");
        }

        Self::new(pr, api_url, token, settings.timeout())
    }

    /// Returns the pull request this client talks about.
    #[must_use]
    pub const fn pull_request(&self) -> &PullRequestRef {
        &self.pr
    }

    fn repo_path(&self, rest: &str) -> String {
        format!("repos/{}/{}/{rest}", self.pr.owner, self.pr.repo)
    }

    fn request(&self, method: Method, resource: &str) -> RequestBuilder {
        let request = self
            .http
            .request(method, format!("{}/{resource}", self.api_url));
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response> {
        tracing::debug!(%resource, "GitHub request");
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("request {resource}"), e))?;
        check_status(response, resource).await
    }

    async fn get<T: DeserializeOwned>(&self, resource: &str) -> Result<T> {
        let response = self.send(self.request(Method::GET, resource), resource).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::http(format!("decode {resource}"), e))
    }

    async fn get_all<T: DeserializeOwned>(&self, resource: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for page in 1_usize.. {
            let request = self
                .request(Method::GET, resource)
                .query(&[("per_page", PER_PAGE), ("page", page)]);
            let response = self.send(request, resource).await?;
            let batch: Vec<T> = response
                .json()
                .await
                .map_err(|e| Error::http(format!("decode {resource}"), e))?;
            let done = batch.len() < PER_PAGE;
            items.extend(batch);
            if done {
                break;
            }
        }
        Ok(items)
    }

    async fn fetch_pull_request(&self, needs: DataNeeds) -> Result<PullRequestInfo> {
        let pull: PullPayload = self
            .get(&self.repo_path(&format!("pulls/{}", self.pr.number)))
            .await?;
        let payloads: Vec<CommitPayload> = self
            .get_all(&self.repo_path(&format!("pulls/{}/commits", self.pr.number)))
            .await?;

        let mut commits = Vec::with_capacity(payloads.len());
        for (index, payload) in payloads.into_iter().enumerate() {
            let mut commit = CommitInfo::new(payload.sha, index + 1, payload.commit.message);
            if let Some(url) = payload.html_url {
                commit = commit.with_url(url);
            }
            if needs.commit_stats {
                let detail: CommitStatsPayload = self
                    .get(&self.repo_path(&format!("commits/{}", commit.sha)))
                    .await?;
                if let Some(stats) = detail.stats {
                    commit = commit.with_stats(stats.additions, stats.deletions);
                }
            }
            commits.push(commit);
        }

        tracing::debug!(pr = %self.pr, commits = commits.len(), "Fetched pull request");
        Ok(PullRequestInfo::new(pull.title, pull.body.unwrap_or_default())
            .with_branch(pull.head.ref_name)
            .with_commits(commits))
    }

    async fn remove_report_comments(&self) -> Result<usize> {
        let comments: Vec<CommentPayload> = self
            .get_all(&self.repo_path(&format!("issues/{}/comments", self.pr.number)))
            .await?;

        let mut deleted = 0;
        for comment in comments
            .iter()
            .filter(|c| c.body.as_deref().is_some_and(is_report_comment))
        {
            let resource = self.repo_path(&format!("issues/comments/{}", comment.id));
            self.send(self.request(Method::DELETE, &resource), &resource)
                .await?;
            tracing::debug!(id = comment.id, "Deleted previous report comment");
            deleted += 1;
        }
        Ok(deleted)
    }

    async fn create_comment(&self, body: &str) -> Result<PostedComment> {
        let resource = self.repo_path(&format!("issues/{}/comments", self.pr.number));
        let request = self
            .request(Method::POST, &resource)
            .json(&serde_json::json!({ "body": body }));
        let created: CommentPayload = self
            .send(request, &resource)
            .await?
            .json()
            .await
            .map_err(|e| Error::http(format!("decode {resource}"), e))?;

        Ok(PostedComment {
            id: created.id,
            url: created.html_url,
        })
    }
}

impl Provider for GithubClient {
    async fn fetch(&self, needs: DataNeeds) -> Result<PullRequestInfo> {
        self.fetch_pull_request(needs).await
    }
}

impl CommentSink for GithubClient {
    async fn delete_previous(&self) -> Result<usize> {
        self.remove_report_comments().await
    }

    async fn post(&self, body: &str) -> Result<PostedComment> {
        self.create_comment(body).await
    }
}

async fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match status {
        StatusCode::NOT_FOUND => {
            "Not found (check the pull request URL and that the token can read the repository)"
                .to_string()
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            format!("Authentication failed (check that {TOKEN_ENV} is set and has access)")
        },
        _ => response
            .json::<ErrorPayload>()
            .await
            .map(|payload| payload.message)
            .unwrap_or_else(|_| status.canonical_reason().unwrap_or("Request failed").to_string()),
    };

    Err(Error::api(status.as_u16(), resource, message))
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pr_ref() -> PullRequestRef {
        "https://github.com/acme/widgets/pull/7"
            .parse()
            .expect("valid url")
    }

    fn client(server: &MockServer) -> GithubClient {
        GithubClient::new(
            pr_ref(),
            server.uri(),
            Some("secret".to_string()),
            Duration::from_secs(5),
        )
        .expect("client")
    }

    async fn mock_pull(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .and(header("authorization", "Bearer secret"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Add widgets",
                "body": "- [x] tests",
                "head": { "ref": "feature-widgets" }
            })))
            .mount(server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7/commits"))
            .and(query_param("per_page", "100"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {
                    "sha": "aaaaaaaaaaaa",
                    "html_url": "https://github.com/acme/widgets/commit/aaaaaaaaaaaa",
                    "commit": { "message": "Add widget model\n\nWith details" }
                },
                {
                    "sha": "bbbbbbbbbbbb",
                    "commit": { "message": "Wire widgets" }
                }
            ])))
            .mount(server)
            .await;
    }

    // =========================================================================
    // URL parsing
    // =========================================================================

    #[rstest]
    #[case("https://github.com/acme/widgets/pull/7", "github.com", 7)]
    #[case("https://github.com/acme/widgets/pull/7/files", "github.com", 7)]
    #[case("http://git.example.com/acme/widgets/pull/12", "git.example.com", 12)]
    #[case("https://github.com/acme/widgets/pull/7#issuecomment-123", "github.com", 7)]
    #[case("https://github.com/acme/widgets/pull/7?w=1", "github.com", 7)]
    #[case("https://github.com/acme/widgets/pull/7/files?diff=split#top", "github.com", 7)]
    #[case("https://git.example.com:8443/acme/widgets/pull/3", "git.example.com:8443", 3)]
    fn test_parse_pr_url(#[case] url: &str, #[case] host: &str, #[case] number: u64) {
        let pr: PullRequestRef = url.parse().expect("valid url");
        assert_eq!(pr.host, host);
        assert_eq!(pr.owner, "acme");
        assert_eq!(pr.repo, "widgets");
        assert_eq!(pr.number, number);
    }

    #[rstest]
    #[case("github.com/acme/widgets/pull/7")]
    #[case("https://github.com/acme/widgets")]
    #[case("https://github.com/acme/widgets/issues/7")]
    #[case("https://github.com/acme/widgets/pull/abc")]
    #[case("https://github.com/acme/widgets/pull/0")]
    #[case("https://github.com/acme/widgets/pull/7x#top")]
    #[case("ftp://github.com/acme/widgets/pull/7")]
    fn test_parse_invalid_pr_url(#[case] url: &str) {
        let err = url.parse::<PullRequestRef>().expect_err("invalid");
        assert!(matches!(err, Error::InvalidPrUrl { .. }));
    }

    #[test]
    fn test_default_api_url() {
        assert_eq!(pr_ref().default_api_url(), DEFAULT_API_URL);
        let enterprise: PullRequestRef = "https://git.example.com/a/b/pull/1"
            .parse()
            .expect("valid url");
        assert_eq!(enterprise.default_api_url(), "https://git.example.com/api/v3");
        assert_eq!(enterprise.to_string(), "a/b#1");
    }

    // =========================================================================
    // Fetching
    // =========================================================================

    #[tokio::test]
    async fn test_fetch_without_stats() {
        let server = MockServer::start().await;
        mock_pull(&server).await;

        let info = client(&server)
            .fetch(DataNeeds::default())
            .await
            .expect("fetch");

        assert_eq!(info.title, "Add widgets");
        assert_eq!(info.body, "- [x] tests");
        assert_eq!(info.branch.as_deref(), Some("feature-widgets"));
        assert_eq!(info.commits.len(), 2);
        assert_eq!(info.commits[0].subject, "Add widget model");
        assert_eq!(
            info.commits[0].url.as_deref(),
            Some("https://github.com/acme/widgets/commit/aaaaaaaaaaaa")
        );
        assert_eq!(info.commits[1].order, 2);
        assert_eq!(info.commits[1].changes(), 0);
    }

    #[tokio::test]
    async fn test_fetch_follows_commit_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "title": "Add widgets",
                "body": null,
                "head": { "ref": "feature-widgets" }
            })))
            .mount(&server)
            .await;

        let first_page: Vec<serde_json::Value> = (0..100)
            .map(|n| json!({ "sha": format!("{n:040x}"), "commit": { "message": format!("Part {n}") } }))
            .collect();
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7/commits"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(first_page))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7/commits"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "sha": "f".repeat(40), "commit": { "message": "Last part" } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let info = client(&server)
            .fetch(DataNeeds::default())
            .await
            .expect("fetch");

        assert_eq!(info.body, "");
        assert_eq!(info.commits.len(), 101);
        assert_eq!(info.commits[100].subject, "Last part");
        assert_eq!(info.commits[100].order, 101);
    }

    #[tokio::test]
    async fn test_fetch_with_stats() {
        let server = MockServer::start().await;
        mock_pull(&server).await;
        for (sha, additions, deletions) in [("aaaaaaaaaaaa", 120, 3), ("bbbbbbbbbbbb", 1, 1)] {
            Mock::given(method("GET"))
                .and(path(format!("/repos/acme/widgets/commits/{sha}")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "sha": sha,
                    "stats": { "additions": additions, "deletions": deletions, "total": additions + deletions }
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let info = client(&server)
            .fetch(DataNeeds { commit_stats: true })
            .await
            .expect("fetch");

        assert_eq!(info.commits[0].changes(), 123);
        assert_eq!(info.commits[1].changes(), 2);
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/pulls/7"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "message": "Not Found" })))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(DataNeeds::default())
            .await
            .expect_err("missing");
        assert!(matches!(err, Error::Api { status: 404, ref resource, .. }
            if resource == "repos/acme/widgets/pulls/7"));
        assert_eq!(err.exit_code(), 69);
    }

    #[tokio::test]
    async fn test_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(DataNeeds::default())
            .await
            .expect_err("unauthorized");
        assert!(err.to_string().contains("Authentication failed"));
    }

    #[tokio::test]
    async fn test_server_error_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "message": "Validation Failed" })),
            )
            .mount(&server)
            .await;

        let err = client(&server)
            .fetch(DataNeeds::default())
            .await
            .expect_err("error");
        assert!(matches!(err, Error::Api { status: 422, ref message, .. }
            if message == "Validation Failed"));
    }

    #[tokio::test]
    async fn test_transport_error() {
        let client = GithubClient::new(
            pr_ref(),
            "http://127.0.0.1:9",
            None,
            Duration::from_secs(2),
        )
        .expect("client");
        let err = client
            .fetch(DataNeeds::default())
            .await
            .expect_err("unreachable");
        assert!(matches!(err, Error::Http { .. }));
    }

    // =========================================================================
    // Comments
    // =========================================================================

    #[tokio::test]
    async fn test_post_comment() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/widgets/issues/7/comments"))
            .and(body_partial_json(json!({ "body": "hello" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": 99,
                "body": "hello",
                "html_url": "https://github.com/acme/widgets/pull/7#issuecomment-99"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let posted = client(&server).post("hello").await.expect("post");
        assert_eq!(posted.id, 99);
        assert!(posted.url.is_some());
    }

    #[tokio::test]
    async fn test_delete_previous_only_report_comments() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/widgets/issues/7/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 11, "body": "<!-- prgate-report -->\n## PR Quality Gate" },
                { "id": 12, "body": "LGTM" },
                { "id": 13, "body": null }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/widgets/issues/comments/11"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let deleted = client(&server).delete_previous().await.expect("delete");
        assert_eq!(deleted, 1);
    }
}
