//! GitHub REST Client
//!
//! Implements [`WorkflowSource`] and [`ProtectionSink`] on top of the
//! GitHub REST API (`X-GitHub-Api-Version: 2022-11-28`). Any non-2xx
//! response is turned into [`GrcError::Api`]; nothing is retried.

use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::protection::{CurrentStatusChecks, RequiredStatusChecks};
use super::{is_workflow_file, ProtectionSink, RawWorkflow, WorkflowSource, WORKFLOWS_DIR};
use crate::config::Repository;
use crate::error::{GrcError, Result};

/// Public GitHub API endpoint.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Entry of a `GET /repos/{owner}/{repo}/contents/{path}` listing.
#[derive(Deserialize, Debug)]
struct ContentEntry {
    name: String,

    #[serde(rename = "type")]
    kind: String,

    #[serde(default)]
    download_url: Option<String>,
}

#[derive(Deserialize, Debug)]
struct RepositoryInfo {
    default_branch: String,
}

/// Authenticated client for one repository.
///
/// # Example
///
/// ```rust,no_run
/// use grc::config::Repository;
/// use grc::github::{GitHubClient, WorkflowSource};
///
/// # async fn run() -> grc::Result<()> {
/// let repo: Repository = "simonrw/rynamodb".parse()?;
/// let client = GitHubClient::new("ghp_token", "https://api.github.com", &repo)?;
/// let workflows = client.fetch_workflows().await?;
/// println!("{} workflow files", workflows.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: Url,
    repository: Repository,
}

impl GitHubClient {
    /// Creates a client sending `token` as a bearer token on every request.
    pub fn new(token: &str, api_url: &str, repository: &Repository) -> Result<Self> {
        let api_url = Url::parse(api_url)
            .map_err(|e| GrcError::Config(format!("invalid API URL '{}': {}", api_url, e)))?;
        if api_url.cannot_be_a_base() {
            return Err(GrcError::Config(format!(
                "API URL '{}' cannot hold a path",
                api_url
            )));
        }

        let mut headers = HeaderMap::new();

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| GrcError::Config("access token contains invalid characters".into()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            api_url,
            repository: repository.clone(),
        })
    }

    /// Looks up the repository's default branch.
    pub async fn default_branch(&self) -> Result<String> {
        let info: RepositoryInfo = self.get_json(self.url(&[])).await?;
        debug!("Default branch of {}: {}", self.repository, info.default_branch);
        Ok(info.default_branch)
    }

    /// Builds an API URL under `/repos/{owner}/{repo}`.
    ///
    /// Each segment is percent-encoded on its own, so a `/` or `#` inside
    /// a segment never changes the path.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_url.clone();
        // Always Ok: `new` rejects cannot-be-a-base URLs
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["repos", self.repository.owner.as_str(), self.repository.name.as_str()])
                .extend(segments);
        }
        url
    }

    fn protection_url(&self, branch: &str) -> Url {
        self.url(&["branches", branch, "protection", "required_status_checks"])
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET {}", url);
        let response = check_status(self.http.get(url).send().await?).await?;
        Ok(response.json().await?)
    }

    async fn get_text(&self, url: Url) -> Result<String> {
        debug!("GET {}", url);
        let response = check_status(self.http.get(url).send().await?).await?;
        Ok(response.text().await?)
    }
}

#[async_trait]
impl WorkflowSource for GitHubClient {
    async fn fetch_workflows(&self) -> Result<Vec<RawWorkflow>> {
        let mut segments = vec!["contents"];
        segments.extend(WORKFLOWS_DIR.split('/'));
        let listing: Vec<ContentEntry> = self.get_json(self.url(&segments)).await?;

        let mut workflows = Vec::new();
        for entry in listing {
            if entry.kind != "file" || !is_workflow_file(&entry.name) {
                debug!("Skipping {} ({})", entry.name, entry.kind);
                continue;
            }

            let invalid = |reason: String| GrcError::InvalidWorkflow {
                workflow: entry.name.clone(),
                reason,
            };
            let download_url = entry
                .download_url
                .as_deref()
                .ok_or_else(|| invalid("listing has no download_url".to_string()))
                .and_then(|raw| {
                    Url::parse(raw).map_err(|e| invalid(format!("bad download_url: {}", e)))
                })?;

            let contents = self.get_text(download_url).await?;
            workflows.push(RawWorkflow::new(entry.name, contents));
        }

        info!(
            "Fetched {} workflow files from {}",
            workflows.len(),
            self.repository
        );
        Ok(workflows)
    }
}

#[async_trait]
impl ProtectionSink for GitHubClient {
    async fn current_checks(&self, branch: &str) -> Result<Vec<String>> {
        let url = self.protection_url(branch);
        debug!("GET {}", url);

        let response = self.http.get(url).send().await?;
        // Unprotected branch, or protection without status checks
        if response.status() == StatusCode::NOT_FOUND {
            debug!("No required status checks on '{}'", branch);
            return Ok(Vec::new());
        }

        let current: CurrentStatusChecks = check_status(response).await?.json().await?;
        Ok(current.into_contexts())
    }

    async fn replace_checks(&self, branch: &str, checks: &[String], strict: bool) -> Result<()> {
        let url = self.protection_url(branch);
        let payload = RequiredStatusChecks::new(checks, strict);
        debug!("PATCH {} with {} checks", url, payload.checks.len());

        check_status(self.http.patch(url).json(&payload).send().await?).await?;

        info!(
            "Set {} required status checks on {}@{}",
            checks.len(),
            self.repository,
            branch
        );
        Ok(())
    }
}

/// Passes 2xx responses through and turns anything else into an error.
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    let body = response.text().await.unwrap_or_default();
    Err(api_error(status, url, &body))
}

/// Builds [`GrcError::Api`], using the `message` of a GitHub error body
/// when there is one.
fn api_error(status: StatusCode, url: String, body: &str) -> GrcError {
    #[derive(Deserialize)]
    struct ErrorBody {
        message: String,
    }

    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.message)
        .unwrap_or_else(|_| body.trim().to_string());

    GrcError::Api {
        status: status.as_u16(),
        url,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PROTECTION_PATH: &str =
        "/repos/simonrw/rynamodb/branches/main/protection/required_status_checks";

    fn client(api_url: &str) -> GitHubClient {
        let repo: Repository = "simonrw/rynamodb".parse().unwrap();
        GitHubClient::new("token", api_url, &repo).unwrap()
    }

    #[test]
    fn test_url_building() {
        let client = client("https://api.github.com");
        assert_eq!(
            client.url(&[]).as_str(),
            "https://api.github.com/repos/simonrw/rynamodb"
        );
        assert_eq!(
            client.url(&["contents", ".github", "workflows"]).as_str(),
            "https://api.github.com/repos/simonrw/rynamodb/contents/.github/workflows"
        );
    }

    #[test]
    fn test_api_url_trailing_slash() {
        let client = client("https://github.example.com/api/v3/");
        assert_eq!(
            client.protection_url("main").as_str(),
            "https://github.example.com/api/v3/repos/simonrw/rynamodb/branches/main/protection/required_status_checks"
        );
    }

    #[test]
    fn test_branch_name_is_percent_encoded() {
        let client = client("https://api.github.com");
        assert_eq!(
            client.protection_url("release/1.0#x").as_str(),
            "https://api.github.com/repos/simonrw/rynamodb/branches/release%2F1.0%23x/protection/required_status_checks"
        );
    }

    #[test]
    fn test_invalid_api_url_rejected() {
        let repo: Repository = "simonrw/rynamodb".parse().unwrap();
        for api_url in ["not a url", "mailto:ops@example.com"] {
            let result = GitHubClient::new("token", api_url, &repo);
            assert!(matches!(result, Err(GrcError::Config(_))), "{}", api_url);
        }
    }

    #[test]
    fn test_invalid_token_rejected() {
        let repo: Repository = "simonrw/rynamodb".parse().unwrap();
        let result = GitHubClient::new("bad\ntoken", DEFAULT_API_URL, &repo);
        assert!(matches!(result, Err(GrcError::Config(_))));
    }

    #[test]
    fn test_api_error_uses_github_message() {
        let err = api_error(
            StatusCode::NOT_FOUND,
            "https://api.github.com/repos/a/b".to_string(),
            r#"{"message": "Branch not protected", "documentation_url": "https://docs.github.com"}"#,
        );

        match err {
            GrcError::Api { status, message, .. } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Branch not protected");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[test]
    fn test_api_error_plain_body() {
        let err = api_error(StatusCode::BAD_GATEWAY, "u".to_string(), "  upstream down \n");
        assert!(matches!(
            err,
            GrcError::Api { status: 502, ref message, .. } if message == "upstream down"
        ));
    }

    #[tokio::test]
    async fn test_default_branch_sends_api_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/simonrw/rynamodb"))
            .and(header("x-github-api-version", API_VERSION))
            .and(header("authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "simonrw/rynamodb",
                "default_branch": "trunk"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let branch = client(&server.uri()).default_branch().await.unwrap();
        assert_eq!(branch, "trunk");
    }

    #[tokio::test]
    async fn test_unprotected_branch_has_no_checks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROTECTION_PATH))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "Branch not protected"})),
            )
            .mount(&server)
            .await;

        let checks = client(&server.uri()).current_checks("main").await.unwrap();
        assert!(checks.is_empty());
    }

    #[tokio::test]
    async fn test_current_checks_reads_check_contexts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROTECTION_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "strict": true,
                "contexts": ["lint", "test"],
                "checks": [
                    {"context": "lint", "app_id": null},
                    {"context": "test", "app_id": null}
                ]
            })))
            .mount(&server)
            .await;

        let checks = client(&server.uri()).current_checks("main").await.unwrap();
        assert_eq!(checks, vec!["lint", "test"]);
    }

    #[tokio::test]
    async fn test_server_error_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(PROTECTION_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "Server Error"})))
            .mount(&server)
            .await;

        let result = client(&server.uri()).current_checks("main").await;
        match result {
            Err(GrcError::Api { status, message, .. }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "Server Error");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_downloads_only_workflow_files() {
        let server = MockServer::start().await;
        let uri = server.uri();
        Mock::given(method("GET"))
            .and(path("/repos/simonrw/rynamodb/contents/.github/workflows"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"name": "ci.yml", "type": "file", "download_url": format!("{}/raw/ci.yml", uri)},
                {"name": "shared", "type": "dir", "download_url": null},
                {"name": "README.md", "type": "file", "download_url": format!("{}/raw/README.md", uri)}
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/ci.yml"))
            .respond_with(ResponseTemplate::new(200).set_body_string("jobs:\n  lint:\n    name: lint\n"))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/raw/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# workflows"))
            .expect(0)
            .mount(&server)
            .await;

        let workflows = client(&uri).fetch_workflows().await.unwrap();
        assert_eq!(
            workflows,
            vec![RawWorkflow::new("ci.yml", "jobs:\n  lint:\n    name: lint\n")]
        );
    }

    #[tokio::test]
    async fn test_replace_checks_sends_ordered_payload() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(PROTECTION_PATH))
            .and(body_json(json!({
                "strict": false,
                "checks": [
                    {"context": "lint"},
                    {"context": "test (ubuntu-latest)"},
                    {"context": "test (macos-latest)"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"strict": false})))
            .expect(1)
            .mount(&server)
            .await;

        let checks = vec![
            "lint".to_string(),
            "test (ubuntu-latest)".to_string(),
            "test (macos-latest)".to_string(),
        ];
        client(&server.uri())
            .replace_checks("main", &checks, false)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejected_update_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(PROTECTION_PATH))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"message": "Resource not accessible"})),
            )
            .mount(&server)
            .await;

        let result = client(&server.uri())
            .replace_checks("main", &["lint".to_string()], true)
            .await;
        assert!(matches!(result, Err(GrcError::Api { status: 403, .. })));
    }

    #[test]
    fn test_content_listing_deserializes() {
        let listing: Vec<ContentEntry> = serde_json::from_str(
            r#"[
                {"name": "ci.yml", "type": "file", "download_url": "https://raw.example/ci.yml"},
                {"name": "shared", "type": "dir", "download_url": null}
            ]"#,
        )
        .unwrap();

        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].kind, "file");
        assert!(listing[1].download_url.is_none());
    }
}
