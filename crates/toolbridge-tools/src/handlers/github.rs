//! GitHub REST tools.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value, json};
use toolbridge_core::ToolDescriptor;
use toolbridge_settings::GithubSettings;

use crate::errors::ToolError;
use crate::schema::ToolSchemaBuilder;
use crate::traits::{ToolContext, ToolHandler, UpstreamClient, UpstreamRequest};
use crate::utils::args::{optional_str, optional_strings, optional_u64, required_str};
use crate::utils::expect_success;

const SERVICE: &str = "GitHub";

fn name_property(description: &str) -> Value {
    json!({"type": "string", "pattern": "^[A-Za-z0-9_.-]+$", "description": description})
}

struct GithubApi {
    client: Arc<dyn UpstreamClient>,
    settings: GithubSettings,
}

impl GithubApi {
    fn repo_url(&self, args: &Map<String, Value>, suffix: &str) -> Result<String, ToolError> {
        let owner = required_str(args, "owner")?;
        let repo = required_str(args, "repo")?;
        Ok(format!(
            "{}/repos/{owner}/{repo}{suffix}",
            self.settings.api_base.trim_end_matches('/')
        ))
    }

    fn request(&self, request: UpstreamRequest) -> UpstreamRequest {
        let request = request
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28");
        match self.settings.token.as_deref() {
            Some(token) => request.bearer(token),
            None => request,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// github.getRepo
// ─────────────────────────────────────────────────────────────────────────────

/// Fetch repository metadata.
pub struct GetRepoTool {
    api: GithubApi,
}

impl GetRepoTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: GithubSettings) -> Self {
        Self {
            api: GithubApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for GetRepoTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("github.getRepo", "Fetch GitHub repository metadata")
            .required_property("owner", name_property("Repository owner"))
            .required_property("repo", name_property("Repository name"))
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let url = self.api.repo_url(&args, "")?;
        let response = self.api.client.send(self.api.request(UpstreamRequest::get(url))).await?;
        let repo = expect_success(SERVICE, response)?;
        Ok(json!({
            "full_name": repo.get("full_name"),
            "description": repo.get("description"),
            "default_branch": repo.get("default_branch"),
            "private": repo.get("private"),
            "stars": repo.get("stargazers_count"),
            "open_issues": repo.get("open_issues_count"),
            "html_url": repo.get("html_url"),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// github.listIssues
// ─────────────────────────────────────────────────────────────────────────────

/// List issues of a repository.
pub struct ListIssuesTool {
    api: GithubApi,
}

impl ListIssuesTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: GithubSettings) -> Self {
        Self {
            api: GithubApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for ListIssuesTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("github.listIssues", "List issues in a GitHub repository")
            .required_property("owner", name_property("Repository owner"))
            .required_property("repo", name_property("Repository name"))
            .property(
                "state",
                json!({"type": "string", "enum": ["open", "closed", "all"], "description": "Issue state (default open)"}),
            )
            .property(
                "per_page",
                json!({"type": "integer", "minimum": 1, "maximum": 100, "description": "Page size (default 30)"}),
            )
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, _ctx: &ToolContext) -> Result<Value, ToolError> {
        let url = self.api.repo_url(&args, "/issues")?;
        let request = UpstreamRequest::get(url)
            .query("state", optional_str(&args, "state").unwrap_or("open"))
            .query("per_page", optional_u64(&args, "per_page").unwrap_or(30));
        let response = self.api.client.send(self.api.request(request)).await?;
        let issues = expect_success(SERVICE, response)?;
        let issues: Vec<Value> = issues
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .map(|i| {
                        json!({
                            "number": i.get("number"),
                            "title": i.get("title"),
                            "state": i.get("state"),
                            "user": i.pointer("/user/login"),
                            "is_pull_request": i.get("pull_request").is_some(),
                            "html_url": i.get("html_url"),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(json!({ "count": issues.len(), "issues": issues }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// github.createIssue
// ─────────────────────────────────────────────────────────────────────────────

/// Open a new issue. Mutating.
pub struct CreateIssueTool {
    api: GithubApi,
}

impl CreateIssueTool {
    /// Create the tool.
    pub fn new(client: Arc<dyn UpstreamClient>, settings: GithubSettings) -> Self {
        Self {
            api: GithubApi { client, settings },
        }
    }
}

#[async_trait]
impl ToolHandler for CreateIssueTool {
    fn descriptor(&self) -> ToolDescriptor {
        ToolSchemaBuilder::new("github.createIssue", "Open an issue in a GitHub repository")
            .required_property("owner", name_property("Repository owner"))
            .required_property("repo", name_property("Repository name"))
            .required_property("title", json!({"type": "string", "minLength": 1, "maxLength": 256}))
            .property("body", json!({"type": "string"}))
            .property("labels", json!({"type": "array", "items": {"type": "string"}}))
            .mutating()
            .build()
    }

    async fn invoke(&self, args: Map<String, Value>, ctx: &ToolContext) -> Result<Value, ToolError> {
        ctx.guard.ensure_writable()?;
        if self.api.settings.token.is_none() {
            return Err(ToolError::MissingCredential {
                service: SERVICE,
                variable: "GITHUB_TOKEN",
            });
        }
        let url = self.api.repo_url(&args, "/issues")?;
        let mut body = json!({ "title": required_str(&args, "title")? });
        if let Some(text) = optional_str(&args, "body") {
            body["body"] = Value::String(text.to_owned());
        }
        if let Some(labels) = optional_strings(&args, "labels") {
            body["labels"] = json!(labels);
        }

        let response = self
            .api
            .client
            .send(self.api.request(UpstreamRequest::post(url)).json(body))
            .await?;
        let issue = expect_success(SERVICE, response)?;
        Ok(json!({
            "number": issue.get("number"),
            "html_url": issue.get("html_url"),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::WriteGuard;
    use crate::providers::{RecordingClient, ReqwestUpstreamClient};
    use crate::traits::MockUpstreamClient;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn settings(base: &str, token: Option<&str>) -> GithubSettings {
        GithubSettings {
            token: token.map(Into::into),
            api_base: base.into(),
        }
    }

    fn args(v: Value) -> Map<String, Value> {
        v.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn get_repo_projects_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/rust-lang/rust"))
            .and(header("accept", "application/vnd.github+json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "full_name": "rust-lang/rust",
                "default_branch": "master",
                "stargazers_count": 100,
                "private": false
            })))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GetRepoTool::new(
            Arc::new(ReqwestUpstreamClient::with_defaults().unwrap()),
            settings(&server.uri(), None),
        );
        let out = tool
            .invoke(args(json!({"owner": "rust-lang", "repo": "rust"})), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out["full_name"], "rust-lang/rust");
        assert_eq!(out["stars"], 100);
    }

    #[tokio::test]
    async fn get_repo_sends_token_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header("authorization", "Bearer ghp_test"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let tool = GetRepoTool::new(
            Arc::new(ReqwestUpstreamClient::with_defaults().unwrap()),
            settings(&server.uri(), Some("ghp_test")),
        );
        let res = tool
            .invoke(args(json!({"owner": "a", "repo": "b"})), &ToolContext::default())
            .await;
        assert!(res.is_ok());
    }

    #[tokio::test]
    async fn get_repo_not_found_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;

        let tool = GetRepoTool::new(
            Arc::new(ReqwestUpstreamClient::with_defaults().unwrap()),
            settings(&server.uri(), None),
        );
        let err = tool
            .invoke(args(json!({"owner": "a", "repo": "missing"})), &ToolContext::default())
            .await
            .unwrap_err()
            .into_bridge("github.getRepo");
        assert_eq!(err.upstream_status(), Some(404));
        assert_eq!(err.to_string(), "GitHub responded with 404: Not Found");
    }

    #[tokio::test]
    async fn transport_error_is_normalized() {
        let mut mock = MockUpstreamClient::new();
        let _ = mock.expect_send().times(1).returning(|_| {
            Err(ToolError::Upstream {
                message: "connection reset".into(),
                status: None,
                body: None,
            })
        });
        let tool = GetRepoTool::new(Arc::new(mock), settings("http://unused", None));
        let err = tool
            .invoke(args(json!({"owner": "a", "repo": "b"})), &ToolContext::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "connection reset");
    }

    #[tokio::test]
    async fn list_issues_defaults_and_marks_prs() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/o/r/issues"))
            .and(query_param("state", "open"))
            .and(query_param("per_page", "30"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"number": 1, "title": "bug", "state": "open", "user": {"login": "ana"}},
                {"number": 2, "title": "fix", "state": "open", "pull_request": {}}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let tool = ListIssuesTool::new(
            Arc::new(ReqwestUpstreamClient::with_defaults().unwrap()),
            settings(&server.uri(), None),
        );
        let out = tool
            .invoke(args(json!({"owner": "o", "repo": "r"})), &ToolContext::default())
            .await
            .unwrap();
        assert_eq!(out["count"], 2);
        assert_eq!(out["issues"][0]["user"], "ana");
        assert_eq!(out["issues"][1]["is_pull_request"], true);
    }

    #[tokio::test]
    async fn create_issue_blocked_when_guard_closed() {
        let client = Arc::new(RecordingClient::new());
        let tool = CreateIssueTool::new(client.clone(), settings("http://unused", Some("t")));
        let err = tool
            .invoke(
                args(json!({"owner": "o", "repo": "r", "title": "x"})),
                &ToolContext::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::WriteDisabled));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn create_issue_posts_body_and_labels() {
        let client = Arc::new(RecordingClient::new());
        client.push_response(201, json!({"number": 42, "html_url": "https://github.com/o/r/issues/42"}));
        let tool = CreateIssueTool::new(client.clone(), settings("https://api.test", Some("t")));
        let ctx = ToolContext::new(Some("c1".into()), WriteGuard::open());
        let out = tool
            .invoke(
                args(json!({"owner": "o", "repo": "r", "title": "x", "body": "details", "labels": ["bug"]})),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(out["number"], 42);

        let sent = client.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "https://api.test/repos/o/r/issues");
        let body = sent[0].body.as_ref().unwrap();
        assert_eq!(body["title"], "x");
        assert_eq!(body["labels"], json!(["bug"]));
    }

    #[tokio::test]
    async fn create_issue_requires_token() {
        let client = Arc::new(RecordingClient::new());
        let tool = CreateIssueTool::new(client.clone(), settings("https://api.test", None));
        let ctx = ToolContext::new(None, WriteGuard::open());
        let err = tool
            .invoke(args(json!({"owner": "o", "repo": "r", "title": "x"})), &ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingCredential { variable: "GITHUB_TOKEN", .. }));
        assert_eq!(client.call_count(), 0);
    }
}
