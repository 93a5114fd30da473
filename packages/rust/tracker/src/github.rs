//! GitHub REST implementation of [`IssueTracker`].

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use curriculum_shared::{
    CreatedIssue, CurriculumError, IssueDraft, RepoTarget, Result, TrackerSettings,
};

use crate::IssueTracker;

/// User-Agent string for tracker requests (GitHub rejects requests without one).
const USER_AGENT: &str = concat!("curriculum/", env!("CARGO_PKG_VERSION"));

/// Media type requested from the GitHub REST API.
const GITHUB_ACCEPT: &str = "application/vnd.github+json";

/// REST API version pinned on every request.
const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Serialize)]
struct CreateIssueBody<'a> {
    title: &'a str,
    body: &'a str,
    #[serde(skip_serializing_if = "no_labels")]
    labels: &'a [String],
}

fn no_labels(labels: &&[String]) -> bool {
    labels.is_empty()
}

#[derive(Debug, Deserialize)]
struct IssueResponse {
    id: u64,
    number: u64,
    html_url: String,
    title: String,
}

#[derive(Debug, Serialize)]
struct SubIssueBody {
    sub_issue_id: u64,
    replace_parent: bool,
}

/// Authenticated GitHub client scoped to a single publish step.
#[derive(Debug)]
pub struct GitHubClient {
    client: Client,
    api_base: Url,
}

impl GitHubClient {
    /// Build a client from resolved settings.
    ///
    /// An empty token is rejected here, before any request is made.
    pub fn new(settings: &TrackerSettings) -> Result<Self> {
        if settings.token.trim().is_empty() {
            return Err(CurriculumError::config(
                "a tracker token is required to create issues",
            ));
        }

        let api_base = Url::parse(&format!("{}/", settings.api_base.trim_end_matches('/')))
            .map_err(|e| {
                CurriculumError::config(format!(
                    "invalid tracker API base '{}': {e}",
                    settings.api_base
                ))
            })?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(GITHUB_ACCEPT));
        headers.insert(
            "x-github-api-version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", settings.token))
            .map_err(|_| CurriculumError::config("tracker token contains invalid characters"))?;
        auth.set_sensitive(true);
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                CurriculumError::transport("tracker client", format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self { client, api_base })
    }

    /// Append `segments` to the API base, percent-encoding each one.
    fn endpoint(&self, target: &RepoTarget, segments: &[&str]) -> Result<Url> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|()| CurriculumError::config("tracker API base must be a hierarchical URL"))?
            .pop_if_empty()
            .extend(["repos", target.owner.as_str(), target.repo.as_str()])
            .extend(segments);
        Ok(url)
    }
}

/// Turn a non-2xx response into a transport error carrying the status and a body excerpt.
async fn check_status(response: Response, operation: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(CurriculumError::transport(
        operation,
        format!("HTTP {status}: {}", text.chars().take(200).collect::<String>()),
    ))
}

impl IssueTracker for GitHubClient {
    async fn create_issue(&self, target: &RepoTarget, draft: &IssueDraft) -> Result<CreatedIssue> {
        const OPERATION: &str = "create_issue";
        let url = self.endpoint(target, &["issues"])?;
        debug!(%url, title = %draft.title, "creating issue");

        let body = CreateIssueBody {
            title: &draft.title,
            body: &draft.body,
            labels: &draft.labels,
        };

        let response = self
            .client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| CurriculumError::transport(OPERATION, e.to_string()))?;
        let response = check_status(response, OPERATION).await?;

        let issue: IssueResponse = response.json().await.map_err(|e| {
            CurriculumError::transport(OPERATION, format!("invalid issue response: {e}"))
        })?;

        Ok(CreatedIssue {
            id: issue.id,
            number: issue.number,
            url: issue.html_url,
            title: issue.title,
        })
    }

    async fn link_sub_issue(
        &self,
        target: &RepoTarget,
        parent_number: u64,
        child_id: u64,
        replace_parent: bool,
    ) -> Result<()> {
        const OPERATION: &str = "link_sub_issue";
        let parent = parent_number.to_string();
        let url = self.endpoint(target, &["issues", &parent, "sub_issues"])?;
        debug!(%url, child_id, "linking sub-issue");

        let response = self
            .client
            .post(url)
            .json(&SubIssueBody {
                sub_issue_id: child_id,
                replace_parent,
            })
            .send()
            .await
            .map_err(|e| CurriculumError::transport(OPERATION, e.to_string()))?;
        check_status(response, OPERATION).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::publish;

    fn settings(api_base: String) -> TrackerSettings {
        TrackerSettings {
            token: "ghp_test".into(),
            api_base,
            timeout: Duration::from_secs(5),
        }
    }

    fn target() -> RepoTarget {
        RepoTarget {
            owner: "acme".into(),
            repo: "learn".into(),
        }
    }

    fn issue_json(id: u64, number: u64, title: &str) -> serde_json::Value {
        json!({
            "id": id,
            "number": number,
            "html_url": format!("https://github.com/acme/learn/issues/{number}"),
            "title": title,
            "state": "open"
        })
    }

    #[test]
    fn empty_token_is_rejected_at_construction() {
        let mut s = settings("https://api.github.com".into());
        s.token = String::new();
        let err = GitHubClient::new(&s).unwrap_err();
        assert!(matches!(err, CurriculumError::Config { .. }));
    }

    #[test]
    fn endpoint_keeps_repository_parts_in_single_segments() {
        let client = GitHubClient::new(&settings("https://ghe.example.com/api/v3".into())).unwrap();
        let target = RepoTarget {
            owner: "ac/me".into(),
            repo: "learn?x#y".into(),
        };
        let url = client.endpoint(&target, &["issues", "12", "sub_issues"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://ghe.example.com/api/v3/repos/ac%2Fme/learn%3Fx%23y/issues/12/sub_issues"
        );
    }

    #[tokio::test]
    async fn create_issue_sends_headers_and_labels() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .and(header("authorization", "Bearer ghp_test"))
            .and(header("accept", GITHUB_ACCEPT))
            .and(header("x-github-api-version", GITHUB_API_VERSION))
            .and(body_json(json!({
                "title": "graph theory",
                "body": "Graphs",
                "labels": ["learning"]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7001, 12, "graph theory")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(&settings(server.uri())).unwrap();
        let draft = IssueDraft {
            title: "graph theory".into(),
            body: "Graphs".into(),
            labels: vec!["learning".into()],
        };
        let issue = client.create_issue(&target(), &draft).await.unwrap();

        assert_eq!(issue.id, 7001);
        assert_eq!(issue.number, 12);
        assert_eq!(issue.url, "https://github.com/acme/learn/issues/12");
    }

    #[tokio::test]
    async fn empty_labels_are_omitted() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .and(body_json(json!({"title": "t", "body": "b"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(1, 1, "t")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(&settings(server.uri())).unwrap();
        let draft = IssueDraft {
            title: "t".into(),
            body: "b".into(),
            labels: vec![],
        };
        client.create_issue(&target(), &draft).await.unwrap();
    }

    #[tokio::test]
    async fn create_issue_http_error_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .respond_with(ResponseTemplate::new(403).set_body_string("Resource not accessible"))
            .mount(&server)
            .await;

        let client = GitHubClient::new(&settings(server.uri())).unwrap();
        let draft = IssueDraft {
            title: "t".into(),
            body: "b".into(),
            labels: vec![],
        };
        let err = client.create_issue(&target(), &draft).await.unwrap_err();
        match err {
            CurriculumError::Transport { operation, message } => {
                assert_eq!(operation, "create_issue");
                assert!(message.contains("403"));
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn link_sub_issue_posts_child_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues/12/sub_issues"))
            .and(body_json(json!({"sub_issue_id": 7002, "replace_parent": true})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7001, 12, "graph theory")))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(&settings(server.uri())).unwrap();
        client.link_sub_issue(&target(), 12, 7002, true).await.unwrap();
    }

    #[tokio::test]
    async fn publish_against_mock_github() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .and(body_json(json!({"title": "graph theory", "body": "Graphs", "labels": ["learning"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7001, 12, "graph theory")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .and(body_json(json!({"title": "BFS", "body": "Parent: #12\n\nQueue based.", "labels": ["learning", "subtopic"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7002, 13, "BFS")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues"))
            .and(body_json(json!({"title": "DFS", "body": "Parent: #12\n\nStack based.", "labels": ["learning", "subtopic"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7003, 14, "DFS")))
            .expect(1)
            .mount(&server)
            .await;

        // Linking BFS succeeds, DFS is rejected.
        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues/12/sub_issues"))
            .and(body_json(json!({"sub_issue_id": 7002, "replace_parent": true})))
            .respond_with(ResponseTemplate::new(201).set_body_json(issue_json(7001, 12, "graph theory")))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/repos/acme/learn/issues/12/sub_issues"))
            .and(body_json(json!({"sub_issue_id": 7003, "replace_parent": true})))
            .respond_with(ResponseTemplate::new(422).set_body_string("sub-issues disabled"))
            .expect(1)
            .mount(&server)
            .await;

        let client = GitHubClient::new(&settings(server.uri())).unwrap();
        let topic = IssueDraft {
            title: "graph theory".into(),
            body: "Graphs".into(),
            labels: vec!["learning".into()],
        };
        let subtopic_labels = vec!["learning".to_string(), "subtopic".to_string()];
        let subs = vec![
            IssueDraft {
                title: "BFS".into(),
                body: "Queue based.".into(),
                labels: subtopic_labels.clone(),
            },
            IssueDraft {
                title: "DFS".into(),
                body: "Stack based.".into(),
                labels: subtopic_labels,
            },
        ];

        let result = publish(&client, &target(), &topic, &subs).await.unwrap();

        assert_eq!(result.topic_issue.number, 12);
        let numbers: Vec<u64> = result.sub_issues.iter().map(|i| i.number).collect();
        assert_eq!(numbers, vec![13, 14]);
        assert!(!result.links[0].is_failed());
        assert!(result.links[1].is_failed());
    }
}
