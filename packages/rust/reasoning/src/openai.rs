//! OpenAI-compatible chat-completions backend for [`ReasoningService`].

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};
use url::Url;

use curriculum_shared::{CurriculumError, ReasoningSettings, Result};

use crate::{AgentResponse, ChatMessage, ReasoningRequest, ReasoningService};

/// User-Agent string for reasoning requests.
const USER_AGENT: &str = concat!("curriculum/", env!("CARGO_PKG_VERSION"));

/// Operation name reported in transport errors.
const OPERATION: &str = "reasoning request";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    r#type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    /// Pre-parsed structured output, returned by some providers.
    #[serde(default)]
    parsed: Option<Value>,
}

/// Chat-completions client scoped to a single run.
///
/// The underlying HTTP client is created in [`OpenAiClient::new`] and
/// released when the value is dropped.
#[derive(Debug)]
pub struct OpenAiClient {
    client: Client,
    endpoint: Url,
    api_key: String,
    model: String,
}

impl OpenAiClient {
    /// Build a client from resolved settings; the per-call timeout is applied to every request.
    pub fn new(settings: &ReasoningSettings) -> Result<Self> {
        let base = settings.base_url.trim_end_matches('/');
        let endpoint = Url::parse(&format!("{base}/chat/completions")).map_err(|e| {
            CurriculumError::config(format!(
                "invalid reasoning endpoint '{}': {e}",
                settings.base_url
            ))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                CurriculumError::transport(OPERATION, format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            endpoint,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    async fn send(&self, request: &ReasoningRequest) -> Result<AgentResponse> {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(ChatMessage::system(format!(
            "{}\nRespond with a single JSON object matching the {} schema.",
            request.instruction, request.schema
        )));
        messages.extend(request.messages.iter().cloned());

        let body = ChatRequest {
            model: &self.model,
            messages,
            response_format: ResponseFormat {
                r#type: "json_object",
            },
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CurriculumError::transport(OPERATION, format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CurriculumError::transport(
                OPERATION,
                format!("HTTP {status}: {}", text.chars().take(200).collect::<String>()),
            ));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            CurriculumError::transport(OPERATION, format!("invalid completion body: {e}"))
        })?;

        let message = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message)
            .ok_or_else(|| CurriculumError::transport(OPERATION, "completion had no choices"))?;

        Ok(match (message.parsed, message.content) {
            (Some(value), _) => AgentResponse::from_value(value),
            (None, Some(content)) => AgentResponse::Text(content),
            (None, None) => AgentResponse::Other(Value::Null),
        })
    }
}

impl ReasoningService for OpenAiClient {
    #[instrument(skip_all, fields(schema = request.schema, model = %self.model))]
    async fn invoke(&self, request: &ReasoningRequest) -> Result<AgentResponse> {
        let response = self.send(request).await?;
        debug!(shape = %response.shape(), "reasoning response received");
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use curriculum_shared::TopicSkeleton;

    use super::*;
    use crate::normalize;

    fn settings(base_url: String) -> ReasoningSettings {
        ReasoningSettings {
            api_key: "sk-test".into(),
            base_url,
            model: "test-model".into(),
            timeout: Duration::from_secs(5),
        }
    }

    fn request() -> ReasoningRequest {
        ReasoningRequest::for_schema::<TopicSkeleton>(
            "Break the topic down.",
            vec![ChatMessage::user("I want to learn graph theory?")],
        )
    }

    #[tokio::test]
    async fn content_is_returned_as_text() {
        let server = MockServer::start().await;
        let content = json!({"name": "graph theory", "description": "Graphs", "subtopics": ["BFS"]});

        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(json!({
                "model": "test-model",
                "response_format": {"type": "json_object"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": content.to_string()}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(format!("{}/v1/", server.uri()))).unwrap();
        let response = client.invoke(&request()).await.unwrap();
        assert_eq!(response.shape(), "text");

        let skeleton: TopicSkeleton = normalize(response).unwrap();
        assert_eq!(skeleton.subtopics, vec!["BFS".to_string()]);
    }

    #[tokio::test]
    async fn parsed_object_is_returned_as_mapping() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {
                    "content": null,
                    "parsed": {"name": "graph theory", "description": "Graphs", "subtopics": []}
                }}]
            })))
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(server.uri())).unwrap();
        let response = client.invoke(&request()).await.unwrap();
        assert_eq!(response.shape(), "mapping");
    }

    #[tokio::test]
    async fn http_error_is_transport_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(429).set_body_string("rate limited"))
            .expect(1)
            .mount(&server)
            .await;

        let client = OpenAiClient::new(&settings(server.uri())).unwrap();
        let err = client.invoke(&request()).await.unwrap_err();
        match err {
            CurriculumError::Transport { message, .. } => {
                assert!(message.contains("429"), "{message}");
                assert!(message.contains("rate limited"), "{message}");
            }
            other => panic!("expected Transport, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn slow_response_times_out_without_retry() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"choices": []}))
                    .set_delay(Duration::from_secs(2)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut settings = settings(server.uri());
        settings.timeout = Duration::from_millis(200);
        let client = OpenAiClient::new(&settings).unwrap();
        let err = client.invoke(&request()).await.unwrap_err();
        assert!(matches!(err, CurriculumError::Transport { .. }));
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let err = OpenAiClient::new(&settings("not a url".into())).unwrap_err();
        assert!(matches!(err, CurriculumError::Config { .. }));
    }
}
