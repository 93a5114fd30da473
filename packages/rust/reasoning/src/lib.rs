//! Reasoning-service contract and response normalization.
//!
//! The reasoning service is an opaque generative backend: it receives an
//! instruction plus ordered context messages and answers with a payload whose
//! shape is not under our control. [`AgentResponse`] enumerates the shapes we
//! accept and [`normalize`] turns any of them into one strictly typed schema
//! value, or fails.

mod normalize;
mod openai;

use std::future::Future;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use curriculum_shared::{DisplayTopic, Result, SubTopic, Topic, TopicSkeleton};

pub use normalize::{STRUCTURED_RESULT_KEY, Schema, normalize};
pub use openai::OpenAiClient;

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Author of a context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One ordered context message sent with a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A single request to the reasoning service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReasoningRequest {
    /// Standing instruction (system prompt) for this request.
    pub instruction: String,
    /// Ordered context messages.
    pub messages: Vec<ChatMessage>,
    /// Name of the schema the answer will be normalized against.
    pub schema: &'static str,
}

impl ReasoningRequest {
    /// Build a request whose answer will be normalized to `S`.
    pub fn for_schema<S: Schema>(instruction: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            instruction: instruction.into(),
            messages,
            schema: S::NAME,
        }
    }
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// A value already typed as one of the known schemas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaRecord {
    Skeleton(TopicSkeleton),
    SubTopic(SubTopic),
    Topic(Topic),
    Display(DisplayTopic),
}

impl SchemaRecord {
    pub fn schema_name(&self) -> &'static str {
        match self {
            Self::Skeleton(_) => TopicSkeleton::NAME,
            Self::SubTopic(_) => SubTopic::NAME,
            Self::Topic(_) => Topic::NAME,
            Self::Display(_) => DisplayTopic::NAME,
        }
    }

    /// Structural field dump of the record.
    pub fn dump(&self) -> serde_json::Result<Value> {
        match self {
            Self::Skeleton(v) => serde_json::to_value(v),
            Self::SubTopic(v) => serde_json::to_value(v),
            Self::Topic(v) => serde_json::to_value(v),
            Self::Display(v) => serde_json::to_value(v),
        }
    }
}

/// The closed set of response shapes the service may produce.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentResponse {
    /// A typed record of some schema.
    Record(SchemaRecord),
    /// A container exposing the payload under its structured-result key.
    Envelope(Box<AgentResponse>),
    /// An untyped key/value mapping.
    Mapping(Map<String, Value>),
    /// Raw text, expected to hold a JSON document.
    Text(String),
    /// Any other JSON value (array, number, bool, null).
    Other(Value),
}

impl AgentResponse {
    /// Classify an arbitrary JSON value.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::Mapping(map),
            Value::String(text) => Self::Text(text),
            other => Self::Other(other),
        }
    }

    /// Short identifier of the shape, used in error messages.
    pub fn shape(&self) -> String {
        match self {
            Self::Record(record) => format!("record<{}>", record.schema_name()),
            Self::Envelope(_) => "envelope".into(),
            Self::Mapping(_) => "mapping".into(),
            Self::Text(_) => "text".into(),
            Self::Other(value) => json_kind(value).into(),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Service contract
// ---------------------------------------------------------------------------

/// Request/response contract of the reasoning backend.
///
/// Implementations perform exactly one call per `invoke`, bounded by their
/// own timeout, and never retry.
pub trait ReasoningService: Send + Sync {
    fn invoke(
        &self,
        request: &ReasoningRequest,
    ) -> impl Future<Output = Result<AgentResponse>> + Send;
}

impl<T: ReasoningService> ReasoningService for &T {
    fn invoke(
        &self,
        request: &ReasoningRequest,
    ) -> impl Future<Output = Result<AgentResponse>> + Send {
        (**self).invoke(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_value_classifies_shapes() {
        assert!(matches!(
            AgentResponse::from_value(serde_json::json!({"a": 1})),
            AgentResponse::Mapping(_)
        ));
        assert!(matches!(
            AgentResponse::from_value(serde_json::json!("{}")),
            AgentResponse::Text(_)
        ));
        assert_eq!(AgentResponse::from_value(serde_json::json!([1, 2])).shape(), "array");
        assert_eq!(AgentResponse::from_value(Value::Null).shape(), "null");
    }

    #[test]
    fn record_shape_names_its_schema() {
        let record = SchemaRecord::Skeleton(TopicSkeleton {
            name: "graphs".into(),
            description: "Graphs".into(),
            subtopics: vec![],
        });
        assert_eq!(AgentResponse::Record(record).shape(), "record<TopicSkeleton>");
    }

    #[test]
    fn chat_message_serializes_lowercase_role() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
    }
}
