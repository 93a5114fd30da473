//! Ordered resolution of an [`AgentResponse`] into one schema value.
//!
//! Resolution order (first match wins):
//! 1. a record of the target schema is returned unchanged
//! 2. a record of another schema is field-dumped and re-decoded
//! 3. an envelope (or a mapping holding [`STRUCTURED_RESULT_KEY`]) is unwrapped
//!    and resolved again through steps 1 to 4 only; unwrapped text is rejected
//! 4. a mapping is decoded directly
//! 5. text is parsed as JSON and the resulting object decoded
//! 6. anything else fails
//!
//! Every successfully decoded value is then checked with [`Validate`].

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use curriculum_shared::{
    CurriculumError, DisplayTopic, Result, SubTopic, Topic, TopicSkeleton, Validate,
};

use crate::{AgentResponse, SchemaRecord, json_kind};

/// Key under which agent frameworks conventionally expose the structured result.
pub const STRUCTURED_RESULT_KEY: &str = "structured_response";

/// A target schema for normalization.
pub trait Schema: DeserializeOwned + Validate + Sized {
    /// Name reported in errors and requests.
    const NAME: &'static str;

    /// Take the value out of a record of this exact schema, or hand the record back.
    fn from_record(record: SchemaRecord) -> std::result::Result<Self, SchemaRecord>;
}

impl Schema for TopicSkeleton {
    const NAME: &'static str = "TopicSkeleton";

    fn from_record(record: SchemaRecord) -> std::result::Result<Self, SchemaRecord> {
        match record {
            SchemaRecord::Skeleton(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Schema for SubTopic {
    const NAME: &'static str = "SubTopic";

    fn from_record(record: SchemaRecord) -> std::result::Result<Self, SchemaRecord> {
        match record {
            SchemaRecord::SubTopic(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Schema for Topic {
    const NAME: &'static str = "Topic";

    fn from_record(record: SchemaRecord) -> std::result::Result<Self, SchemaRecord> {
        match record {
            SchemaRecord::Topic(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Schema for DisplayTopic {
    const NAME: &'static str = "DisplayTopic";

    fn from_record(record: SchemaRecord) -> std::result::Result<Self, SchemaRecord> {
        match record {
            SchemaRecord::Display(v) => Ok(v),
            other => Err(other),
        }
    }
}

/// Normalize a service response into exactly one `S`.
pub fn normalize<S: Schema>(response: AgentResponse) -> Result<S> {
    let value = resolve::<S>(response)?;
    value.validate()?;
    Ok(value)
}

fn resolve<S: Schema>(response: AgentResponse) -> Result<S> {
    let shape = response.shape();
    debug!(%shape, schema = S::NAME, "normalizing response");

    match response {
        AgentResponse::Record(record) => match S::from_record(record) {
            Ok(value) => Ok(value),
            Err(other) => {
                let dumped = other.dump().map_err(|e| {
                    CurriculumError::normalization(&shape, S::NAME, format!("field dump failed: {e}"))
                })?;
                decode::<S>(dumped, &shape)
            }
        },
        AgentResponse::Envelope(inner) => unwrap_structured::<S>(*inner, &shape),
        AgentResponse::Mapping(mut map) => match map.remove(STRUCTURED_RESULT_KEY) {
            Some(inner) => unwrap_structured::<S>(AgentResponse::from_value(inner), &shape),
            None => decode::<S>(Value::Object(map), &shape),
        },
        AgentResponse::Text(text) => {
            let parsed: Value = serde_json::from_str(text.trim()).map_err(|e| {
                CurriculumError::normalization(&shape, S::NAME, format!("invalid JSON: {e}"))
            })?;
            match parsed {
                Value::Object(_) => decode::<S>(parsed, &shape),
                other => Err(CurriculumError::normalization(
                    &shape,
                    S::NAME,
                    format!("expected a JSON object, found {}", json_kind(&other)),
                )),
            }
        }
        AgentResponse::Other(_) => Err(CurriculumError::normalization(
            &shape,
            S::NAME,
            "unrecognized response shape",
        )),
    }
}

/// Resolve the payload of a structured result. Text is not parsed here.
fn unwrap_structured<S: Schema>(inner: AgentResponse, outer_shape: &str) -> Result<S> {
    if let AgentResponse::Text(_) = inner {
        return Err(CurriculumError::normalization(
            outer_shape,
            S::NAME,
            "structured result holds text, expected an object",
        ));
    }
    resolve::<S>(inner)
}

fn decode<S: Schema>(value: Value, shape: &str) -> Result<S> {
    serde_json::from_value(value)
        .map_err(|e| CurriculumError::normalization(shape, S::NAME, e.to_string()))
}
