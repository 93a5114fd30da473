//! Request builders for the three kinds of reasoning calls.

use curriculum_reasoning::{ChatMessage, ReasoningRequest};
use curriculum_shared::{CurriculumError, DisplayTopic, Result, SubTopic, Topic, TopicSkeleton};

/// Style directive used when the caller gives none.
pub const DEFAULT_STYLE: &str = "Use a simple, professional style.";

const TUTOR: &str = "You are an expert learning assistant.";

const FORMATTER: &str = "You are a Markdown formatting assistant. You receive a structured \
learning topic with subtopics, exercises, and verification steps, and return the same object \
shape with its text fields rewritten as Markdown suitable for GitHub issue bodies. \
Rules: do not add or remove subtopics or exercises and do not invent content; \
keep every name unchanged; write Markdown in the topic and subtopic descriptions, the \
verification steps, the exercise instructions, acceptance criteria and hints; \
keep starter code as-is and never wrap it in additional fences; \
keep the formatting consistent and compact.";

/// Stage 1: break the issue down into a named list of subtopics.
pub fn decompose_topic(issue_title: &str, issue_body: &str, cap: usize) -> ReasoningRequest {
    ReasoningRequest::for_schema::<TopicSkeleton>(
        format!(
            "{TUTOR} Help the user learn a new topic by breaking it down into manageable \
             subtopics. Give a maximum of {cap} subtopics."
        ),
        vec![
            ChatMessage::user(format!("I want to learn {issue_title}?")),
            ChatMessage::user(format!("I know {issue_body}")),
        ],
    )
}

/// Stage 1, per subtopic: materialize one named subtopic.
pub fn enrich_subtopic(subtopic_name: &str, issue_title: &str) -> ReasoningRequest {
    ReasoningRequest::for_schema::<SubTopic>(
        TUTOR,
        vec![ChatMessage::user(format!(
            "Create a detailed subtopic for '{subtopic_name}' when learning {issue_title}. \
             Include name, difficulty_level (1-5), description, exercises (with instructions), \
             and verification_steps."
        ))],
    )
}

/// Stage 2: rewrite the text fields of `topic` for display.
pub fn rewrite_for_display(topic: &Topic, style_guide: Option<&str>) -> Result<ReasoningRequest> {
    let payload = serde_json::to_string_pretty(topic).map_err(|e| {
        CurriculumError::validation_at("topic", format!("cannot serialize curriculum: {e}"))
    })?;
    let style = style_guide
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_STYLE);

    Ok(ReasoningRequest::for_schema::<DisplayTopic>(
        FORMATTER,
        vec![ChatMessage::user(format!(
            "Rewrite the following Topic into the SAME Topic-shaped JSON with Markdown-ready \
             text fields. Style guide: {style}\n\nTopic JSON:\n{payload}"
        ))],
    ))
}
