//! Projection of a finished [`Topic`] into tracker issue drafts.

use tracing::debug;

use curriculum_shared::{AppConfig, IssueDraft, SubTopic, Topic};

use crate::{DEFAULT_CODE_LANGUAGE, bullet_section, exercise_blocks, join_blocks};

/// Labels and formatting applied to drafts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftOptions {
    pub topic_labels: Vec<String>,
    pub subtopic_labels: Vec<String>,
    /// Fence language for starter code that is not already fenced.
    pub code_language: String,
}

impl Default for DraftOptions {
    fn default() -> Self {
        Self {
            topic_labels: vec!["learning".into()],
            subtopic_labels: vec!["learning".into(), "subtopic".into()],
            code_language: DEFAULT_CODE_LANGUAGE.into(),
        }
    }
}

impl From<&AppConfig> for DraftOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            topic_labels: config.labels.topic.clone(),
            subtopic_labels: config.labels.subtopic.clone(),
            code_language: config.defaults.code_language.clone(),
        }
    }
}

/// The topic draft plus one draft per subtopic, in subtopic order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueDrafts {
    pub topic: IssueDraft,
    pub subtopics: Vec<IssueDraft>,
}

/// Build issue drafts for `topic`. Pure and deterministic.
pub fn build_issue_drafts(topic: &Topic, opts: &DraftOptions) -> IssueDrafts {
    let topic_draft = IssueDraft {
        title: topic.name.clone(),
        body: topic.description.clone(),
        labels: opts.topic_labels.clone(),
    };

    let subtopics: Vec<IssueDraft> = topic
        .subtopics
        .iter()
        .map(|st| IssueDraft {
            title: st.name.clone(),
            body: subtopic_body(st, &opts.code_language),
            labels: opts.subtopic_labels.clone(),
        })
        .collect();

    debug!(topic = %topic.name, subtopics = subtopics.len(), "built issue drafts");

    IssueDrafts {
        topic: topic_draft,
        subtopics,
    }
}

fn subtopic_body(subtopic: &SubTopic, language: &str) -> String {
    let mut parts: Vec<String> = vec![subtopic.description.clone()];

    parts.extend(bullet_section(
        "### Verification steps",
        &subtopic.verification_steps,
    ));

    if !subtopic.exercises.is_empty() {
        let mut exercises = vec!["### Exercises".to_string()];
        for exercise in &subtopic.exercises {
            exercises.extend(exercise_blocks(exercise, "####", language));
        }
        parts.push(exercises.join("\n\n"));
    }

    join_blocks(parts)
}
