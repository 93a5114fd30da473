//! Whole-curriculum Markdown document, as printed by the CLI.

use curriculum_shared::{SubTopic, Topic};

use crate::{bullet_section, exercise_blocks, join_blocks};

/// Separator placed between subtopics.
const RULE: &str = "---";

/// Render `topic` as a single Markdown document ending in a newline.
pub fn render_topic(topic: &Topic, language: &str) -> String {
    let mut blocks = vec![format!("# {}", topic.name), topic.description.clone()];

    for subtopic in &topic.subtopics {
        blocks.push(RULE.to_string());
        blocks.push(render_subtopic(subtopic, language));
    }

    let mut doc = join_blocks(blocks);
    doc.push('\n');
    doc
}

fn render_subtopic(subtopic: &SubTopic, language: &str) -> String {
    let mut blocks = vec![
        format!(
            "## {} (difficulty {}/5)",
            subtopic.name, subtopic.difficulty_level
        ),
        subtopic.description.clone(),
    ];

    blocks.extend(bullet_section(
        "### Verification steps\n",
        &subtopic.verification_steps,
    ));

    if !subtopic.exercises.is_empty() {
        blocks.push("### Exercises".to_string());
        for exercise in &subtopic.exercises {
            blocks.extend(exercise_blocks(exercise, "####", language));
        }
    }

    join_blocks(blocks)
}
