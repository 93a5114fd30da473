//! Markdown composition for curricula.
//!
//! Two consumers share the same section rules: tracker issue drafts
//! ([`build_issue_drafts`]) and the terminal rendering of a whole curriculum
//! ([`render_topic`]). Neither performs I/O.

mod drafts;
mod render;

use curriculum_shared::Exercise;

pub use drafts::{DraftOptions, IssueDrafts, build_issue_drafts};
pub use render::render_topic;

/// Marker that opens and closes a fenced code block.
pub const FENCE: &str = "```";

/// Default fence language for starter code.
pub const DEFAULT_CODE_LANGUAGE: &str = "python";

/// Wrap `code` in a fenced block unless it already contains a fence.
///
/// Surrounding newlines are stripped first; blank input yields an empty string.
pub fn fence_code(code: &str, language: &str) -> String {
    let code = code.trim_matches('\n');
    if code.trim().is_empty() {
        return String::new();
    }
    if code.contains(FENCE) {
        return code.to_string();
    }
    format!("{FENCE}{language}\n{code}\n{FENCE}")
}

/// `title` followed by one `- ` bullet per item, or `None` for an empty list.
pub(crate) fn bullet_section(title: &str, items: &[String]) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let bullets: Vec<String> = items.iter().map(|item| format!("- {item}")).collect();
    Some(format!("{title}\n{}", bullets.join("\n")))
}

/// Blocks describing one exercise: heading with instructions, then the
/// optional acceptance criteria, hints, and starter code blocks.
pub(crate) fn exercise_blocks(exercise: &Exercise, heading: &str, language: &str) -> Vec<String> {
    let mut blocks = vec![format!("{heading} {}\n\n{}", exercise.name, exercise.instructions)];

    blocks.extend(bullet_section("**Acceptance criteria**", &exercise.acceptance_criteria));
    blocks.extend(bullet_section("**Hints**", &exercise.hints));

    let starter = exercise
        .starter_code
        .as_deref()
        .map(|code| fence_code(code, language))
        .unwrap_or_default();
    if !starter.is_empty() {
        blocks.push(format!("**Starter code**\n\n{starter}"));
    }

    blocks
}

/// Join the non-blank blocks, trimmed, with blank lines between them.
pub(crate) fn join_blocks<I>(blocks: I) -> String
where
    I: IntoIterator<Item = String>,
{
    blocks
        .into_iter()
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
