//! Core domain types for curricula and tracker issues.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CurriculumError, Result};

/// Lowest allowed subtopic difficulty.
pub const MIN_DIFFICULTY: i64 = 1;

/// Highest allowed subtopic difficulty.
pub const MAX_DIFFICULTY: i64 = 5;

/// URL marker used for placeholder issues produced by a dry run.
pub const DRY_RUN_URL: &str = "DRY_RUN";

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying a single pipeline run (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Field-level invariants that hold for a decoded schema value.
pub trait Validate {
    /// Check invariants; the error carries the offending field path.
    fn validate(&self) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Curriculum
// ---------------------------------------------------------------------------

/// A practice exercise inside a subtopic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Short title of the exercise.
    pub name: String,
    /// What the learner should implement or accomplish.
    pub instructions: String,
    /// Input format and constraints.
    #[serde(default)]
    pub input_spec: Option<String>,
    /// Example inputs/outputs or usage.
    #[serde(default)]
    pub examples: Vec<String>,
    /// Objective checks to verify the solution.
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    /// Rough time estimate; at least one minute when present.
    #[serde(default)]
    pub estimated_time_minutes: Option<i64>,
    #[serde(default)]
    pub starter_code: Option<String>,
    /// Optional learning links.
    #[serde(default)]
    pub resources: Vec<String>,
}

impl Validate for Exercise {
    fn validate(&self) -> Result<()> {
        match self.estimated_time_minutes {
            Some(minutes) if minutes < 1 => Err(CurriculumError::validation_at(
                "estimated_time_minutes",
                format!("must be at least 1, got {minutes}"),
            )),
            _ => Ok(()),
        }
    }
}

/// One learnable unit of a topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTopic {
    pub name: String,
    /// Difficulty from 1 (easy) to 5 (hard).
    pub difficulty_level: i64,
    pub description: String,
    #[serde(default)]
    pub exercises: Vec<Exercise>,
    /// Objective steps to verify mastery of the subtopic.
    #[serde(default)]
    pub verification_steps: Vec<String>,
}

impl Validate for SubTopic {
    fn validate(&self) -> Result<()> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty_level) {
            return Err(CurriculumError::validation_at(
                "difficulty_level",
                format!(
                    "must be within {MIN_DIFFICULTY}..={MAX_DIFFICULTY}, got {}",
                    self.difficulty_level
                ),
            ));
        }
        for (i, exercise) in self.exercises.iter().enumerate() {
            exercise
                .validate()
                .map_err(|e| e.within(&format!("exercises[{i}]")))?;
        }
        Ok(())
    }
}

/// Output of the decomposition request: the topic plus subtopic names only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicSkeleton {
    pub name: String,
    pub description: String,
    /// Subtopic names, in the order they should be taught.
    #[serde(default)]
    pub subtopics: Vec<String>,
}

impl Validate for TopicSkeleton {
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

impl TopicSkeleton {
    /// Reject skeletons naming more subtopics than `cap`.
    pub fn check_cap(&self, cap: usize) -> Result<()> {
        if self.subtopics.len() > cap {
            return Err(CurriculumError::validation_at(
                "subtopics",
                format!(
                    "{} subtopic names exceed the configured cap of {cap}",
                    self.subtopics.len()
                ),
            ));
        }
        Ok(())
    }
}

/// A complete curriculum: topic metadata plus fully materialized subtopics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub subtopics: Vec<SubTopic>,
}

impl Validate for Topic {
    fn validate(&self) -> Result<()> {
        validate_subtopics(&self.subtopics)
    }
}

impl Topic {
    /// Start a topic from its skeleton, with no subtopics materialized yet.
    pub fn from_skeleton(skeleton: &TopicSkeleton) -> Self {
        Self {
            name: skeleton.name.clone(),
            description: skeleton.description.clone(),
            subtopics: Vec::with_capacity(skeleton.subtopics.len()),
        }
    }

    /// Cardinality fingerprint used by the Markdown-stage equivalence check.
    pub fn structure(&self) -> StructureSummary {
        StructureSummary::of(&self.subtopics)
    }
}

/// The display-ready curriculum returned by the Markdown rewrite.
///
/// A separate schema from [`Topic`] that only becomes a `Topic`
/// through [`DisplayTopic::conform_to`], which enforces structural equivalence
/// with the curriculum it was rewritten from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayTopic {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub subtopics: Vec<SubTopic>,
}

impl Validate for DisplayTopic {
    fn validate(&self) -> Result<()> {
        validate_subtopics(&self.subtopics)
    }
}

impl DisplayTopic {
    pub fn structure(&self) -> StructureSummary {
        StructureSummary::of(&self.subtopics)
    }

    /// Accept the rewrite as a [`Topic`] only if it keeps `original`'s shape.
    pub fn conform_to(self, original: &Topic) -> Result<Topic> {
        let expected = original.structure();
        let found = self.structure();
        if let Some(difference) = expected.difference(&found) {
            return Err(CurriculumError::structural_mismatch(difference));
        }
        Ok(Topic {
            name: self.name,
            description: self.description,
            subtopics: self.subtopics,
        })
    }
}

fn validate_subtopics(subtopics: &[SubTopic]) -> Result<()> {
    for (i, subtopic) in subtopics.iter().enumerate() {
        subtopic
            .validate()
            .map_err(|e| e.within(&format!("subtopics[{i}]")))?;
    }
    Ok(())
}

/// Ordered subtopic names with the ordered exercise names of each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureSummary {
    pub subtopics: Vec<SubtopicOutline>,
}

/// One subtopic's entry in a [`StructureSummary`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtopicOutline {
    pub name: String,
    pub exercises: Vec<String>,
}

impl StructureSummary {
    fn of(subtopics: &[SubTopic]) -> Self {
        Self {
            subtopics: subtopics
                .iter()
                .map(|s| SubtopicOutline {
                    name: s.name.trim().to_string(),
                    exercises: s.exercises.iter().map(|e| e.name.trim().to_string()).collect(),
                })
                .collect(),
        }
    }

    /// Describe the first difference in cardinality, naming or ordering,
    /// or `None` if equivalent.
    pub fn difference(&self, other: &Self) -> Option<String> {
        let (ours, theirs) = (&self.subtopics, &other.subtopics);
        if ours.len() != theirs.len() {
            return Some(format!(
                "expected {} subtopics, found {}",
                ours.len(),
                theirs.len()
            ));
        }
        ours.iter()
            .zip(theirs)
            .enumerate()
            .find_map(|(i, (a, b))| a.difference(b).map(|d| format!("subtopics[{i}]: {d}")))
    }
}

impl SubtopicOutline {
    fn difference(&self, other: &Self) -> Option<String> {
        if self.name != other.name {
            return Some(format!(
                "expected subtopic '{}', found '{}'",
                self.name, other.name
            ));
        }
        if self.exercises.len() != other.exercises.len() {
            return Some(format!(
                "expected {} exercises, found {}",
                self.exercises.len(),
                other.exercises.len()
            ));
        }
        self.exercises
            .iter()
            .zip(&other.exercises)
            .position(|(a, b)| a != b)
            .map(|j| {
                format!(
                    "exercises[{j}]: expected '{}', found '{}'",
                    self.exercises[j], other.exercises[j]
                )
            })
    }
}

// ---------------------------------------------------------------------------
// Tracker issues
// ---------------------------------------------------------------------------

/// Repository coordinates on the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTarget {
    pub owner: String,
    pub repo: String,
}

impl RepoTarget {
    /// Build a target, rejecting names that would not stay a single URL
    /// path segment.
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        let (owner, repo) = (owner.into(), repo.into());
        check_repo_part("owner", &owner)?;
        check_repo_part("repo", &repo)?;
        Ok(Self { owner, repo })
    }
}

fn check_repo_part(field: &str, value: &str) -> Result<()> {
    let allowed = |c: char| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.');
    if value.is_empty() || value == "." || value == ".." || !value.chars().all(allowed) {
        return Err(CurriculumError::config(format!(
            "invalid repository {field} '{value}': use letters, digits, '-', '_' or '.'"
        )));
    }
    Ok(())
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// In-memory issue content prior to publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueDraft {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// An issue as reported back by the tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    /// Tracker-global identifier (used for sub-issue linking).
    pub id: u64,
    /// Per-repository issue number (used for `#N` references).
    pub number: u64,
    pub url: String,
    pub title: String,
}

impl CreatedIssue {
    /// Placeholder returned by a dry run in place of a real issue.
    pub fn placeholder(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            number: 0,
            url: DRY_RUN_URL.to_string(),
            title: title.into(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.url == DRY_RUN_URL
    }
}

/// Result of a sub-issue linking attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LinkStatus {
    Linked,
    Failed { error: String },
    /// No call was made (dry run).
    Skipped,
}

/// Per-subtopic linking outcome, in creation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkOutcome {
    pub child_number: u64,
    pub child_id: u64,
    #[serde(flatten)]
    pub status: LinkStatus,
}

impl LinkOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self.status, LinkStatus::Failed { .. })
    }
}

/// Everything the publisher created for one curriculum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueCreationResult {
    pub topic_issue: CreatedIssue,
    #[serde(default)]
    pub sub_issues: Vec<CreatedIssue>,
    #[serde(default)]
    pub links: Vec<LinkOutcome>,
}

impl IssueCreationResult {
    /// Link outcomes that failed, for reporting.
    pub fn failed_links(&self) -> impl Iterator<Item = &LinkOutcome> {
        self.links.iter().filter(|l| l.is_failed())
    }
}
