//! End-to-end run: issue → Learning → Markdown → (optional) Publishing.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use curriculum_markdown::{DraftOptions, build_issue_drafts};
use curriculum_reasoning::{ReasoningRequest, ReasoningService, Schema, normalize};
use curriculum_shared::{
    AppConfig, CurriculumError, DisplayTopic, IssueCreationResult, RepoTarget, Result, RunId,
    SubTopic, Topic, TopicSkeleton,
};
use curriculum_tracker::IssueTracker;

use crate::prompts;

/// The stages of a run, in the only order they can be entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Start,
    Learning,
    Markdown,
    Publishing,
    Done,
}

impl Stage {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "Starting",
            Self::Learning => "Building curriculum",
            Self::Markdown => "Formatting for display",
            Self::Publishing => "Publishing issues",
            Self::Done => "Done",
        }
    }
}

/// Inputs of a single run.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub issue_title: String,
    pub issue_body: String,
    /// Free-text formatting directive for the Markdown stage.
    pub style_guide: Option<String>,
    pub owner: Option<String>,
    pub repo: Option<String>,
    /// Run the Publishing stage.
    pub publish: bool,
    /// Preview publishing without calling the tracker.
    pub dry_run: bool,
}

impl RunRequest {
    /// The repository to publish into, or `None` when publishing is off.
    pub fn publish_target(&self) -> Result<Option<RepoTarget>> {
        if !self.publish {
            return Ok(None);
        }
        let owner = non_blank(self.owner.as_deref());
        let repo = non_blank(self.repo.as_deref());
        match (owner, repo) {
            (Some(owner), Some(repo)) => RepoTarget::new(owner, repo).map(Some),
            _ => Err(CurriculumError::config(
                "publishing requires both a repository owner and a repository name",
            )),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Run-independent pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Maximum number of subtopics a decomposition may name.
    pub subtopic_cap: usize,
    pub drafts: DraftOptions,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            subtopic_cap: 3,
            drafts: DraftOptions::default(),
        }
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            subtopic_cap: config.defaults.subtopic_cap,
            drafts: DraftOptions::from(config),
        }
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub run_id: RunId,
    pub started_at: DateTime<Utc>,
    /// The display-formatted curriculum.
    pub topic: Topic,
    /// Publishing outcome, present only when publishing was requested.
    pub issues: Option<IssueCreationResult>,
    #[serde(skip)]
    pub elapsed: Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new stage.
    fn stage(&self, stage: Stage);
    /// Called after each subtopic has been materialized.
    fn subtopic_enriched(&self, name: &str, current: usize, total: usize);
    /// Called when the run completes.
    fn done(&self, output: &RunOutput);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage(&self, _stage: Stage) {}
    fn subtopic_enriched(&self, _name: &str, _current: usize, _total: usize) {}
    fn done(&self, _output: &RunOutput) {}
}

/// Per-run bookkeeping. Stages only move forward.
struct RunState {
    run_id: RunId,
    stage: Stage,
}

impl RunState {
    fn enter(&mut self, next: Stage, progress: &dyn ProgressReporter) {
        debug_assert!(next > self.stage, "stage {next:?} after {:?}", self.stage);
        debug!(run_id = %self.run_id, from = ?self.stage, to = ?next, "stage transition");
        self.stage = next;
        progress.stage(next);
    }
}

/// The curriculum builder.
///
/// `tracker` may be `None` when no run will publish for real; a run that
/// needs it and finds none fails before any external call.
pub struct Pipeline<R, T> {
    reasoning: R,
    tracker: Option<T>,
    config: PipelineConfig,
}

impl<R: ReasoningService, T: IssueTracker> Pipeline<R, T> {
    pub fn new(reasoning: R, tracker: Option<T>, config: PipelineConfig) -> Self {
        Self {
            reasoning,
            tracker,
            config,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage for one issue.
    ///
    /// Any stage failure ends the run with that error. Partial results are
    /// not returned, and issues already created by a failed publish stay on
    /// the tracker.
    #[instrument(skip_all, fields(title = %request.issue_title, publish = request.publish, dry_run = request.dry_run))]
    pub async fn run(
        &self,
        request: &RunRequest,
        progress: &dyn ProgressReporter,
    ) -> Result<RunOutput> {
        let start = Instant::now();
        let started_at = Utc::now();
        let mut state = RunState {
            run_id: RunId::new(),
            stage: Stage::Start,
        };
        progress.stage(Stage::Start);

        info!(run_id = %state.run_id, "starting run");

        // --- Pre-flight ---
        let target = request.publish_target()?;
        let tracker = match (&target, request.dry_run) {
            (Some(_), false) => Some(self.tracker.as_ref().ok_or_else(|| {
                CurriculumError::config("publishing requires issue-tracker credentials")
            })?),
            _ => None,
        };

        // --- Stage 1: Learning ---
        state.enter(Stage::Learning, progress);
        let topic = self.learn(request, progress).await?;

        // --- Stage 2: Markdown ---
        state.enter(Stage::Markdown, progress);
        let topic = self.format_for_display(&topic, request.style_guide.as_deref()).await?;

        // --- Stage 3: Publishing ---
        let issues = match target {
            Some(target) => {
                state.enter(Stage::Publishing, progress);
                let drafts = build_issue_drafts(&topic, &self.config.drafts);
                let result = match tracker {
                    Some(tracker) => {
                        curriculum_tracker::publish(
                            tracker,
                            &target,
                            &drafts.topic,
                            &drafts.subtopics,
                        )
                        .await?
                    }
                    None => curriculum_tracker::dry_run(&drafts.topic, &drafts.subtopics),
                };
                Some(result)
            }
            None => None,
        };

        state.enter(Stage::Done, progress);
        let output = RunOutput {
            run_id: state.run_id,
            started_at,
            topic,
            issues,
            elapsed: start.elapsed(),
        };

        progress.done(&output);

        info!(
            run_id = %output.run_id,
            subtopics = output.topic.subtopics.len(),
            published = output.issues.as_ref().is_some_and(|r| !r.topic_issue.is_placeholder()),
            elapsed_ms = output.elapsed.as_millis(),
            "run complete"
        );

        Ok(output)
    }

    /// Decompose the issue into a skeleton, then materialize each named
    /// subtopic in skeleton order.
    async fn learn(&self, request: &RunRequest, progress: &dyn ProgressReporter) -> Result<Topic> {
        let cap = self.config.subtopic_cap;
        let skeleton: TopicSkeleton = self
            .ask(prompts::decompose_topic(
                &request.issue_title,
                &request.issue_body,
                cap,
            ))
            .await?;
        skeleton.check_cap(cap)?;

        info!(
            topic = %skeleton.name,
            subtopics = skeleton.subtopics.len(),
            "decomposition complete"
        );

        let mut topic = Topic::from_skeleton(&skeleton);
        let total = skeleton.subtopics.len();

        for (i, name) in skeleton.subtopics.iter().enumerate() {
            let subtopic: SubTopic = self
                .ask(prompts::enrich_subtopic(name, &request.issue_title))
                .await
                .map_err(|e| {
                    error!(subtopic = %name, error = %e, "subtopic enrichment failed");
                    e.within(&format!("subtopics[{i}]"))
                })?;
            progress.subtopic_enriched(name, i + 1, total);
            topic.subtopics.push(subtopic);
        }

        Ok(topic)
    }

    /// Rewrite the curriculum's text fields, keeping its structure.
    async fn format_for_display(&self, topic: &Topic, style_guide: Option<&str>) -> Result<Topic> {
        let display: DisplayTopic = self
            .ask(prompts::rewrite_for_display(topic, style_guide)?)
            .await?;
        display.conform_to(topic)
    }

    async fn ask<S: Schema>(&self, request: ReasoningRequest) -> Result<S> {
        let response = self.reasoning.invoke(&request).await?;
        normalize::<S>(response)
    }
}
