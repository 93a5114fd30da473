//! Shared types, error model, and configuration for the curriculum builder.
//!
//! This crate is the foundation depended on by all other curriculum crates.
//! It provides:
//! - [`CurriculumError`]: the unified error type
//! - Domain types ([`Topic`], [`SubTopic`], [`Exercise`], [`IssueDraft`], [`CreatedIssue`])
//! - Configuration ([`AppConfig`], credential resolution, config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, LabelsConfig, ReasoningConfig, ReasoningSettings, TrackerConfig,
    TrackerSettings, config_dir, config_file_path, init_config, load_config, load_config_from,
    resolve_reasoning_settings, resolve_tracker_settings,
};
pub use error::{CurriculumError, Result};
pub use types::{
    CreatedIssue, DRY_RUN_URL, DisplayTopic, Exercise, IssueCreationResult, IssueDraft,
    LinkOutcome, LinkStatus, MAX_DIFFICULTY, MIN_DIFFICULTY, RepoTarget, RunId,
    StructureSummary, SubTopic, SubtopicOutline, Topic, TopicSkeleton, Validate,
};
