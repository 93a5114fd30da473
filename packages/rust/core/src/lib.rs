//! Run orchestration for the curriculum builder.
//!
//! A run takes one issue (title and body) through the Learning stage
//! (decomposition and per-subtopic enrichment), the Markdown stage
//! (display rewrite under a structural-equivalence check) and, when
//! requested, the Publishing stage.

pub mod pipeline;
pub mod prompts;

pub use pipeline::{
    Pipeline, PipelineConfig, ProgressReporter, RunOutput, RunRequest, SilentProgress, Stage,
};
