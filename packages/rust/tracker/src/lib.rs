//! Issue-tracker publishing: create one issue per curriculum element and
//! link the subtopic issues under the topic issue.
//!
//! Only the two tracker operations the publisher needs are modelled
//! ([`IssueTracker::create_issue`] and [`IssueTracker::link_sub_issue`]).
//! Nothing here is idempotent: publishing the same curriculum twice creates
//! duplicate issues.

mod github;
mod publisher;

use std::future::Future;

use curriculum_shared::{CreatedIssue, IssueDraft, RepoTarget, Result};

pub use github::GitHubClient;
pub use publisher::{dry_run, parent_reference, publish};

/// The tracker operations used by the publisher.
///
/// Each call is a single request bounded by the implementation's timeout;
/// implementations never retry.
pub trait IssueTracker: Send + Sync {
    /// Create an issue from `draft` and report its identifiers.
    fn create_issue(
        &self,
        target: &RepoTarget,
        draft: &IssueDraft,
    ) -> impl Future<Output = Result<CreatedIssue>> + Send;

    /// Attach issue `child_id` as a sub-issue of issue `parent_number`.
    fn link_sub_issue(
        &self,
        target: &RepoTarget,
        parent_number: u64,
        child_id: u64,
        replace_parent: bool,
    ) -> impl Future<Output = Result<()>> + Send;
}

impl<T: IssueTracker> IssueTracker for &T {
    fn create_issue(
        &self,
        target: &RepoTarget,
        draft: &IssueDraft,
    ) -> impl Future<Output = Result<CreatedIssue>> + Send {
        (**self).create_issue(target, draft)
    }

    fn link_sub_issue(
        &self,
        target: &RepoTarget,
        parent_number: u64,
        child_id: u64,
        replace_parent: bool,
    ) -> impl Future<Output = Result<()>> + Send {
        (**self).link_sub_issue(target, parent_number, child_id, replace_parent)
    }
}
