//! The publish protocol: topic issue, then subtopic issues, then links.

use tracing::{info, instrument, warn};

use curriculum_shared::{
    CreatedIssue, IssueCreationResult, IssueDraft, LinkOutcome, LinkStatus, RepoTarget, Result,
};

use crate::IssueTracker;

/// Back-reference line that opens every subtopic issue body.
pub fn parent_reference(topic_number: u64) -> String {
    format!("Parent: #{topic_number}")
}

fn subtopic_body(topic_number: u64, draft_body: &str) -> String {
    let reference = parent_reference(topic_number);
    if draft_body.is_empty() {
        reference
    } else {
        format!("{reference}\n\n{draft_body}")
    }
}

/// Publish the drafts to `target`.
///
/// 1. Create the topic issue; failure aborts everything.
/// 2. Create the subtopic issues in order, each opening with a
///    `Parent: #N` back-reference; the first failure aborts the rest and is
///    returned. Issues created before the failure stay on the tracker.
/// 3. Link every subtopic issue under the topic issue, in creation order.
///    Link failures are recorded in [`IssueCreationResult::links`] and do
///    not stop the loop.
#[instrument(skip_all, fields(target = %target, subtopics = subtopic_drafts.len()))]
pub async fn publish<T: IssueTracker>(
    tracker: &T,
    target: &RepoTarget,
    topic_draft: &IssueDraft,
    subtopic_drafts: &[IssueDraft],
) -> Result<IssueCreationResult> {
    let topic_issue = tracker.create_issue(target, topic_draft).await?;
    info!(number = topic_issue.number, url = %topic_issue.url, "created topic issue");

    let mut sub_issues = Vec::with_capacity(subtopic_drafts.len());
    for draft in subtopic_drafts {
        let draft = IssueDraft {
            title: draft.title.clone(),
            body: subtopic_body(topic_issue.number, &draft.body),
            labels: draft.labels.clone(),
        };
        let issue = tracker.create_issue(target, &draft).await.inspect_err(|e| {
            warn!(
                title = %draft.title,
                created = sub_issues.len(),
                error = %e,
                "subtopic issue creation failed, earlier issues are left in place"
            );
        })?;
        info!(number = issue.number, title = %issue.title, "created subtopic issue");
        sub_issues.push(issue);
    }

    let mut links = Vec::with_capacity(sub_issues.len());
    for issue in &sub_issues {
        let status = match tracker
            .link_sub_issue(target, topic_issue.number, issue.id, true)
            .await
        {
            Ok(()) => LinkStatus::Linked,
            Err(e) => {
                warn!(child = issue.number, error = %e, "sub-issue linking failed");
                LinkStatus::Failed {
                    error: e.to_string(),
                }
            }
        };
        links.push(LinkOutcome {
            child_number: issue.number,
            child_id: issue.id,
            status,
        });
    }

    let failed = links.iter().filter(|l| l.is_failed()).count();
    info!(
        topic = topic_issue.number,
        sub_issues = sub_issues.len(),
        failed_links = failed,
        "publish complete"
    );

    Ok(IssueCreationResult {
        topic_issue,
        sub_issues,
        links,
    })
}

/// Preview of [`publish`] that makes no tracker calls.
///
/// Returns placeholder issues in the same order, with every link skipped.
pub fn dry_run(topic_draft: &IssueDraft, subtopic_drafts: &[IssueDraft]) -> IssueCreationResult {
    let sub_issues: Vec<CreatedIssue> = subtopic_drafts
        .iter()
        .map(|d| CreatedIssue::placeholder(&d.title))
        .collect();
    let links = sub_issues
        .iter()
        .map(|issue| LinkOutcome {
            child_number: issue.number,
            child_id: issue.id,
            status: LinkStatus::Skipped,
        })
        .collect();

    info!(sub_issues = sub_issues.len(), "dry run, no issues created");

    IssueCreationResult {
        topic_issue: CreatedIssue::placeholder(&topic_draft.title),
        sub_issues,
        links,
    }
}
