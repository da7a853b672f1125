//! Notification drafts for platform events.
//!
//! Each constructor turns the facts of a marketplace event into the
//! [`NewNotification`]s it should raise. The entities themselves live in
//! other services, so callers pass in the handful of fields the text and
//! links need. Message bodies are clipped to [`MAX_MESSAGE_LEN`] so template
//! output always passes validation.

use marketplace_core::notification::{NewNotification, MAX_MESSAGE_LEN};
use marketplace_core::types::ProfileId;

/// The acting profile, as shown in the notification.
#[derive(Debug, Clone)]
pub struct Actor {
    pub id: ProfileId,
    pub first_name: String,
    pub picture_url: Option<String>,
}

impl Actor {
    fn profile_url(&self) -> String {
        format!("/profile/{}", self.id)
    }
}

/// Kind of content a comment or vote is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Post,
    JobPosting,
}

/// A post or job posting.
#[derive(Debug, Clone)]
pub struct ContentRef {
    pub kind: ContentKind,
    pub id: String,
    pub author_id: ProfileId,
}

impl ContentRef {
    fn comment_url(&self, comment_id: &str) -> String {
        let segment = match self.kind {
            ContentKind::Post => "posts",
            ContentKind::JobPosting => "jobPostings",
        };
        format!("/{segment}/{}/#comment-{comment_id}", self.id)
    }

    fn page_url(&self) -> String {
        match self.kind {
            ContentKind::Post => format!("/posts/{}", self.id),
            ContentKind::JobPosting => format!("/jobs/{}", self.id),
        }
    }
}

// ---------------------------------------------------------------------------
// Comments
// ---------------------------------------------------------------------------

/// A top-level comment was added to a post or job posting.
pub fn new_comment(
    author: &Actor,
    comment_id: &str,
    content: &str,
    target: &ContentRef,
) -> NewNotification {
    NewNotification::new(
        target.author_id.clone(),
        clip(format!("{} commented on your post: {content}", author.first_name)),
    )
    .from_sender(author.id.clone())
    .with_action_url(target.comment_url(comment_id))
    .with_icon_url(author.picture_url.clone())
    .with_icon_action_url(author.profile_url())
}

/// A reply was added under an existing comment.
///
/// Notifies the content author and the author of the parent comment.
pub fn comment_reply(
    author: &Actor,
    comment_id: &str,
    content: &str,
    target: &ContentRef,
    parent_author_id: &str,
) -> Vec<NewNotification> {
    let to_content_author = NewNotification::new(
        target.author_id.clone(),
        clip(format!(
            "{} replied to a comment on your post: {content}",
            author.first_name
        )),
    );
    let to_parent_author = NewNotification::new(
        parent_author_id,
        clip(format!("{} replied to your comment: {content}", author.first_name)),
    );

    [to_content_author, to_parent_author]
        .into_iter()
        .map(|draft| {
            draft
                .from_sender(author.id.clone())
                .with_action_url(target.comment_url(comment_id))
                .with_icon_url(author.picture_url.clone())
                .with_icon_action_url(author.profile_url())
        })
        .collect()
}

/// Someone voted on a comment.
pub fn comment_voted(
    voter_id: &str,
    comment_author: &Actor,
    comment_id: &str,
    content: &str,
    target: &ContentRef,
) -> NewNotification {
    NewNotification::new(
        comment_author.id.clone(),
        clip(format!("Your comment \"{content}\" received a new vote")),
    )
    .from_sender(voter_id)
    .with_action_url(target.comment_url(comment_id))
    .with_icon_url(comment_author.picture_url.clone())
    .with_icon_action_url("/profile")
}

// ---------------------------------------------------------------------------
// Votes on content
// ---------------------------------------------------------------------------

/// Someone voted on a post or job posting.
pub fn content_voted(
    voter_id: &str,
    author: &Actor,
    target: &ContentRef,
    title: &str,
) -> NewNotification {
    let (noun, url) = match target.kind {
        ContentKind::Post => ("post", format!("/posts/{}", target.id)),
        ContentKind::JobPosting => ("job", format!("/job/{}", target.id)),
    };

    NewNotification::new(
        author.id.clone(),
        clip(format!("Your {noun} \"{title}\" received a new vote")),
    )
    .from_sender(voter_id)
    .with_action_url(url)
    .with_icon_url(author.picture_url.clone())
    .with_icon_action_url("/profile")
}

// ---------------------------------------------------------------------------
// Moderation
// ---------------------------------------------------------------------------

/// A comment was removed after a moderation report.
pub fn comment_removed(
    comment_author_id: &str,
    content: &str,
    reason: &str,
    content_author_picture: Option<String>,
) -> NewNotification {
    NewNotification::new(
        comment_author_id,
        clip(format!("Your comment was removed: {reason}.\nComment: {content}")),
    )
    .with_action_url("/profile")
    .with_icon_url(content_author_picture)
}

/// A removed comment was restored by the site admins.
pub fn comment_restored(
    comment_author_id: &str,
    comment_id: &str,
    content: &str,
    target: &ContentRef,
    content_author_picture: Option<String>,
) -> NewNotification {
    NewNotification::new(
        comment_author_id,
        clip(format!(
            "Your comment has been restored after being reviewed by the site admins.\nComment: {content}"
        )),
    )
    .with_action_url(target.comment_url(comment_id))
    .with_icon_url(content_author_picture)
}

/// A post or job posting was removed after a moderation report.
pub fn content_removed(target: &ContentRef, title: &str, reason: &str) -> NewNotification {
    NewNotification::new(
        target.author_id.clone(),
        clip(format!("Your post was removed: {reason}.\nPost: {title}")),
    )
    .with_action_url("/profile")
}

/// A removed post or job posting was restored by the site admins.
pub fn content_restored(target: &ContentRef, title: &str) -> NewNotification {
    let noun = match target.kind {
        ContentKind::Post => "post",
        ContentKind::JobPosting => "job post",
    };

    NewNotification::new(
        target.author_id.clone(),
        clip(format!(
            "Your {noun} has been restored after being reviewed by the site admins, Title: {title}"
        )),
    )
    .with_action_url(target.page_url())
}

// ---------------------------------------------------------------------------
// Jobs and chat
// ---------------------------------------------------------------------------

/// A new job posting matches the profiles of `candidates`.
///
/// The job author is never notified about their own posting.
pub fn job_match(
    job_id: &str,
    job_author_id: &str,
    title: &str,
    candidates: &[ProfileId],
) -> Vec<NewNotification> {
    candidates
        .iter()
        .filter(|candidate| candidate.as_str() != job_author_id)
        .map(|candidate| {
            NewNotification::new(
                candidate.clone(),
                clip(format!(
                    "Check this new job which matches your profile: {title}"
                )),
            )
            .with_action_url(format!("/job/{job_id}"))
        })
        .collect()
}

/// A profile applied to a job posting.
pub fn job_application_submitted(
    applicant: &Actor,
    job_id: &str,
    job_author_id: &str,
    title: &str,
) -> NewNotification {
    NewNotification::new(
        job_author_id,
        clip(format!("{} applied for your job: {title}", applicant.first_name)),
    )
    .from_sender(applicant.id.clone())
    .with_action_url(format!("/job/{job_id}/applications"))
    .with_icon_url(applicant.picture_url.clone())
    .with_icon_action_url(applicant.profile_url())
}

/// A hiring profile sent a job offer to a worker.
pub fn job_offer_created(author: &Actor, worker_id: &str, title: &str) -> NewNotification {
    NewNotification::new(
        worker_id,
        clip(format!("{} wants to hire you: {title}", author.first_name)),
    )
    .from_sender(author.id.clone())
    .with_action_url("/offers")
    .with_icon_url(author.picture_url.clone())
    .with_icon_action_url(author.profile_url())
}

/// A chat message arrived in a job conversation.
pub fn message_received(
    sender: &Actor,
    receiver_id: &str,
    job_id: &str,
    content: &str,
) -> NewNotification {
    NewNotification::new(
        receiver_id,
        clip(format!("{} sent you a message: {content}", sender.first_name)),
    )
    .from_sender(sender.id.clone())
    .with_action_url(format!("/my-jobs/{job_id}"))
    .with_icon_url(sender.picture_url.clone())
    .with_icon_action_url(sender.profile_url())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Clip `text` to the message limit, ending with an ellipsis when shortened.
fn clip(text: String) -> String {
    if text.chars().count() <= MAX_MESSAGE_LEN {
        return text;
    }
    let mut clipped: String = text.chars().take(MAX_MESSAGE_LEN - 1).collect();
    clipped.push('…');
    clipped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
