//! # Review State Machine
//!
//! Moderation status of a reviewable resource and the table of legal transitions:
//!
//! | From                | Step               | To                  |
//! |---------------------|--------------------|---------------------|
//! | draft, rejected     | submit             | pending             |
//! | pending             | approve            | published           |
//! | pending             | reject (comment)   | rejected            |
//! | pending             | revert             | draft               |
//! | published           | request_unpublish  | unpublish_pending   |
//! | unpublish_pending   | revert             | draft               |
//! | unpublish_pending   | approve            | published           |
//!
//! The machine is pure. Who may fire a transition is decided separately by [`authorize`],
//! which the workflow composes in front of it.

use crate::error::{ResourceError, Result};
use crate::session::{Role, Session};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Draft,
    Pending,
    Published,
    Rejected,
    UnpublishPending,
}

impl ReviewStatus {
    pub const ALL: [ReviewStatus; 5] = [
        ReviewStatus::Draft,
        ReviewStatus::Pending,
        ReviewStatus::Published,
        ReviewStatus::Rejected,
        ReviewStatus::UnpublishPending,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewStatus::Draft => "draft",
            ReviewStatus::Pending => "pending",
            ReviewStatus::Published => "published",
            ReviewStatus::Rejected => "rejected",
            ReviewStatus::UnpublishPending => "unpublish_pending",
        }
    }

    /// Target status of `step`, or `None` when the step is illegal from here.
    pub fn next(self, step: ReviewStep) -> Option<ReviewStatus> {
        use ReviewStatus::*;
        use ReviewStep::*;
        match (self, step) {
            (Draft | Rejected, Submit) => Some(Pending),
            (Pending, Approve) => Some(Published),
            // Approver keeps the item online, declining the unpublish request.
            (UnpublishPending, Approve) => Some(Published),
            (Pending, Reject) => Some(Rejected),
            (Pending | UnpublishPending, Revert) => Some(Draft),
            (Published, RequestUnpublish) => Some(UnpublishPending),
            _ => None,
        }
    }

    pub fn can(self, step: ReviewStep) -> bool {
        self.next(step).is_some()
    }

    pub fn transition(self, step: ReviewStep) -> Result<ReviewStatus> {
        self.next(step)
            .ok_or(ResourceError::IllegalTransition { from: self, step })
    }
}

impl fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transition kinds, without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStep {
    Submit,
    Approve,
    Reject,
    Revert,
    RequestUnpublish,
}

impl ReviewStep {
    /// Path segment of the `PATCH <endpoint>/{id}/<segment>` route.
    pub fn path_segment(self) -> &'static str {
        match self {
            ReviewStep::Submit => "submit",
            ReviewStep::Approve => "approve",
            ReviewStep::Reject => "reject",
            ReviewStep::Revert => "revert",
            ReviewStep::RequestUnpublish => "request-unpublish",
        }
    }

    fn verb(self) -> &'static str {
        match self {
            ReviewStep::Submit => "submit",
            ReviewStep::Approve => "approve",
            ReviewStep::Reject => "reject",
            ReviewStep::Revert => "revert",
            ReviewStep::RequestUnpublish => "request unpublishing of",
        }
    }

    /// Notification text after a successful transition.
    pub fn success_message(self) -> &'static str {
        match self {
            ReviewStep::Submit => "Submitted for review",
            ReviewStep::Approve => "Approved",
            ReviewStep::Reject => "Rejected",
            ReviewStep::Revert => "Reverted to draft",
            ReviewStep::RequestUnpublish => "Unpublish request sent",
        }
    }
}

impl fmt::Display for ReviewStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.verb())
    }
}

/// A transition request, with the text some steps require.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewAction {
    Submit,
    Approve,
    Reject { comment: String },
    Revert,
    RequestUnpublish { reason: String },
}

impl ReviewAction {
    pub fn step(&self) -> ReviewStep {
        match self {
            ReviewAction::Submit => ReviewStep::Submit,
            ReviewAction::Approve => ReviewStep::Approve,
            ReviewAction::Reject { .. } => ReviewStep::Reject,
            ReviewAction::Revert => ReviewStep::Revert,
            ReviewAction::RequestUnpublish { .. } => ReviewStep::RequestUnpublish,
        }
    }

    /// Rejects blank comments and reasons before anything is sent.
    pub fn validate(&self) -> Result<()> {
        match self {
            ReviewAction::Reject { comment } if comment.trim().is_empty() => Err(
                ResourceError::InvalidInput("a rejection comment is required".into()),
            ),
            ReviewAction::RequestUnpublish { reason } if reason.trim().is_empty() => Err(
                ResourceError::InvalidInput("an unpublish reason is required".into()),
            ),
            _ => Ok(()),
        }
    }
}

/// Status stamped on newly created items.
pub fn initial_status_for(role: Role) -> ReviewStatus {
    match role {
        Role::Admin => ReviewStatus::Published,
        Role::Reviewer | Role::Editor => ReviewStatus::Draft,
    }
}

/// Capability check for a transition on an item owned by `owner`.
///
/// - submit / request unpublish: the author, or an admin
/// - approve / reject / revert: admins and reviewers
pub fn authorize(session: &dyn Session, owner: Option<&str>, step: ReviewStep) -> Result<()> {
    let role = session.role();
    let is_author = match (session.user_id(), owner) {
        (Some(user), Some(owner)) => user == owner,
        _ => false,
    };
    let allowed = match step {
        ReviewStep::Submit | ReviewStep::RequestUnpublish => is_author || role == Role::Admin,
        ReviewStep::Approve | ReviewStep::Reject | ReviewStep::Revert => {
            matches!(role, Role::Admin | Role::Reviewer)
        }
    };
    if allowed {
        Ok(())
    } else {
        Err(ResourceError::Forbidden(format!(
            "{} may not {} this item",
            role.as_str(),
            step
        )))
    }
}
