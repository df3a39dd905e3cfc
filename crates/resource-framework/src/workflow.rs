//! # Review Workflow
//!
//! Moderation operations layered over a [`ResourceController`] for resources that
//! implement [`Reviewable`]. The workflow shares the controller's state, so list,
//! filters and selection stay in one place.
//!
//! Each step follows the controller's mutation policy: `true` on success followed by a
//! refetch, `false` with the failure recorded and notified otherwise. Steps that need
//! text (reject, request unpublish) are validated before any request is made.

use crate::client::ReviewClient;
use crate::controller::ResourceController;
use crate::entity::Reviewable;
use crate::error::Result;
use crate::query::FilterValue;
use crate::review::{authorize, initial_status_for, ReviewAction, ReviewStatus, ReviewStep};
use tracing::{debug, info, instrument};

/// Filter key used by the status tabs.
pub const STATUS_FILTER: &str = "status";

pub struct ReviewWorkflow<T: Reviewable, C: ReviewClient<T>> {
    controller: ResourceController<T, C>,
}

impl<T: Reviewable, C: ReviewClient<T>> Clone for ReviewWorkflow<T, C> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<T, C> ReviewWorkflow<T, C>
where
    T: Reviewable,
    C: ReviewClient<T> + 'static,
{
    pub fn new(controller: ResourceController<T, C>) -> Self {
        Self { controller }
    }

    pub fn controller(&self) -> &ResourceController<T, C> {
        &self.controller
    }

    /// Creates an item with the initial status for the caller's role: admins publish
    /// directly, everyone else starts in draft.
    #[instrument(skip(self, payload), fields(resource = T::ENDPOINT))]
    pub async fn create(&self, mut payload: T::Create) -> bool {
        let status = initial_status_for(self.controller.session.role());
        debug!(%status, "Stamping initial status");
        T::stamp_status(&mut payload, status);
        self.controller.create(payload).await
    }

    pub async fn submit_review(&self, id: &T::Id) -> bool {
        self.run(id, ReviewAction::Submit).await.is_ok()
    }

    pub async fn approve_review(&self, id: &T::Id) -> bool {
        self.run(id, ReviewAction::Approve).await.is_ok()
    }

    /// Approves `ids` one after another, then settles once.
    ///
    /// Returns the approved ids. Failures are reported together after the refetch, with
    /// the first error recorded.
    #[instrument(skip(self, ids), fields(resource = T::ENDPOINT, count = ids.len()))]
    pub async fn approve_all(&self, ids: &[T::Id]) -> Vec<T::Id> {
        let controller = &self.controller;
        let mut approved = Vec::new();
        let mut failed = Vec::new();
        for id in ids {
            let request = controller.client.transition(id, &ReviewAction::Approve);
            match controller.with_loading(request).await {
                Ok(_) => approved.push(id.clone()),
                Err(e) => failed.push(e),
            }
        }

        if !approved.is_empty() {
            controller
                .notifier
                .success(T::ENDPOINT, format!("Approved {} items", approved.len()));
            controller.on_mutation_settled().await;
        }
        if let Some(first) = failed.first() {
            let context = format!("Failed to approve {} of {} items", failed.len(), ids.len());
            controller.record_failure(&context, first);
        }
        info!(approved = approved.len(), failed = failed.len(), "Bulk approval finished");
        approved
    }

    /// A blank comment is refused locally and never reaches the backend.
    pub async fn reject_review(&self, id: &T::Id, comment: &str) -> bool {
        let action = ReviewAction::Reject {
            comment: comment.trim().to_string(),
        };
        self.run(id, action).await.is_ok()
    }

    pub async fn revert_review(&self, id: &T::Id) -> bool {
        self.run(id, ReviewAction::Revert).await.is_ok()
    }

    /// A blank reason is refused locally and never reaches the backend.
    pub async fn request_unpublish(&self, id: &T::Id, reason: &str) -> bool {
        let action = ReviewAction::RequestUnpublish {
            reason: reason.trim().to_string(),
        };
        self.run(id, action).await.is_ok()
    }

    /// Like the named steps, but first checks the caller's capability and the item's
    /// current status. Returns the updated item.
    #[instrument(skip(self, item), fields(resource = T::ENDPOINT, id = %item.id()))]
    pub async fn guarded_transition(&self, item: &T, action: ReviewAction) -> Result<T> {
        let step = action.step();
        let checked = authorize(self.controller.session.as_ref(), item.created_by(), step)
            .and_then(|()| item.status().transition(step));
        if let Err(e) = checked {
            self.controller.record_failure(failure_context(step), &e);
            return Err(e);
        }
        self.run(item.id(), action).await
    }

    /// Switches the status tab. `None` shows every status.
    ///
    /// Returns whether the filter changed.
    pub fn show_status_tab(&self, status: Option<ReviewStatus>) -> bool {
        let value = match status {
            Some(status) => FilterValue::scalar(status.as_str()),
            None => FilterValue::Absent,
        };
        self.controller
            .update_filters([(STATUS_FILTER, value)].into_iter().collect())
    }

    async fn run(&self, id: &T::Id, action: ReviewAction) -> Result<T> {
        let step = action.step();
        if let Err(e) = action.validate() {
            self.controller.record_failure(failure_context(step), &e);
            return Err(e);
        }

        let item = self
            .controller
            .run_mutation(
                failure_context(step),
                step.success_message(),
                self.controller.client.transition(id, &action),
            )
            .await?;
        info!(resource = T::ENDPOINT, %id, %step, status = %item.status(), "Review step applied");
        Ok(item)
    }
}

fn failure_context(step: ReviewStep) -> &'static str {
    match step {
        ReviewStep::Submit => "Failed to submit for review",
        ReviewStep::Approve => "Failed to approve",
        ReviewStep::Reject => "Failed to reject",
        ReviewStep::Revert => "Failed to revert to draft",
        ReviewStep::RequestUnpublish => "Failed to request unpublishing",
    }
}
