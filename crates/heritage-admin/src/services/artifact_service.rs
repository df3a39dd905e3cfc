use crate::model::{Artifact, ArtifactId, HeritageSiteId};
use resource_framework::{
    FilterSet, FilterValue, ReviewClient, ReviewStatus, ReviewWorkflow, Result,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Query parameter scoping artifacts to one heritage site.
pub const SITE_PARAM: &str = "heritage_site_id";

/// Artifact listing and moderation.
pub struct ArtifactService<C: ReviewClient<Artifact>> {
    workflow: ReviewWorkflow<Artifact, C>,
}

impl<C: ReviewClient<Artifact>> Clone for ArtifactService<C> {
    fn clone(&self) -> Self {
        Self {
            workflow: self.workflow.clone(),
        }
    }
}

impl<C: ReviewClient<Artifact> + 'static> ArtifactService<C> {
    pub fn new(workflow: ReviewWorkflow<Artifact, C>) -> Self {
        Self { workflow }
    }

    pub fn workflow(&self) -> &ReviewWorkflow<Artifact, C> {
        &self.workflow
    }

    /// Loads artifacts belonging to `site`.
    ///
    /// The site is kept as a filter, so refetches after mutations stay scoped to it.
    #[instrument(skip(self))]
    pub async fn fetch_for_site(&self, site: HeritageSiteId) -> Result<Arc<Vec<Artifact>>> {
        let controller = self.workflow.controller();
        let scope = FilterSet::new().with(SITE_PARAM, FilterValue::scalar(site.0));
        if controller.update_filters(scope) {
            debug!("Switched site scope");
        }
        controller.refresh().await
    }

    /// Switches to the pending tab and loads the review queue.
    #[instrument(skip(self))]
    pub async fn review_queue(&self) -> Result<Arc<Vec<Artifact>>> {
        self.workflow.show_status_tab(Some(ReviewStatus::Pending));
        self.workflow.controller().refresh().await
    }

    /// Approves every selected artifact with a single refetch at the end.
    ///
    /// Returns how many were approved. Approved ids leave the selection; failures stay
    /// selected so they can be retried.
    #[instrument(skip(self))]
    pub async fn approve_selected(&self) -> usize {
        let controller = self.workflow.controller();
        let selected: Vec<ArtifactId> = controller.selected_ids();
        let approved = self.workflow.approve_all(&selected).await;
        let remaining = selected.into_iter().filter(|id| !approved.contains(id));
        controller.set_selected_ids(remaining);
        approved.len()
    }
}
