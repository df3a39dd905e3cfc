use crate::model::{ChapterId, Level, LevelId, LevelUpdate};
use resource_framework::{
    FilterSet, FilterValue, ReviewClient, ReviewWorkflow, Result, SortDirection,
};
use std::sync::Arc;
use tracing::{debug, instrument};

/// Query parameter scoping levels to one chapter.
pub const CHAPTER_PARAM: &str = "chapter_id";

/// Levels of the game, listed per chapter in play order.
pub struct LevelService<C: ReviewClient<Level>> {
    workflow: ReviewWorkflow<Level, C>,
}

impl<C: ReviewClient<Level>> Clone for LevelService<C> {
    fn clone(&self) -> Self {
        Self {
            workflow: self.workflow.clone(),
        }
    }
}

impl<C: ReviewClient<Level> + 'static> LevelService<C> {
    pub fn new(workflow: ReviewWorkflow<Level, C>) -> Self {
        Self { workflow }
    }

    pub fn workflow(&self) -> &ReviewWorkflow<Level, C> {
        &self.workflow
    }

    /// Loads the levels of `chapter`, sorted by their position.
    #[instrument(skip(self))]
    pub async fn fetch_for_chapter(&self, chapter: ChapterId) -> Result<Arc<Vec<Level>>> {
        let controller = self.workflow.controller();
        controller.update_sorter("order", SortDirection::Ascending);
        let scope = FilterSet::new().with(CHAPTER_PARAM, FilterValue::scalar(chapter.0));
        if controller.update_filters(scope) {
            debug!("Switched chapter scope");
        }
        controller.refresh().await
    }

    /// Moves a level to a new position within its chapter.
    #[instrument(skip(self))]
    pub async fn reorder(&self, id: LevelId, order: u32) -> bool {
        let update = LevelUpdate {
            order: Some(order),
            ..Default::default()
        };
        self.workflow.controller().update(&id, update).await
    }
}
