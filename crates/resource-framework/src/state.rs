//! Controller state.
//!
//! `items`, `pagination` and `filters` sit behind `Arc`s so that a no-op update can hand
//! back the previous allocation; callers compare with [`Arc::ptr_eq`] to skip work.

use crate::config::ControllerConfig;
use crate::entity::ResourceEntity;
use crate::error::ResourceError;
use crate::pagination::PaginationState;
use crate::query::{self, FilterSet, QueryInput, QueryParams, SortSpec};
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ControllerState<T: ResourceEntity> {
    pub items: Arc<Vec<T>>,
    pub loading: bool,
    /// Last recorded failure.
    pub error: Option<ResourceError>,
    pub pagination: Arc<PaginationState>,
    pub filters: Arc<FilterSet>,
    pub sorter: Option<SortSpec>,
    pub search_term: String,
    pub selected_ids: HashSet<T::Id>,
    /// A mutation settled while auto-refetch was off.
    pub stale: bool,
}

impl<T: ResourceEntity> ControllerState<T> {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            items: Arc::new(Vec::new()),
            loading: false,
            error: None,
            pagination: Arc::new(PaginationState::new(config.page_size)),
            filters: Arc::new(config.initial_filters.clone()),
            sorter: None,
            search_term: String::new(),
            selected_ids: HashSet::new(),
            stale: false,
        }
    }

    pub fn query_input(&self) -> QueryInput<'_> {
        QueryInput {
            page: self.pagination.current_page,
            page_size: self.pagination.page_size,
            filters: &self.filters,
            sorter: self.sorter.as_ref(),
            search_term: &self.search_term,
        }
    }

    /// The query the next `fetch_all` would send.
    pub fn compiled_query(&self) -> QueryParams {
        query::compile(self.query_input())
    }
}
