//! Pagination state and the server-block merge.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Client-side view of the backend's pagination.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationState {
    pub current_page: u32,
    pub page_size: u32,
    pub total_items: u64,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_prev: bool,
}

impl PaginationState {
    pub fn new(page_size: u32) -> Self {
        Self {
            current_page: 1,
            page_size: page_size.max(1),
            total_items: 0,
            total_pages: 0,
            has_next: false,
            has_prev: false,
        }
    }

    /// Field-wise merge: a field is replaced only when the server sent it.
    pub fn merged_with(&self, server: &ServerPagination) -> Self {
        Self {
            current_page: server.page.map_or(self.current_page, |page| page.max(1)),
            page_size: server.limit.map_or(self.page_size, |limit| limit.max(1)),
            total_items: server.total.unwrap_or(self.total_items),
            total_pages: server.total_pages.unwrap_or(self.total_pages),
            has_next: server.has_next.unwrap_or(self.has_next),
            has_prev: server.has_prev.unwrap_or(self.has_prev),
        }
    }
}

impl Default for PaginationState {
    fn default() -> Self {
        Self::new(10)
    }
}

/// Pagination block of a list response. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerPagination {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
}

/// Applies a server block, keeping the previous `Arc` when nothing changed.
pub fn merge_pagination(
    current: &Arc<PaginationState>,
    server: Option<&ServerPagination>,
) -> Arc<PaginationState> {
    let Some(server) = server else {
        return Arc::clone(current);
    };
    let merged = current.merged_with(server);
    if merged == **current {
        Arc::clone(current)
    } else {
        Arc::new(merged)
    }
}

/// Moves to `page`/`page_size`, keeping the previous `Arc` when both already match.
pub fn with_page(
    current: &Arc<PaginationState>,
    page: u32,
    page_size: u32,
) -> Arc<PaginationState> {
    let page = page.max(1);
    let page_size = page_size.max(1);
    if current.current_page == page && current.page_size == page_size {
        return Arc::clone(current);
    }
    Arc::new(PaginationState {
        current_page: page,
        page_size,
        ..(**current).clone()
    })
}
