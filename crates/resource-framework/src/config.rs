//! Controller and transport configuration.

use crate::query::FilterSet;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Per-resource controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Initial `_limit`.
    pub page_size: u32,
    /// Filters the controller starts with and returns to on `clear_filters`.
    pub initial_filters: FilterSet,
    /// Upper bound on in-flight deletes during a batch delete.
    pub batch_concurrency: usize,
    /// Refetch after successful mutations. When off, mutations mark the state stale.
    pub auto_refetch: bool,
    /// Where exports and templates are written.
    pub export_dir: PathBuf,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            page_size: 10,
            initial_filters: FilterSet::new(),
            batch_concurrency: 4,
            auto_refetch: true,
            export_dir: PathBuf::from("."),
        }
    }
}

impl ControllerConfig {
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_initial_filters(mut self, filters: FilterSet) -> Self {
        self.initial_filters = filters;
        self
    }

    pub fn with_batch_concurrency(mut self, limit: usize) -> Self {
        self.batch_concurrency = limit.max(1);
        self
    }

    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = dir.into();
        self
    }
}

/// HTTP transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:3000/api`.
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout_secs: 30,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}
