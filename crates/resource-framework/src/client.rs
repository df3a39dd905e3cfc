//! # ResourceClient Trait
//!
//! The transport boundary the controller depends on. Implementations talk to the backend
//! (see [`HttpResourceClient`](crate::http::HttpResourceClient)) or fake it in memory
//! (see [`MockClient`](crate::mock::MockClient)); the controller cannot tell the difference.
//!
//! Batch deletion is intentionally absent: the backend has no atomic batch route, so the
//! controller coordinates N independent [`ResourceClient::delete`] calls itself.

use crate::entity::{ResourceEntity, Reviewable};
use crate::error::Result;
use crate::pagination::ServerPagination;
use crate::query::QueryParams;
use crate::review::ReviewAction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One page of a list call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub pagination: Option<ServerPagination>,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            items,
            pagination: None,
        }
    }

    pub fn with_pagination(mut self, pagination: ServerPagination) -> Self {
        self.pagination = Some(pagination);
        self
    }
}

/// A file picked for upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImportFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// A row the backend refused during import.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RowErrorRepr")]
pub struct ImportRowError {
    pub row: Option<u64>,
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RowErrorRepr {
    Message(String),
    Detailed {
        #[serde(default)]
        row: Option<u64>,
        #[serde(alias = "error")]
        message: String,
    },
}

impl From<RowErrorRepr> for ImportRowError {
    fn from(repr: RowErrorRepr) -> Self {
        match repr {
            RowErrorRepr::Message(message) => Self { row: None, message },
            RowErrorRepr::Detailed { row, message } => Self { row, message },
        }
    }
}

/// Body of a successful import response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResult {
    #[serde(default)]
    pub imported_count: u64,
    #[serde(default)]
    pub errors: Vec<ImportRowError>,
}

/// Whether an accepted import took every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportOutcome {
    Complete,
    /// The envelope said success but some rows were rejected.
    Partial { rejected: usize },
}

impl ImportResult {
    pub fn outcome(&self) -> ImportOutcome {
        if self.errors.is_empty() {
            ImportOutcome::Complete
        } else {
            ImportOutcome::Partial {
                rejected: self.errors.len(),
            }
        }
    }
}

/// CRUD + search + import/export surface of one resource endpoint.
#[async_trait]
pub trait ResourceClient<T: ResourceEntity>: Send + Sync {
    async fn list(&self, query: &QueryParams) -> Result<ListResponse<T>>;

    async fn get_by_id(&self, id: &T::Id) -> Result<T>;

    async fn create(&self, payload: &T::Create) -> Result<T>;

    async fn update(&self, id: &T::Id, payload: &T::Update) -> Result<T>;

    async fn delete(&self, id: &T::Id) -> Result<()>;

    /// Binary export of the rows selected by `query` (which carries `format`).
    async fn export(&self, query: &QueryParams) -> Result<Vec<u8>>;

    async fn import(&self, file: ImportFile) -> Result<ImportResult>;

    async fn download_template(&self) -> Result<Vec<u8>>;
}

/// Moderation transitions for reviewable resources.
///
/// Implementors provide [`ReviewClient::transition`]; the named steps are built on it.
#[async_trait]
pub trait ReviewClient<T: Reviewable>: ResourceClient<T> {
    async fn transition(&self, id: &T::Id, action: &ReviewAction) -> Result<T>;

    #[tracing::instrument(skip(self))]
    async fn submit(&self, id: &T::Id) -> Result<T> {
        self.transition(id, &ReviewAction::Submit).await
    }

    #[tracing::instrument(skip(self))]
    async fn approve(&self, id: &T::Id) -> Result<T> {
        self.transition(id, &ReviewAction::Approve).await
    }

    #[tracing::instrument(skip(self))]
    async fn reject(&self, id: &T::Id, comment: &str) -> Result<T> {
        let action = ReviewAction::Reject {
            comment: comment.to_string(),
        };
        self.transition(id, &action).await
    }

    #[tracing::instrument(skip(self))]
    async fn revert_to_draft(&self, id: &T::Id) -> Result<T> {
        self.transition(id, &ReviewAction::Revert).await
    }

    #[tracing::instrument(skip(self))]
    async fn request_unpublish(&self, id: &T::Id, reason: &str) -> Result<T> {
        let action = ReviewAction::RequestUnpublish {
            reason: reason.to_string(),
        };
        self.transition(id, &action).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn import_errors_decode_in_both_shapes() {
        let result: ImportResult = serde_json::from_str(
            r#"{"importedCount": 8, "errors": ["row 3: duplicate", {"row": 5, "error": "missing name"}]}"#,
        )
        .unwrap();

        assert_eq!(result.imported_count, 8);
        assert_eq!(result.errors[1].row, Some(5));
        assert_eq!(result.outcome(), ImportOutcome::Partial { rejected: 2 });
    }

    #[test]
    fn clean_import_is_complete() {
        let result: ImportResult = serde_json::from_str(r#"{"importedCount": 3}"#).unwrap();
        assert_eq!(result.outcome(), ImportOutcome::Complete);
    }
}
