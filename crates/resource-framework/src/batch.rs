//! Bounded scatter-gather for batch deletes.
//!
//! Every delete runs as its own task; a semaphore caps how many are in flight at once.
//! There is no rollback. Deletes that succeeded stay deleted even when others fail.

use crate::client::ResourceClient;
use crate::entity::ResourceEntity;
use crate::error::ResourceError;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Per-id result of a batch delete.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchDeleteOutcome<Id> {
    pub succeeded: Vec<Id>,
    pub failed: Vec<(Id, ResourceError)>,
}

impl<Id> BatchDeleteOutcome<Id> {
    pub fn empty() -> Self {
        Self {
            succeeded: Vec::new(),
            failed: Vec::new(),
        }
    }

    /// True only when no delete failed.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }
}

/// Deletes every id through `client`, at most `limit` at a time.
///
/// Results are reported in input order.
pub async fn delete_all<T, C>(
    client: Arc<C>,
    ids: Vec<T::Id>,
    limit: usize,
) -> BatchDeleteOutcome<T::Id>
where
    T: ResourceEntity,
    C: ResourceClient<T> + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit.max(1)));
    let mut handles = Vec::with_capacity(ids.len());

    for id in ids {
        let client = Arc::clone(&client);
        let semaphore = Arc::clone(&semaphore);
        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .map_err(|_| ResourceError::Transport("batch delete pool closed".into()))?;
            debug!(resource = T::ENDPOINT, id = %task_id, "Deleting");
            client.delete(&task_id).await
        });
        handles.push((id, handle));
    }

    let mut outcome = BatchDeleteOutcome::empty();
    for (id, handle) in handles {
        match handle.await {
            Ok(Ok(())) => outcome.succeeded.push(id),
            Ok(Err(e)) => {
                warn!(resource = T::ENDPOINT, %id, error = %e, "Delete failed");
                outcome.failed.push((id, e));
            }
            Err(join_error) => {
                warn!(resource = T::ENDPOINT, %id, error = %join_error, "Delete task aborted");
                outcome
                    .failed
                    .push((id, ResourceError::Transport(join_error.to_string())));
            }
        }
    }
    outcome
}
