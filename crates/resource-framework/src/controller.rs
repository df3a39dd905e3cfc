//! # Resource Controller
//!
//! The stateful orchestrator behind every admin table. One controller is bound to one
//! resource type and one [`ResourceClient`]; UI code reads [`ControllerState`] snapshots
//! and calls operations, never the client.
//!
//! ## Failure policy
//!
//! | Operation                                   | On failure                              |
//! |---------------------------------------------|-----------------------------------------|
//! | `fetch_all`, `get_by_id`                    | record + notify, then return `Err`      |
//! | `create`, `update`, `remove`, review steps  | record + notify, return `false`         |
//! | `batch_delete`                              | record + notify, return per-id outcome  |
//! | `export_data`, `download_template`          | record + notify, return `false`         |
//! | `import_data`                               | record + notify, return `None`          |
//!
//! ## Refetch after mutation
//!
//! Successful mutations end in [`ResourceController::on_mutation_settled`]. With
//! auto-refetch on (the default) it reloads the current page; with it off the state is
//! only flagged stale, so a caller running several mutations in a row can reload once.
//!
//! ## Overlapping fetches
//!
//! `loading` is a plain flag and fetches are neither de-duplicated nor cancelled. When two
//! fetches overlap, whichever *completes* last writes the final state, even if it was
//! issued first.

use crate::batch::{self, BatchDeleteOutcome};
use crate::client::ResourceClient;
use crate::config::ControllerConfig;
use crate::entity::ResourceEntity;
use crate::error::{ResourceError, Result};
use crate::notify::Notifier;
use crate::pagination::{merge_pagination, with_page};
use crate::query::{FilterSet, FilterValue, QueryParams, SortDirection, SortSpec};
use crate::session::Session;
use crate::state::ControllerState;
use crate::transfer::{DirectorySink, FileSink};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, instrument, warn};

/// Requested page from a table widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

/// Everything a self-managed table widget reports on change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableChange {
    pub page: Option<PageRequest>,
    pub filters: FilterSet,
    pub sorter: Option<SortSpec>,
}

/// Which parts of the state a table change actually touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableChangeEffect {
    pub pagination: bool,
    pub filters: bool,
    pub sorter: bool,
}

impl TableChangeEffect {
    /// A refetch is implied only when something changed.
    pub fn any(&self) -> bool {
        self.pagination || self.filters || self.sorter
    }
}

fn lock<T: ResourceEntity>(state: &Mutex<ControllerState<T>>) -> MutexGuard<'_, ControllerState<T>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sets `loading` on creation and clears it on drop, including when the owning future
/// is dropped mid-request.
struct LoadingGuard<T: ResourceEntity> {
    state: Arc<Mutex<ControllerState<T>>>,
}

impl<T: ResourceEntity> LoadingGuard<T> {
    fn start(state: &Arc<Mutex<ControllerState<T>>>) -> Self {
        lock(state).loading = true;
        Self {
            state: Arc::clone(state),
        }
    }
}

impl<T: ResourceEntity> Drop for LoadingGuard<T> {
    fn drop(&mut self) {
        lock(&self.state).loading = false;
    }
}

/// Generic list/CRUD controller for one resource type.
///
/// Cheap to clone; clones share state, client and notifier.
pub struct ResourceController<T: ResourceEntity, C: ResourceClient<T>> {
    pub(crate) client: Arc<C>,
    pub(crate) state: Arc<Mutex<ControllerState<T>>>,
    pub(crate) config: Arc<ControllerConfig>,
    pub(crate) notifier: Notifier,
    pub(crate) session: Arc<dyn Session>,
    pub(crate) sink: Arc<dyn FileSink>,
    auto_refetch: Arc<AtomicBool>,
}

impl<T: ResourceEntity, C: ResourceClient<T>> Clone for ResourceController<T, C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            state: Arc::clone(&self.state),
            config: Arc::clone(&self.config),
            notifier: self.notifier.clone(),
            session: Arc::clone(&self.session),
            sink: Arc::clone(&self.sink),
            auto_refetch: Arc::clone(&self.auto_refetch),
        }
    }
}

impl<T, C> ResourceController<T, C>
where
    T: ResourceEntity,
    C: ResourceClient<T> + 'static,
{
    /// Builds a controller. Transport and session are fixed for its whole lifetime.
    pub fn new(client: Arc<C>, session: Arc<dyn Session>, config: ControllerConfig) -> Self {
        let sink: Arc<dyn FileSink> = Arc::new(DirectorySink::new(config.export_dir.clone()));
        Self {
            client,
            state: Arc::new(Mutex::new(ControllerState::new(&config))),
            auto_refetch: Arc::new(AtomicBool::new(config.auto_refetch)),
            config: Arc::new(config),
            notifier: Notifier::default(),
            session,
            sink,
        }
    }

    /// Shares a notifier across controllers.
    pub fn with_notifier(mut self, notifier: Notifier) -> Self {
        self.notifier = notifier;
        self
    }

    /// Replaces where exports and templates are saved.
    pub fn with_sink(mut self, sink: Arc<dyn FileSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Copy of the current state. `Arc` fields are shared, not deep-copied.
    pub fn snapshot(&self) -> ControllerState<T> {
        lock(&self.state).clone()
    }

    pub fn compiled_query(&self) -> QueryParams {
        lock(&self.state).compiled_query()
    }

    /// Runs `f` under the state lock. Never call across an `.await`.
    pub(crate) fn with_state<R>(&self, f: impl FnOnce(&mut ControllerState<T>) -> R) -> R {
        f(&mut lock(&self.state))
    }

    pub(crate) fn record_failure(&self, context: &str, error: &ResourceError) {
        warn!(resource = T::ENDPOINT, error = %error, "{}", context);
        self.with_state(|s| s.error = Some(error.clone()));
        self.notifier
            .error(T::ENDPOINT, format!("{}: {}", context, error.user_message()));
    }

    /// Awaits `request` with `loading` set.
    pub(crate) async fn with_loading<R, F>(&self, request: F) -> R
    where
        F: Future<Output = R>,
    {
        let _loading = LoadingGuard::start(&self.state);
        request.await
    }

    /// Awaits `request` with `loading` set; on success notifies and settles the mutation.
    pub(crate) async fn run_mutation<R, F>(&self, failure: &str, success: &str, request: F) -> Result<R>
    where
        F: Future<Output = Result<R>>,
    {
        match self.with_loading(request).await {
            Ok(value) => {
                self.notifier.success(T::ENDPOINT, success);
                self.on_mutation_settled().await;
                Ok(value)
            }
            Err(e) => {
                self.record_failure(failure, &e);
                Err(e)
            }
        }
    }

    // --- Reads ---

    /// Loads the current page. `extra` params override compiled ones.
    ///
    /// Replaces `items` and merges the server's pagination block. Failures are recorded,
    /// notified and returned.
    #[instrument(skip(self, extra), fields(resource = T::ENDPOINT))]
    pub async fn fetch_all(&self, extra: Option<QueryParams>) -> Result<Arc<Vec<T>>> {
        let _loading = LoadingGuard::start(&self.state);
        let mut query = self.compiled_query();
        if let Some(extra) = extra {
            query.merge(extra);
            query.prune_blank();
        }
        debug!(?query, "Fetching list");

        match self.client.list(&query).await {
            Ok(response) => {
                let items = Arc::new(response.items);
                self.with_state(|s| {
                    s.items = Arc::clone(&items);
                    s.pagination = merge_pagination(&s.pagination, response.pagination.as_ref());
                    s.error = None;
                    s.stale = false;
                });
                info!(count = items.len(), "Fetched");
                Ok(items)
            }
            Err(e) => {
                self.record_failure("Failed to load data", &e);
                Err(e)
            }
        }
    }

    /// Reloads with the current query.
    pub async fn refresh(&self) -> Result<Arc<Vec<T>>> {
        self.fetch_all(None).await
    }

    /// Reads a single item without touching `items`.
    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    pub async fn get_by_id(&self, id: &T::Id) -> Result<T> {
        let _loading = LoadingGuard::start(&self.state);
        match self.client.get_by_id(id).await {
            Ok(item) => Ok(item),
            Err(e) => {
                self.record_failure("Failed to load item", &e);
                Err(e)
            }
        }
    }

    // --- Mutations ---

    #[instrument(skip(self, payload), fields(resource = T::ENDPOINT))]
    pub async fn create(&self, payload: T::Create) -> bool {
        debug!(?payload, "create called");
        self.run_mutation(
            "Failed to create",
            "Created successfully",
            self.client.create(&payload),
        )
        .await
        .is_ok()
    }

    #[instrument(skip(self, payload), fields(resource = T::ENDPOINT))]
    pub async fn update(&self, id: &T::Id, payload: T::Update) -> bool {
        debug!(?payload, "update called");
        self.run_mutation(
            "Failed to update",
            "Updated successfully",
            self.client.update(id, &payload),
        )
        .await
        .is_ok()
    }

    #[instrument(skip(self), fields(resource = T::ENDPOINT))]
    pub async fn remove(&self, id: &T::Id) -> bool {
        self.run_mutation(
            "Failed to delete",
            "Deleted successfully",
            self.client.delete(id),
        )
        .await
        .is_ok()
    }

    /// Deletes `ids` concurrently (bounded by `batch_concurrency`).
    ///
    /// Overall success means every delete succeeded. Succeeded ids leave the selection
    /// and trigger a refetch even when others failed.
    #[instrument(skip(self, ids), fields(resource = T::ENDPOINT, count = ids.len()))]
    pub async fn batch_delete(&self, ids: Vec<T::Id>) -> BatchDeleteOutcome<T::Id> {
        if ids.is_empty() {
            return BatchDeleteOutcome::empty();
        }

        let outcome = {
            let _loading = LoadingGuard::start(&self.state);
            batch::delete_all::<T, C>(Arc::clone(&self.client), ids, self.config.batch_concurrency)
                .await
        };

        self.with_state(|s| {
            if outcome.is_success() {
                s.selected_ids.clear();
            } else {
                for id in &outcome.succeeded {
                    s.selected_ids.remove(id);
                }
            }
        });

        if !outcome.succeeded.is_empty() {
            self.on_mutation_settled().await;
        }

        // After the refetch: a successful fetch clears `error`.
        if outcome.is_success() {
            info!(deleted = outcome.succeeded.len(), "Batch delete complete");
            self.notifier.success(
                T::ENDPOINT,
                format!("Deleted {} items", outcome.succeeded.len()),
            );
        } else if let Some((_, first)) = outcome.failed.first() {
            let context = format!(
                "Failed to delete {} of {} items",
                outcome.failed.len(),
                outcome.total()
            );
            self.record_failure(&context, first);
        }
        outcome
    }

    /// Post-mutation hook: refetch, or mark stale when auto-refetch is off.
    pub async fn on_mutation_settled(&self) {
        if self.auto_refetch.load(Ordering::Relaxed) {
            // Failure is already recorded and notified by fetch_all.
            if let Err(e) = self.fetch_all(None).await {
                debug!(resource = T::ENDPOINT, error = %e, "Refetch after mutation failed");
            }
        } else {
            self.with_state(|s| s.stale = true);
            self.notifier
                .info(T::ENDPOINT, "List is out of date, refresh to see changes");
        }
    }

    pub fn set_auto_refetch(&self, enabled: bool) {
        self.auto_refetch.store(enabled, Ordering::Relaxed);
    }

    pub fn is_stale(&self) -> bool {
        lock(&self.state).stale
    }

    // --- Query state (synchronous, no network) ---

    /// Sets the search term and returns to page 1.
    pub fn search(&self, term: impl Into<String>) {
        let term = term.into();
        self.with_state(|s| {
            s.search_term = term;
            s.pagination = with_page(&s.pagination, 1, s.pagination.page_size);
        });
    }

    /// Merges `partial` into the filters. `Absent` values remove their key.
    ///
    /// Returns false, leaving filters and page untouched, when nothing differs.
    pub fn update_filters(&self, partial: FilterSet) -> bool {
        self.with_state(|s| {
            let changed = partial
                .iter()
                .any(|(key, value)| s.filters.value_of(key) != value);
            if !changed {
                return false;
            }

            let mut next = (*s.filters).clone();
            for (key, value) in partial {
                match value {
                    FilterValue::Absent => {
                        next.remove(&key);
                    }
                    value => next.insert(key, value),
                }
            }
            s.filters = Arc::new(next);
            s.pagination = with_page(&s.pagination, 1, s.pagination.page_size);
            true
        })
    }

    /// Back to the configured initial filters, page 1.
    pub fn clear_filters(&self) {
        let initial = &self.config.initial_filters;
        self.with_state(|s| {
            if *s.filters != *initial {
                s.filters = Arc::new(initial.clone());
            }
            s.pagination = with_page(&s.pagination, 1, s.pagination.page_size);
        });
    }

    pub fn update_sorter(&self, field: impl Into<String>, direction: SortDirection) {
        let sorter = SortSpec::new(field, direction);
        self.with_state(|s| {
            s.sorter = Some(sorter);
            s.pagination = with_page(&s.pagination, 1, s.pagination.page_size);
        });
    }

    pub fn clear_sorter(&self) {
        self.with_state(|s| {
            s.sorter = None;
            s.pagination = with_page(&s.pagination, 1, s.pagination.page_size);
        });
    }

    /// Direct page change; returns false when already there.
    pub fn change_page(&self, page: u32, page_size: u32) -> bool {
        self.with_state(|s| {
            let next = with_page(&s.pagination, page, page_size);
            let changed = !Arc::ptr_eq(&next, &s.pagination);
            s.pagination = next;
            changed
        })
    }

    /// Reconciles state reported by a table widget that manages its own controls.
    ///
    /// Pagination and sorter are replaced only when they differ. Each filter key is
    /// compared by emptiness first: empty→empty is skipped, emptied keys are removed,
    /// and a new filter set is committed only if at least one key changed.
    pub fn handle_table_change(&self, change: TableChange) -> TableChangeEffect {
        self.with_state(|s| {
            let mut effect = TableChangeEffect::default();

            if let Some(page) = change.page {
                let next = with_page(&s.pagination, page.page, page.page_size);
                effect.pagination = !Arc::ptr_eq(&next, &s.pagination);
                s.pagination = next;
            }

            let mut next_filters: Option<FilterSet> = None;
            for (key, value) in change.filters {
                let current = s.filters.value_of(&key);
                let was_empty = current.is_empty();
                let now_empty = value.is_empty();
                if (was_empty && now_empty) || (!now_empty && *current == value) {
                    continue;
                }
                let target = next_filters.get_or_insert_with(|| (*s.filters).clone());
                if now_empty {
                    target.remove(&key);
                } else {
                    target.insert(key, value);
                }
            }
            if let Some(next) = next_filters {
                s.filters = Arc::new(next);
                effect.filters = true;
            }

            if change.sorter != s.sorter {
                s.sorter = change.sorter;
                effect.sorter = true;
            }

            effect
        })
    }

    // --- Selection ---

    pub fn set_selected_ids(&self, ids: impl IntoIterator<Item = T::Id>) {
        let ids = ids.into_iter().collect();
        self.with_state(|s| s.selected_ids = ids);
    }

    /// Flips selection of `id`; returns whether it is now selected.
    pub fn toggle_selected(&self, id: T::Id) -> bool {
        self.with_state(|s| {
            if s.selected_ids.remove(&id) {
                false
            } else {
                s.selected_ids.insert(id);
                true
            }
        })
    }

    pub fn clear_selection(&self) {
        self.with_state(|s| s.selected_ids.clear());
    }

    pub fn selected_ids(&self) -> Vec<T::Id> {
        lock(&self.state).selected_ids.iter().cloned().collect()
    }
}
