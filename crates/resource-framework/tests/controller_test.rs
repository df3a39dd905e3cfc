use resource_framework::mock::{MockCall, MockClient};
use resource_framework::{
    ControllerConfig, ExportOptions, ExportScope, FilterSet, FilterValue, ImportFile,
    ImportResult, ListResponse, MemorySink, NotificationLevel, PageRequest, ParamValue,
    QueryParams, ResourceController, ResourceEntity, ResourceError, Role, ServerPagination,
    SortDirection, SortSpec, StaticSession, TableChange,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq, Deserialize)]
struct Chapter {
    id: u32,
    title: String,
}

#[derive(Debug, Serialize)]
struct ChapterCreate {
    title: String,
}

#[derive(Debug, Serialize)]
struct ChapterUpdate {
    title: Option<String>,
}

impl ResourceEntity for Chapter {
    type Id = u32;
    type Create = ChapterCreate;
    type Update = ChapterUpdate;
    const ENDPOINT: &'static str = "chapters";

    fn id(&self) -> &u32 {
        &self.id
    }
}

fn chapter(id: u32) -> Chapter {
    Chapter {
        id,
        title: format!("Chapter {id}"),
    }
}

type Controller = ResourceController<Chapter, MockClient<Chapter>>;

fn controller_with(mock: &MockClient<Chapter>, config: ControllerConfig) -> Controller {
    let session = Arc::new(StaticSession::new("u-1", Role::Editor, "token"));
    ResourceController::new(Arc::new(mock.clone()), session, config)
        .with_sink(Arc::new(MemorySink::new()))
}

fn controller(mock: &MockClient<Chapter>) -> Controller {
    controller_with(mock, ControllerConfig::default())
}

fn not_found() -> ResourceError {
    ResourceError::Status {
        status: 404,
        message: "The requested resource was not found".into(),
    }
}

fn list_calls(mock: &MockClient<Chapter>) -> usize {
    mock.count_calls(|call| matches!(call, MockCall::List(_)))
}

// --- Fetch ---

#[tokio::test]
async fn server_page_replaces_current_page() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    assert_eq!(controller.snapshot().pagination.current_page, 1);

    mock.expect_list().return_ok(
        ListResponse::new(vec![chapter(31)]).with_pagination(ServerPagination {
            page: Some(4),
            ..Default::default()
        }),
    );
    controller.fetch_all(None).await.unwrap();

    let pagination = controller.snapshot().pagination;
    assert_eq!(pagination.current_page, 4);
    assert_eq!(pagination.page_size, 10);
    // The next fetch asks for the page the server reported.
    assert_eq!(controller.compiled_query().get("_page"), Some(&ParamValue::from(4u32)));
}

#[tokio::test]
async fn fetch_sends_compiled_query_and_merges_pagination() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller_with(&mock, ControllerConfig::default().with_page_size(20));

    controller.update_filters(FilterSet::new().with("name_like", FilterValue::list("name_like", ["temple"])));
    controller.update_sorter("order", SortDirection::Descending);
    controller.change_page(2, 20);

    mock.expect_list().return_ok(
        ListResponse::new(vec![chapter(1), chapter(2)]).with_pagination(ServerPagination {
            page: Some(2),
            total: Some(41),
            total_pages: Some(3),
            ..Default::default()
        }),
    );

    let items = controller.fetch_all(None).await.unwrap();
    assert_eq!(items.len(), 2);

    let expected = QueryParams::new()
        .with("_page", 2u32)
        .with("_limit", 20u32)
        .with("_sort", "order")
        .with("_order", "desc")
        .with("name_like", "temple");
    assert_eq!(mock.calls(), vec![MockCall::List(expected)]);

    let state = controller.snapshot();
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert_eq!(state.pagination.total_items, 41);
    assert_eq!(state.pagination.total_pages, 3);
    // Not sent by the server, so kept.
    assert_eq!(state.pagination.page_size, 20);
    mock.verify();
}

#[tokio::test]
async fn extra_params_override_compiled_ones() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_list().return_ok(ListResponse::new(vec![]));

    let extra = QueryParams::new()
        .with("_limit", 100u32)
        .with("heritage_site_id", 4u32)
        .with("empty", "");
    controller.fetch_all(Some(extra)).await.unwrap();

    let calls = mock.calls();
    let MockCall::List(sent) = &calls[0] else {
        panic!("expected a list call");
    };
    assert_eq!(sent.get("_limit"), Some(&ParamValue::from(100u32)));
    assert_eq!(sent.get("heritage_site_id"), Some(&ParamValue::from(4u32)));
    assert!(!sent.contains_key("empty"));
}

#[tokio::test]
async fn unchanged_server_pagination_keeps_identity() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let block = ServerPagination {
        page: Some(1),
        limit: Some(10),
        total: Some(3),
        total_pages: Some(1),
        has_next: Some(false),
        has_prev: Some(false),
    };
    mock.expect_list()
        .return_ok(ListResponse::new(vec![chapter(1)]).with_pagination(block.clone()));
    mock.expect_list()
        .return_ok(ListResponse::new(vec![chapter(1)]).with_pagination(block));

    controller.fetch_all(None).await.unwrap();
    let first = controller.snapshot().pagination;
    controller.refresh().await.unwrap();
    let second = controller.snapshot().pagination;

    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn fetch_failure_is_recorded_notified_and_returned() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    mock.expect_list()
        .return_err(ResourceError::Transport("connection refused".into()));

    let result = controller.fetch_all(None).await;

    assert!(matches!(result, Err(ResourceError::Transport(_))));
    let state = controller.snapshot();
    assert!(!state.loading);
    assert!(matches!(state.error, Some(ResourceError::Transport(_))));

    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert_eq!(notification.resource, "chapters");
    assert_eq!(
        notification.message,
        "Failed to load data: Network error, please check your connection"
    );
}

#[tokio::test]
async fn successful_fetch_clears_previous_error() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_list().return_err(not_found());
    mock.expect_list().return_ok(ListResponse::new(vec![chapter(1)]));

    assert!(controller.fetch_all(None).await.is_err());
    controller.fetch_all(None).await.unwrap();

    assert_eq!(controller.snapshot().error, None);
}

#[tokio::test]
async fn get_by_id_does_not_touch_items() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_get(7).return_ok(chapter(7));
    mock.expect_get(8).return_err(not_found());

    let item = controller.get_by_id(&7).await.unwrap();
    assert_eq!(item.title, "Chapter 7");
    assert!(controller.snapshot().items.is_empty());

    assert_eq!(controller.get_by_id(&8).await, Err(not_found()));
    assert_eq!(controller.snapshot().error, Some(not_found()));
}

#[tokio::test]
async fn dropped_fetch_still_clears_loading() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_list()
        .delay(Duration::from_millis(200))
        .return_ok(ListResponse::new(vec![]));

    let result = tokio::time::timeout(Duration::from_millis(20), controller.fetch_all(None)).await;

    assert!(result.is_err());
    assert!(!controller.snapshot().loading);
}

/// Two overlapping fetches: the one that completes last wins, even though it was
/// issued first.
#[tokio::test]
async fn overlapping_fetches_apply_in_completion_order() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_list()
        .delay(Duration::from_millis(80))
        .return_ok(ListResponse::new(vec![chapter(1)]));
    mock.expect_list()
        .return_ok(ListResponse::new(vec![chapter(2)]));

    let slow = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.fetch_all(None).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    controller.fetch_all(None).await.unwrap();
    assert_eq!(controller.snapshot().items[0].id, 2);

    slow.await.unwrap().unwrap();
    assert_eq!(controller.snapshot().items[0].id, 1);
}

// --- Mutations ---

#[tokio::test]
async fn create_success_refetches() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    mock.expect_create().return_ok(chapter(3));
    mock.expect_list().return_ok(ListResponse::new(vec![chapter(3)]));

    let created = controller
        .create(ChapterCreate {
            title: "Chapter 3".into(),
        })
        .await;

    assert!(created);
    assert_eq!(list_calls(&mock), 1);
    assert_eq!(controller.snapshot().items.len(), 1);
    assert_eq!(notifications.try_recv().unwrap().message, "Created successfully");
    mock.verify();
}

#[tokio::test]
async fn failed_mutations_soft_fail_without_refetch() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_update(1).return_err(ResourceError::Validation {
        errors: vec![resource_framework::FieldError::new("title", "is required")],
    });
    mock.expect_delete(2).return_err(not_found());

    let updated = controller
        .update(&1, ChapterUpdate { title: None })
        .await;
    assert!(!updated);
    assert!(matches!(
        controller.snapshot().error,
        Some(ResourceError::Validation { .. })
    ));

    assert!(!controller.remove(&2).await);
    assert_eq!(controller.snapshot().error, Some(not_found()));
    assert_eq!(list_calls(&mock), 0);
}

#[tokio::test]
async fn disabled_auto_refetch_marks_state_stale() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    controller.set_auto_refetch(false);
    mock.expect_delete(1).return_ok(());
    mock.expect_delete(2).return_ok(());

    assert!(controller.remove(&1).await);
    assert!(controller.remove(&2).await);
    assert!(controller.is_stale());
    assert_eq!(list_calls(&mock), 0);

    assert_eq!(notifications.try_recv().unwrap().level, NotificationLevel::Success);
    let stale = notifications.try_recv().unwrap();
    assert_eq!(stale.level, NotificationLevel::Info);
    assert_eq!(stale.message, "List is out of date, refresh to see changes");

    mock.expect_list().return_ok(ListResponse::new(vec![]));
    controller.refresh().await.unwrap();
    assert!(!controller.is_stale());
}

// --- Batch delete ---

#[tokio::test]
async fn batch_delete_reports_partial_failure_per_id() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    controller.set_selected_ids([1, 2, 3]);
    mock.expect_delete(1).return_ok(());
    mock.expect_delete(2).return_err(not_found());
    mock.expect_delete(3).return_ok(());
    mock.expect_list().return_ok(ListResponse::new(vec![chapter(2)]));

    let outcome = controller.batch_delete(vec![1, 2, 3]).await;

    assert!(!outcome.is_success());
    assert_eq!(outcome.succeeded, vec![1, 3]);
    assert_eq!(outcome.failed, vec![(2, not_found())]);

    let state = controller.snapshot();
    assert_eq!(state.selected_ids, HashSet::from([2]));
    // The refetch succeeded, yet the batch failure stays recorded.
    assert_eq!(state.error, Some(not_found()));
    assert!(!state.loading);
    // One refetch for the deletes that did go through.
    assert_eq!(list_calls(&mock), 1);
    let note = notifications.try_recv().unwrap();
    assert_eq!(note.level, NotificationLevel::Error);
    assert!(note.message.starts_with("Failed to delete 1 of 3 items"));
    mock.verify();
}

#[tokio::test]
async fn batch_delete_success_clears_selection() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    controller.set_selected_ids([4, 5]);
    mock.expect_delete(4).return_ok(());
    mock.expect_delete(5).return_ok(());
    mock.expect_list().return_ok(ListResponse::new(vec![]));

    let outcome = controller.batch_delete(vec![4, 5]).await;

    assert!(outcome.is_success());
    assert!(controller.snapshot().selected_ids.is_empty());
    assert_eq!(notifications.try_recv().unwrap().message, "Deleted 2 items");
}

#[tokio::test]
async fn batch_delete_is_bounded_by_concurrency() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller_with(&mock, ControllerConfig::default().with_batch_concurrency(2));
    controller.set_auto_refetch(false);
    for id in 1..=4 {
        mock.expect_delete(id)
            .delay(Duration::from_millis(60))
            .return_ok(());
    }

    let started = Instant::now();
    let outcome = controller.batch_delete(vec![1, 2, 3, 4]).await;

    assert!(outcome.is_success());
    // Four deletes, two at a time: at least two rounds.
    assert!(started.elapsed() >= Duration::from_millis(120));
}

#[tokio::test]
async fn empty_batch_delete_is_a_no_op() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);

    let outcome = controller.batch_delete(Vec::new()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.total(), 0);
    assert!(mock.calls().is_empty());
}

// --- Query state ---

#[tokio::test]
async fn identical_filter_update_bails_out() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let published = FilterSet::new().with("status", FilterValue::scalar("published"));

    assert!(controller.update_filters(published.clone()));
    controller.change_page(3, 10);
    let before = controller.snapshot();

    assert!(!controller.update_filters(published));

    let after = controller.snapshot();
    assert!(Arc::ptr_eq(&before.filters, &after.filters));
    assert!(Arc::ptr_eq(&before.pagination, &after.pagination));
    assert_eq!(after.pagination.current_page, 3);
}

#[tokio::test]
async fn changed_filters_reset_page_and_absent_removes_key() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    controller.update_filters(FilterSet::new().with("status", FilterValue::scalar("draft")));
    controller.change_page(4, 10);

    assert!(controller.update_filters(
        FilterSet::new()
            .with("status", FilterValue::Absent)
            .with("tags", FilterValue::list("tags", ["a", "b"])),
    ));

    let state = controller.snapshot();
    assert_eq!(state.pagination.current_page, 1);
    assert_eq!(state.filters.get("status"), None);
    assert_eq!(
        controller.compiled_query().get("tags_in"),
        Some(&ParamValue::from("a,b"))
    );
}

#[tokio::test]
async fn clear_filters_restores_initial_filters() {
    let mock = MockClient::<Chapter>::new();
    let initial = FilterSet::new().with("status", FilterValue::scalar("published"));
    let controller = controller_with(
        &mock,
        ControllerConfig::default().with_initial_filters(initial.clone()),
    );
    controller.update_filters(FilterSet::new().with("status", FilterValue::scalar("draft")));
    controller.change_page(2, 10);

    controller.clear_filters();

    let state = controller.snapshot();
    assert_eq!(*state.filters, initial);
    assert_eq!(state.pagination.current_page, 1);
}

#[tokio::test]
async fn search_and_sorter_reset_page() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    controller.change_page(5, 10);
    controller.search("bronze");
    assert_eq!(controller.snapshot().pagination.current_page, 1);

    controller.change_page(5, 10);
    controller.update_sorter("title", SortDirection::Ascending);
    let query = controller.compiled_query();
    assert_eq!(query.get("_page"), Some(&ParamValue::from(1u32)));
    assert_eq!(query.get("_order"), Some(&ParamValue::from("asc")));
    assert_eq!(query.get("q"), Some(&ParamValue::from("bronze")));

    controller.clear_sorter();
    assert!(!controller.compiled_query().contains_key("_sort"));
}

#[tokio::test]
async fn table_change_commits_only_real_differences() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let before = controller.snapshot();

    // Same page, an empty list for a key that was never set, no sorter.
    let effect = controller.handle_table_change(TableChange {
        page: Some(PageRequest {
            page: 1,
            page_size: 10,
        }),
        filters: FilterSet::new().with("tags", FilterValue::Set(vec![])),
        sorter: None,
    });
    assert!(!effect.any());
    let after = controller.snapshot();
    assert!(Arc::ptr_eq(&before.filters, &after.filters));
    assert!(Arc::ptr_eq(&before.pagination, &after.pagination));

    let effect = controller.handle_table_change(TableChange {
        page: Some(PageRequest {
            page: 2,
            page_size: 10,
        }),
        filters: FilterSet::new().with("status", FilterValue::scalar("pending")),
        sorter: Some(SortSpec::new("title", SortDirection::Descending)),
    });
    assert!(effect.pagination && effect.filters && effect.sorter);

    // Emptying a key deletes it.
    let effect = controller.handle_table_change(TableChange {
        page: Some(PageRequest {
            page: 2,
            page_size: 10,
        }),
        filters: FilterSet::new().with("status", FilterValue::Absent),
        sorter: Some(SortSpec::new("title", SortDirection::Descending)),
    });
    assert_eq!(
        effect,
        resource_framework::TableChangeEffect {
            pagination: false,
            filters: true,
            sorter: false,
        }
    );
    assert!(controller.snapshot().filters.is_empty());
}

#[tokio::test]
async fn selection_toggles() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);

    assert!(controller.toggle_selected(1));
    assert!(controller.toggle_selected(2));
    assert!(!controller.toggle_selected(1));
    assert_eq!(controller.selected_ids(), vec![2]);

    controller.clear_selection();
    assert!(controller.selected_ids().is_empty());
}

// --- Import / export ---

#[tokio::test]
async fn export_all_strips_paging() {
    let mock = MockClient::<Chapter>::new();
    let sink = Arc::new(MemorySink::new());
    let controller = controller(&mock).with_sink(sink.clone());
    controller.update_filters(FilterSet::new().with("status", FilterValue::scalar("published")));
    controller.change_page(3, 10);
    mock.expect_export().return_ok(b"xlsx-bytes".to_vec());

    let options = ExportOptions::from("xlsx").with_scope(ExportScope::All);
    assert!(controller.export_data(options, &[]).await);

    let expected = QueryParams::new()
        .with("status", "published")
        .with("format", "xlsx")
        .with("_limit", -1i64);
    assert_eq!(mock.calls(), vec![MockCall::Export(expected)]);

    let files = sink.file_names();
    assert_eq!(files.len(), 1);
    assert!(files[0].starts_with("chapters_") && files[0].ends_with(".xlsx"));
    assert_eq!(sink.contents(&files[0]), Some(b"xlsx-bytes".to_vec()));
}

#[tokio::test]
async fn export_selected_ids_ignores_filters() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    controller.update_filters(FilterSet::new().with("status", FilterValue::scalar("published")));
    mock.expect_export().return_ok(Vec::new());

    assert!(controller.export_data("xlsx", &[5, 9, 12]).await);

    let expected = QueryParams::new()
        .with("id_in", "5,9,12")
        .with("format", "xlsx");
    assert_eq!(mock.calls(), vec![MockCall::Export(expected)]);
}

#[tokio::test]
async fn export_failure_returns_false() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_export().return_err(ResourceError::Status {
        status: 500,
        message: "Server error, please try again later".into(),
    });

    assert!(!controller.export_data(ExportOptions::default(), &[]).await);
    assert_eq!(controller.snapshot().error.and_then(|e| e.status()), Some(500));
}

#[tokio::test]
async fn partial_import_warns_and_refetches() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    let mut notifications = controller.notifier().subscribe();
    let body: ImportResult = serde_json::from_str(
        r#"{"importedCount": 4, "errors": [{"row": 2, "error": "duplicate title"}]}"#,
    )
    .unwrap();
    mock.expect_import().return_ok(body);
    mock.expect_list().return_ok(ListResponse::new(vec![]));

    let result = controller
        .import_data(ImportFile::new("chapters.xlsx", b"data".to_vec()))
        .await
        .unwrap();

    assert_eq!(result.imported_count, 4);
    assert_eq!(result.errors.len(), 1);
    let notification = notifications.try_recv().unwrap();
    assert_eq!(notification.level, NotificationLevel::Warning);
    assert_eq!(notification.message, "Imported 4 rows, 1 rows rejected");
    assert_eq!(list_calls(&mock), 1);
}

#[tokio::test]
async fn failed_import_returns_none() {
    let mock = MockClient::<Chapter>::new();
    let controller = controller(&mock);
    mock.expect_import()
        .return_err(ResourceError::Transport("reset".into()));

    let result = controller
        .import_data(ImportFile::new("chapters.xlsx", Vec::new()))
        .await;

    assert!(result.is_none());
    assert_eq!(list_calls(&mock), 0);
}

#[tokio::test]
async fn template_download_saves_without_state_change() {
    let mock = MockClient::<Chapter>::new();
    let sink = Arc::new(MemorySink::new());
    let controller = controller(&mock).with_sink(sink.clone());
    mock.expect_template().return_ok(b"template".to_vec());

    assert!(controller.download_template().await);
    assert_eq!(sink.file_names(), vec!["chapters_template.xlsx".to_string()]);
    assert_eq!(list_calls(&mock), 0);
}
