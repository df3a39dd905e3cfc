use resource_framework::{
    ClientConfig, HttpResourceClient, ImportFile, ImportOutcome, QueryParams, ResourceClient,
    ResourceEntity, ResourceError, ReviewClient, ReviewStatus, Reviewable, Role, Session,
    StaticSession,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

// --- Test Entity ---

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Level {
    id: u32,
    name: String,
    status: ReviewStatus,
    created_by: Option<String>,
}

#[derive(Debug, Serialize)]
struct LevelCreate {
    name: String,
    status: Option<ReviewStatus>,
}

impl ResourceEntity for Level {
    type Id = u32;
    type Create = LevelCreate;
    type Update = LevelCreate;
    const ENDPOINT: &'static str = "levels";

    fn id(&self) -> &u32 {
        &self.id
    }
}

impl Reviewable for Level {
    fn status(&self) -> ReviewStatus {
        self.status
    }

    fn created_by(&self) -> Option<&str> {
        self.created_by.as_deref()
    }

    fn stamp_status(payload: &mut LevelCreate, status: ReviewStatus) {
        payload.status = Some(status);
    }
}

fn level_json(id: u32, status: &str) -> serde_json::Value {
    json!({"id": id, "name": format!("Level {id}"), "status": status, "createdBy": "u-1"})
}

async fn setup() -> (MockServer, Arc<StaticSession>, HttpResourceClient<Level>) {
    let server = MockServer::start().await;
    let session = Arc::new(StaticSession::new("u-1", Role::Editor, "secret"));
    let config = ClientConfig::new(format!("{}/api", server.uri()));
    let client = HttpResourceClient::new(&config, session.clone()).unwrap();
    (server, session, client)
}

#[tokio::test]
async fn list_sends_query_and_token_and_decodes_envelope() {
    let (server, _session, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/levels"))
        .and(query_param("_page", "2"))
        .and(query_param("_limit", "20"))
        .and(query_param("chapter_id", "7"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [level_json(1, "draft"), level_json(2, "published")],
            "pagination": {"page": 2, "limit": 20, "total": 22, "totalPages": 2, "hasNext": false, "hasPrev": true}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = QueryParams::new()
        .with("_page", 2u32)
        .with("_limit", 20u32)
        .with("chapter_id", 7u32);
    let response = client.list(&query).await.unwrap();

    assert_eq!(response.items.len(), 2);
    assert_eq!(response.items[1].status, ReviewStatus::Published);
    let pagination = response.pagination.unwrap();
    assert_eq!(pagination.total, Some(22));
    assert_eq!(pagination.has_prev, Some(true));
}

#[tokio::test]
async fn create_posts_payload() {
    let (server, _session, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/levels"))
        .and(body_json(json!({"name": "Level 3", "status": "draft"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "success": true,
            "data": level_json(3, "draft"),
            "message": "Created"
        })))
        .mount(&server)
        .await;

    let created = client
        .create(&LevelCreate {
            name: "Level 3".into(),
            status: Some(ReviewStatus::Draft),
        })
        .await
        .unwrap();

    assert_eq!(created.id, 3);
}

#[tokio::test]
async fn unauthorized_forces_logout() {
    let (server, session, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/levels/1"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_by_id(&1).await;

    assert_eq!(result, Err(ResourceError::Unauthorized));
    assert!(!session.is_authenticated());
}

#[tokio::test]
async fn validation_errors_are_aggregated() {
    let (server, _session, client) = setup().await;
    Mock::given(method("PUT"))
        .and(path("/api/levels/4"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "success": false,
            "errors": [
                {"field": "name", "message": "is required"},
                {"path": "order", "msg": "must be positive"}
            ]
        })))
        .mount(&server)
        .await;

    let err = client
        .update(
            &4,
            &LevelCreate {
                name: String::new(),
                status: None,
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.user_message(), "name: is required; order: must be positive");
}

#[tokio::test]
async fn status_failures_prefer_body_message() {
    let (server, _session, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/levels/5"))
        .respond_with(
            ResponseTemplate::new(409)
                .set_body_json(json!({"success": false, "message": "Level has quiz questions"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/levels/6"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    assert_eq!(
        client.delete(&5).await,
        Err(ResourceError::Status {
            status: 409,
            message: "Level has quiz questions".into()
        })
    );
    assert_eq!(
        client.delete(&6).await,
        Err(ResourceError::Status {
            status: 404,
            message: "The requested resource was not found".into()
        })
    );
}

#[tokio::test]
async fn delete_accepts_empty_body() {
    let (server, _session, client) = setup().await;
    Mock::given(method("DELETE"))
        .and(path("/api/levels/8"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    assert_eq!(client.delete(&8).await, Ok(()));
}

#[tokio::test]
async fn success_false_envelope_is_a_failure() {
    let (server, _session, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/levels/9"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"success": false, "message": "Level is archived"})),
        )
        .mount(&server)
        .await;

    let err = client.get_by_id(&9).await.unwrap_err();
    assert_eq!(err.user_message(), "Level is archived");
}

#[tokio::test]
async fn export_and_template_return_raw_bytes() {
    let (server, _session, client) = setup().await;
    Mock::given(method("GET"))
        .and(path("/api/levels/export"))
        .and(query_param("format", "xlsx"))
        .and(query_param("_limit", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-export".to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/levels/template"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PK-template".to_vec()))
        .mount(&server)
        .await;

    let query = QueryParams::new().with("format", "xlsx").with("_limit", -1i64);
    assert_eq!(client.export(&query).await.unwrap(), b"PK-export".to_vec());
    assert_eq!(client.download_template().await.unwrap(), b"PK-template".to_vec());
}

#[tokio::test]
async fn import_uploads_multipart_and_reports_partial_rows() {
    let (server, _session, client) = setup().await;
    Mock::given(method("POST"))
        .and(path("/api/levels/import"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": {"importedCount": 9, "errors": ["row 4: unknown chapter"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let result = client
        .import(ImportFile::new("levels.xlsx", b"rows".to_vec()))
        .await
        .unwrap();

    assert_eq!(result.imported_count, 9);
    assert_eq!(result.outcome(), ImportOutcome::Partial { rejected: 1 });
}

#[tokio::test]
async fn reject_patches_with_comment() {
    let (server, _session, client) = setup().await;
    Mock::given(method("PATCH"))
        .and(path("/api/levels/3/reject"))
        .and(body_json(json!({"comment": "dialogue is incomplete"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": level_json(3, "rejected")
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/levels/3/submit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": level_json(3, "pending")
        })))
        .mount(&server)
        .await;

    let rejected = client.reject(&3, "dialogue is incomplete").await.unwrap();
    assert_eq!(rejected.status, ReviewStatus::Rejected);

    let submitted = client.submit(&3).await.unwrap();
    assert_eq!(submitted.status, ReviewStatus::Pending);
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_failure() {
    let session = Arc::new(StaticSession::anonymous());
    // Port 9 (discard) is closed on test hosts.
    let client =
        HttpResourceClient::<Level>::new(&ClientConfig::new("http://127.0.0.1:9/api"), session)
            .unwrap();

    let err = client.list(&QueryParams::new()).await.unwrap_err();

    assert!(matches!(err, ResourceError::Transport(_)));
    assert_eq!(err.user_message(), "Network error, please check your connection");
}
