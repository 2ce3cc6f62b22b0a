/// Integration tests for the Driftboard API
///
/// Verify the store service end-to-end against live backing services:
/// - Authentication enforcement on task/board routes
/// - Task lifecycle (create → list → move → delete)
/// - Board projection over HTTP
/// - Validation error shapes
///
/// All tests require running PostgreSQL and Redis instances (DATABASE_URL,
/// REDIS_URL, JWT_SECRET) and are ignored by default.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use common::TestContext;
use serde_json::json;
use tower::Service as _;
use uuid::Uuid;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_authentication_required() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_board_starts_empty() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("GET")
        .uri("/v1/board")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let board = body_json(response).await;
    let columns = board["columns"].as_array().unwrap();
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0]["id"], "todo");
    assert_eq!(columns[0]["title"], "To Do");
    assert_eq!(columns[1]["id"], "in-progress");
    assert_eq!(columns[2]["id"], "done");
    for column in columns {
        assert!(column["tasks"].as_array().unwrap().is_empty());
    }

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_task_lifecycle() {
    let ctx = TestContext::new().await.unwrap();
    let task_id = Uuid::new_v4();

    // Create with a client-generated id.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "id": task_id,
                "title": "Write spec",
                "status": "todo",
                "columnId": "todo",
                "priority": "high"
            })
            .to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["id"], task_id.to_string());
    assert_eq!(created["status"], "todo");
    assert_eq!(created["columnId"], "todo");

    // The board shows it in the todo column exactly once.
    let request = Request::builder()
        .method("GET")
        .uri("/v1/board")
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let board = body_json(ctx.app.clone().call(request).await.unwrap()).await;
    assert_eq!(board["columns"][0]["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(board["columns"][0]["tasks"][0]["id"], task_id.to_string());

    // Drag semantics: a patch with only columnId moves status with it.
    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "columnId": "done" }).to_string()))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["status"], "done");
    assert_eq!(updated["columnId"], "done");

    // Delete.
    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", ctx.auth_header())
        .body(Body::empty())
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_create_validation_error_shape() {
    let ctx = TestContext::new().await.unwrap();

    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "id": Uuid::new_v4(), "title": "" }).to_string(),
        ))
        .unwrap();

    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = body_json(response).await;
    assert_eq!(body["error"], "validation_error");
    assert!(body["details"].as_array().unwrap().iter().any(|d| d["field"] == "title"));

    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_tasks_are_owner_scoped() {
    let alice = TestContext::new().await.unwrap();
    let bob = TestContext::new().await.unwrap();

    // Alice creates a task.
    let task_id = Uuid::new_v4();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", alice.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "id": task_id, "title": "Alice's task" }).to_string(),
        ))
        .unwrap();
    let response = alice.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    // Bob cannot see or touch it.
    let request = Request::builder()
        .method("GET")
        .uri("/v1/tasks")
        .header("authorization", bob.auth_header())
        .body(Body::empty())
        .unwrap();
    let tasks = body_json(bob.app.clone().call(request).await.unwrap()).await;
    assert!(tasks.as_array().unwrap().is_empty());

    let request = Request::builder()
        .method("PATCH")
        .uri(format!("/v1/tasks/{}", task_id))
        .header("authorization", bob.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(json!({ "columnId": "done" }).to_string()))
        .unwrap();
    let response = bob.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    alice.cleanup().await.unwrap();
    bob.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_live_store_sees_api_mutations() {
    use driftboard_client::store::{LiveStore, TaskStore as _};

    let ctx = TestContext::new().await.unwrap();

    // A client-side live subscription over the same backing services.
    let store = LiveStore::new(ctx.db.clone(), ctx.redis.clone());
    let mut sub = store.subscribe(ctx.user.id).await;
    let board = sub.recv().await.unwrap().unwrap();
    assert_eq!(board.task_count(), 0);

    // Mutate through the HTTP API; the subscription must deliver a fresh
    // full snapshot driven by the published change notification.
    let task_id = Uuid::new_v4();
    let request = Request::builder()
        .method("POST")
        .uri("/v1/tasks")
        .header("authorization", ctx.auth_header())
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "id": task_id, "title": "Synced task", "status": "in-progress" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let board = tokio::time::timeout(std::time::Duration::from_secs(10), sub.recv())
        .await
        .expect("snapshot should arrive promptly")
        .unwrap()
        .unwrap();
    assert_eq!(board.columns[1].tasks.len(), 1);
    assert_eq!(board.columns[1].tasks[0].id, task_id);

    sub.dispose();
    ctx.cleanup().await.unwrap();
}

#[tokio::test]
#[ignore] // Requires running PostgreSQL and Redis instances
async fn test_register_login_refresh_flow() {
    let ctx = TestContext::new().await.unwrap();
    let email = format!("flow-{}@example.com", Uuid::new_v4());

    // Register.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/register")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "password1", "display_name": "Flow" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let registered = body_json(response).await;
    assert!(registered["access_token"].is_string());

    // Login with the same credentials.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "password1" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let logged_in = body_json(response).await;

    // Wrong password is rejected.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/login")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "email": email, "password": "password2" }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Refresh yields a fresh access token.
    let request = Request::builder()
        .method("POST")
        .uri("/v1/auth/refresh")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "refresh_token": logged_in["refresh_token"] }).to_string(),
        ))
        .unwrap();
    let response = ctx.app.clone().call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let refreshed = body_json(response).await;
    assert!(refreshed["access_token"].is_string());

    ctx.cleanup().await.unwrap();
}
