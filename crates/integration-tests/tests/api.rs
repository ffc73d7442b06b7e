//! HTTP-level tests: the full actix service wired to the real SQLite store
//! and Argon2 hashing, with the summarizer stubbed out.

use std::sync::Arc;

use actix_web::{test, web, App};
use serde_json::{json, Value};

use agora_api::{configure_routes, AppState};
use agora_auth_simple::SimpleAuthProvider;
use agora_core::models::Role;
use agora_db_sqlite::SqliteStore;
use agora_services::{DiscussionService, IdentityService, ModerationService, SummaryService};
use integration_tests::{seed_user, StubSummarizer};

async fn state() -> (Arc<SqliteStore>, web::Data<AppState>) {
    let store = Arc::new(SqliteStore::in_memory().await.expect("in-memory store"));
    let auth = Arc::new(SimpleAuthProvider::new());
    let summarizer = Arc::new(StubSummarizer::new());
    let data = web::Data::new(AppState {
        identity: IdentityService::new(store.clone(), auth),
        discussions: DiscussionService::new(store.clone()),
        summaries: SummaryService::new(store.clone(), summarizer),
        moderation: ModerationService::new(store.clone()),
        model: "stub-model".into(),
    });
    (store, data)
}

#[actix_web::test]
async fn signup_login_and_duplicate_email() {
    let (_store, data) = state().await;
    let app =
        test::init_service(App::new().app_data(data).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({"email": "Ada@Example.com", "password": "hunter2"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let user: Value = test::read_body_json(resp).await;
    assert_eq!(user["email"], "ada@example.com");
    assert!(user.get("password_hash").is_none());

    // Same email again, case-folded, collides.
    let req = test::TestRequest::post()
        .uri("/signup")
        .set_json(json!({"email": "ada@example.com", "password": "other"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"email": "ada@example.com", "password": "hunter2"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 200);

    let req = test::TestRequest::post()
        .uri("/login")
        .set_json(json!({"email": "ada@example.com", "password": "wrong"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);
}

#[actix_web::test]
async fn thread_posting_locking_and_role_gate() {
    let (store, data) = state().await;
    let user = seed_user(&store, "user@example.com", Role::User).await;
    let moderator = seed_user(&store, "mod@example.com", Role::Mod).await;
    let app =
        test::init_service(App::new().app_data(data).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/threads")
        .set_json(json!({"user_id": user.id, "title": "Topic", "body": "Opening"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let created: Value = test::read_body_json(resp).await;
    let thread_id = created["thread"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/threads/{thread_id}/posts"))
        .set_json(json!({"user_id": user.id, "content": "A reply"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 201);

    // A plain user cannot lock.
    let req = test::TestRequest::put()
        .uri(&format!("/threads/{thread_id}/status"))
        .set_json(json!({"acting_user_id": user.id, "status": "locked"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 403);

    let req = test::TestRequest::put()
        .uri(&format!("/threads/{thread_id}/status"))
        .set_json(json!({"acting_user_id": moderator.id, "status": "locked"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 204);

    let req = test::TestRequest::post()
        .uri(&format!("/threads/{thread_id}/posts"))
        .set_json(json!({"user_id": user.id, "content": "too late"}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::get()
        .uri(&format!("/threads/{thread_id}"))
        .to_request();
    let view: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(view["thread"]["status"], "locked");
    assert_eq!(view["posts"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn summarize_endpoint_caches_per_state() {
    let (store, data) = state().await;
    let user = seed_user(&store, "user@example.com", Role::User).await;
    let app =
        test::init_service(App::new().app_data(data).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/threads")
        .set_json(json!({"user_id": user.id, "title": "Topic", "body": "Opening"}))
        .to_request();
    let created: Value = test::call_and_read_body_json(&app, req).await;
    let thread_id = created["thread"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/threads/{thread_id}/summarize"))
        .set_json(json!({}))
        .to_request();
    let first: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["mode"], "conversation");
    assert_eq!(first["model"], "stub-model");

    let req = test::TestRequest::post()
        .uri(&format!("/threads/{thread_id}/summarize"))
        .set_json(json!({}))
        .to_request();
    let second: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(first["id"], second["id"]);

    let req = test::TestRequest::get()
        .uri(&format!("/threads/{thread_id}/summaries"))
        .to_request();
    let history: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(history.as_array().unwrap().len(), 1);

    // Unknown thread gives 404, not a validation error.
    let req = test::TestRequest::post()
        .uri(&format!("/threads/{}/summarize", uuid::Uuid::now_v7()))
        .set_json(json!({}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 404);
}

#[actix_web::test]
async fn report_flow_over_http() {
    let (store, data) = state().await;
    let reporter = seed_user(&store, "reporter@example.com", Role::User).await;
    let moderator = seed_user(&store, "mod@example.com", Role::Mod).await;
    let app =
        test::init_service(App::new().app_data(data).configure(configure_routes)).await;

    let req = test::TestRequest::post()
        .uri("/reports")
        .set_json(json!({
            "target_type": "user",
            "target_id": reporter.id,
            "reported_by": reporter.id,
            "reason": "spam",
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let report: Value = test::read_body_json(resp).await;
    let report_id = report["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::post()
        .uri(&format!("/reports/{report_id}/resolve"))
        .set_json(json!({"acting_user_id": moderator.id}))
        .to_request();
    let resolved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resolved["status"], "closed");
    assert_eq!(resolved["resolved_by"], json!(moderator.id));

    let req = test::TestRequest::post()
        .uri(&format!("/reports/{report_id}/resolve"))
        .set_json(json!({"acting_user_id": moderator.id}))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), 409);

    let req = test::TestRequest::get().uri("/reports?status=open").to_request();
    let open: Value = test::call_and_read_body_json(&app, req).await;
    assert!(open.as_array().unwrap().is_empty());
}
