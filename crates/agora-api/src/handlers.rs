//! # agora-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the domain
//! services. Role-gated operations load the acting user and check
//! `Role::can_moderate`; everything else trusts the ids supplied by the
//! caller (the real authn sits in front of this API).

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use agora_core::models::{
    AiSummary, Post, ReportStatus, Role, SummaryMode, TargetKind, Thread, ThreadStatus,
};

use crate::error::ApiError;
use crate::AppState;

type ApiResult = Result<HttpResponse, ApiError>;

// ── Identity ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub display_name: Option<String>,
    pub password: String,
}

pub async fn signup(data: web::Data<AppState>, body: web::Json<SignupRequest>) -> ApiResult {
    let user = data
        .identity
        .register(&body.email, body.display_name.as_deref(), &body.password)
        .await?;
    Ok(HttpResponse::Created().json(user))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(data: web::Data<AppState>, body: web::Json<LoginRequest>) -> ApiResult {
    let user = data.identity.login(&body.email, &body.password).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[derive(Debug, Deserialize)]
pub struct SetRoleRequest {
    pub acting_user_id: Uuid,
    pub role: Role,
}

pub async fn set_role(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetRoleRequest>,
) -> ApiResult {
    let acting = data.identity.require_moderator(body.acting_user_id).await?;
    data.identity
        .set_role(&acting, path.into_inner(), body.role)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

// ── Threads and posts ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateThreadRequest {
    pub user_id: Option<Uuid>,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Serialize)]
struct ThreadCreated {
    thread: Thread,
    first_post: Post,
}

pub async fn create_thread(
    data: web::Data<AppState>,
    body: web::Json<CreateThreadRequest>,
) -> ApiResult {
    let (thread, first_post) = data
        .discussions
        .create_thread(body.user_id, &body.title, &body.body)
        .await?;
    Ok(HttpResponse::Created().json(ThreadCreated { thread, first_post }))
}

pub async fn list_threads(data: web::Data<AppState>) -> ApiResult {
    Ok(HttpResponse::Ok().json(data.discussions.list_threads().await?))
}

#[derive(Debug, Serialize)]
struct ThreadView {
    thread: Thread,
    posts: Vec<Post>,
    latest_summary: Option<AiSummary>,
}

pub async fn view_thread(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    let id = path.into_inner();
    let thread = data.discussions.get_thread(id).await?;
    let posts = data.discussions.visible_posts(id).await?;
    let latest_summary = data.summaries.latest(id).await?;
    Ok(HttpResponse::Ok().json(ThreadView {
        thread,
        posts,
        latest_summary,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ModeratorAction {
    pub acting_user_id: Uuid,
}

pub async fn delete_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ModeratorAction>,
) -> ApiResult {
    data.identity.require_moderator(body.acting_user_id).await?;
    data.discussions.delete_thread(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct SetStatusRequest {
    pub acting_user_id: Uuid,
    pub status: ThreadStatus,
}

pub async fn set_thread_status(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SetStatusRequest>,
) -> ApiResult {
    data.identity.require_moderator(body.acting_user_id).await?;
    data.discussions
        .set_status(path.into_inner(), body.status)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

#[derive(Debug, Deserialize)]
pub struct PublishRequest {
    pub make_public: bool,
}

pub async fn publish_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PublishRequest>,
) -> ApiResult {
    let token = data
        .discussions
        .set_publish(path.into_inner(), body.make_public)
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "is_public": body.make_public,
        "share_token": token,
    })))
}

#[derive(Debug, Deserialize)]
pub struct AppendPostRequest {
    pub user_id: Option<Uuid>,
    pub parent_post_id: Option<Uuid>,
    pub content: String,
}

pub async fn append_post(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<AppendPostRequest>,
) -> ApiResult {
    let post = data
        .discussions
        .append_post(
            path.into_inner(),
            body.user_id,
            body.parent_post_id,
            &body.content,
        )
        .await?;
    Ok(HttpResponse::Created().json(post))
}

pub async fn hide_post(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ModeratorAction>,
) -> ApiResult {
    data.identity.require_moderator(body.acting_user_id).await?;
    data.discussions.hide_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn unhide_post(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ModeratorAction>,
) -> ApiResult {
    data.identity.require_moderator(body.acting_user_id).await?;
    data.discussions.unhide_post(path.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Read-only share view: resolves the token, never exposes hidden posts.
pub async fn public_thread(data: web::Data<AppState>, path: web::Path<String>) -> ApiResult {
    let (thread, posts) = data.discussions.public_thread(&path.into_inner()).await?;
    let latest_summary = data.summaries.latest(thread.id).await?;
    Ok(HttpResponse::Ok().json(ThreadView {
        thread,
        posts,
        latest_summary,
    }))
}

// ── Summaries ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub mode: Option<SummaryMode>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Fingerprints the thread's current visible posts and returns the cached
/// summary for that state, computing it first if this state has never been
/// summarized.
pub async fn summarize_thread(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<SummarizeRequest>,
) -> ApiResult {
    let id = path.into_inner();
    let mode = body.mode.unwrap_or(SummaryMode::Conversation);
    let model = body.model.as_deref().unwrap_or(&data.model);

    // Ensure the thread exists before summarizing its (possibly empty)
    // post list, so callers get 404 rather than a validation error.
    data.discussions.get_thread(id).await?;
    let posts = data.discussions.visible_posts(id).await?;
    let summary = data
        .summaries
        .summarize_thread(id, mode, model, &posts)
        .await?;
    Ok(HttpResponse::Ok().json(summary))
}

pub async fn list_summaries(data: web::Data<AppState>, path: web::Path<Uuid>) -> ApiResult {
    Ok(HttpResponse::Ok().json(data.summaries.history(path.into_inner()).await?))
}

// ── Moderation ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct FileReportRequest {
    pub target_type: TargetKind,
    pub target_id: Uuid,
    pub reported_by: Uuid,
    #[serde(default)]
    pub reason: String,
}

pub async fn file_report(
    data: web::Data<AppState>,
    body: web::Json<FileReportRequest>,
) -> ApiResult {
    let report = data
        .moderation
        .file_report(body.target_type, body.target_id, body.reported_by, &body.reason)
        .await?;
    Ok(HttpResponse::Created().json(report))
}

#[derive(Debug, Deserialize)]
pub struct ListReportsQuery {
    pub status: Option<ReportStatus>,
}

pub async fn list_reports(
    data: web::Data<AppState>,
    query: web::Query<ListReportsQuery>,
) -> ApiResult {
    Ok(HttpResponse::Ok().json(data.moderation.list_reports(query.status).await?))
}

pub async fn resolve_report(
    data: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<ModeratorAction>,
) -> ApiResult {
    let resolver = data.identity.require_moderator(body.acting_user_id).await?;
    let report = data
        .moderation
        .resolve(path.into_inner(), &resolver)
        .await?;
    Ok(HttpResponse::Ok().json(report))
}
