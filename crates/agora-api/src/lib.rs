//! # agora-api
//!
//! The web routing and orchestration layer for Agora. Handlers translate
//! JSON requests into service calls; they trust the acting user id they
//! are handed — session management and token verification belong to the
//! external auth collaborator in front of this API.

pub mod error;
pub mod handlers;
pub mod middleware;

use actix_web::web;
use agora_services::{DiscussionService, IdentityService, ModerationService, SummaryService};

/// State shared across all actix-web workers.
pub struct AppState {
    pub identity: IdentityService,
    pub discussions: DiscussionService,
    pub summaries: SummaryService,
    pub moderation: ModerationService,
    /// Default model identifier for summarization requests that do not
    /// name one.
    pub model: String,
}

/// Configures the routes for the discussion archive.
///
/// Scoped configuration so the binary can mount the API under a prefix
/// (e.g., /api/v1/) if needed.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("")
            // Identity
            .route("/signup", web::post().to(handlers::signup))
            .route("/login", web::post().to(handlers::login))
            .route("/users/{id}/role", web::post().to(handlers::set_role))
            // Threads and posts
            .route("/threads", web::post().to(handlers::create_thread))
            .route("/threads", web::get().to(handlers::list_threads))
            .route("/threads/{id}", web::get().to(handlers::view_thread))
            .route("/threads/{id}", web::delete().to(handlers::delete_thread))
            .route("/threads/{id}/status", web::put().to(handlers::set_thread_status))
            .route("/threads/{id}/publish", web::post().to(handlers::publish_thread))
            .route("/threads/{id}/posts", web::post().to(handlers::append_post))
            .route("/posts/{id}/hide", web::post().to(handlers::hide_post))
            .route("/posts/{id}/unhide", web::post().to(handlers::unhide_post))
            // Read-only public share view
            .route("/p/{token}", web::get().to(handlers::public_thread))
            // Summaries
            .route("/threads/{id}/summarize", web::post().to(handlers::summarize_thread))
            .route("/threads/{id}/summaries", web::get().to(handlers::list_summaries))
            // Moderation
            .route("/reports", web::post().to(handlers::file_report))
            .route("/reports", web::get().to(handlers::list_reports))
            .route("/reports/{id}/resolve", web::post().to(handlers::resolve_report)),
    );
}
