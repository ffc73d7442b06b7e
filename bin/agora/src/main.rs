//! # Agora Binary
//!
//! The entry point that assembles the application from the compiled-in
//! plugin features.

use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use agora_api::{configure_routes, middleware, AppState};
use agora_services::{DiscussionService, IdentityService, ModerationService, SummaryService};

// Feature-gated imports: swap plugins without touching the wiring below
#[cfg(feature = "db-sqlite")]
use agora_db_sqlite::SqliteStore;

#[cfg(feature = "auth-simple")]
use agora_auth_simple::SimpleAuthProvider;

#[cfg(feature = "ai-openai")]
use agora_ai_openai::OpenAiSummarizer;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let db_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://data/agora.db".into());
    let bind_host = std::env::var("BIND_HOST").unwrap_or_else(|_| "127.0.0.1".into());
    let bind_port: u16 = std::env::var("BIND_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);
    let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    if api_key.is_empty() {
        tracing::warn!("OPENAI_API_KEY is not set; summarization requests will fail");
    }

    // SQLite creates the file but not its directory.
    if let Some(path) = db_url.strip_prefix("sqlite://") {
        if let Some(parent) = std::path::Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
    }

    // 1. Storage implementation (all four repository ports)
    #[cfg(feature = "db-sqlite")]
    let store = Arc::new(SqliteStore::new(&db_url).await?);

    // 2. Credential hashing implementation
    #[cfg(feature = "auth-simple")]
    let auth = Arc::new(SimpleAuthProvider::new());

    // 3. External summarizer implementation
    #[cfg(feature = "ai-openai")]
    let summarizer = Arc::new(OpenAiSummarizer::new(api_key));

    let state = web::Data::new(AppState {
        identity: IdentityService::new(store.clone(), auth),
        discussions: DiscussionService::new(store.clone()),
        summaries: SummaryService::new(store.clone(), summarizer),
        moderation: ModerationService::new(store),
        model,
    });

    tracing::info!(%bind_host, bind_port, "agora starting");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(middleware::standard_middleware())
            .wrap(middleware::cors_policy())
            .configure(configure_routes)
    })
    .bind((bind_host.as_str(), bind_port))?
    .run()
    .await?;

    Ok(())
}
