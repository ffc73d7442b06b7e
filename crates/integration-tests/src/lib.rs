//! Shared fixtures for the cross-crate tests: an in-memory store builder,
//! user seeding that skips the (slow) Argon2 hash, and a controllable
//! `Summarizer` stub.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{Role, SummaryMode, User};
use agora_core::traits::{Summarizer, UserRepo};
use agora_db_sqlite::SqliteStore;

pub async fn store() -> Arc<SqliteStore> {
    Arc::new(SqliteStore::in_memory().await.expect("in-memory store"))
}

/// Inserts a user directly through the repo port with a dummy credential
/// hash; tests that exercise real hashing go through `IdentityService`.
pub async fn seed_user(store: &Arc<SqliteStore>, email: &str, role: Role) -> User {
    let user = User {
        id: Uuid::now_v7(),
        email: email.into(),
        password_hash: "seeded".into(),
        display_name: None,
        avatar_url: None,
        role,
        created_at: Utc::now(),
    };
    store.create_user(user.clone()).await.expect("seed user");
    user
}

/// Deterministic summarizer stand-in. Output is a pure function of the
/// input, invocations are counted, and a single failure or per-call delay
/// can be injected to exercise retry and race paths.
pub struct StubSummarizer {
    pub calls: AtomicUsize,
    pub fail_next: AtomicBool,
    delay: Duration,
}

impl StubSummarizer {
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    /// A slow summarizer: widens the window in which concurrent callers
    /// all see a cache miss.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_next: AtomicBool::new(false),
            delay,
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, mode: SummaryMode, model: &str, input: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(AppError::SummarizerFailed("stub outage".into()));
        }
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(format!("{mode} summary by {model}: {input}"))
    }
}
