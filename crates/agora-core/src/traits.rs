//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.
//! The storage ports are the sole consistency arbiter: invariant checks
//! that must hold under concurrent callers (thread locking, same-thread
//! parents, the summary uniqueness constraint, report check-and-set) live
//! behind these methods, not in the callers.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    AiSummary, Post, Report, ReportStatus, Role, SummaryMode, TargetKind, Thread, ThreadStatus,
    User,
};

/// Persistence contract for user identities.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait UserRepo: Send + Sync {
    /// Fails with `EmailTaken` when the email is already registered.
    async fn create_user(&self, user: User) -> Result<()>;
    async fn get_user(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Fails with `NotFound` when the user does not exist.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<()>;
}

/// Persistence contract for threads and posts.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait DiscussionRepo: Send + Sync {
    /// Atomically creates a thread together with its opening post.
    async fn create_thread(&self, thread: Thread, first_post: Post) -> Result<()>;
    async fn get_thread(&self, id: Uuid) -> Result<Option<Thread>>;
    /// Threads with status != hidden, newest first.
    async fn list_threads(&self) -> Result<Vec<Thread>>;
    /// Cascades to all posts and cached summaries in one transaction.
    async fn delete_thread(&self, id: Uuid) -> Result<()>;
    async fn set_thread_status(&self, id: Uuid, status: ThreadStatus) -> Result<()>;
    /// Updates the share state. `token` replaces the stored token only when
    /// `Some`; unpublishing keeps the old token so a later re-publish
    /// reuses the same URL.
    async fn set_publish(&self, id: Uuid, public: bool, token: Option<String>) -> Result<()>;
    async fn get_thread_by_token(&self, token: &str) -> Result<Option<Thread>>;

    /// Validates and inserts in one transaction. Fails with `ThreadLocked`
    /// when the thread is locked and with `InvalidParent` when the parent
    /// is missing, lives in another thread, or is itself a reply.
    async fn append_post(&self, post: Post) -> Result<()>;
    async fn get_post(&self, id: Uuid) -> Result<Option<Post>>;
    /// Posts of a thread ordered by creation time, backed by the
    /// (thread_id, created_at) index.
    async fn list_posts(&self, thread_id: Uuid, include_hidden: bool) -> Result<Vec<Post>>;
    async fn set_post_hidden(&self, id: Uuid, hidden: bool) -> Result<()>;
}

/// Persistence contract for the content-addressable summary cache.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait SummaryRepo: Send + Sync {
    /// Fails with `DuplicateSummary` when a row for
    /// (thread_id, hash_key) already exists.
    async fn insert_summary(&self, summary: AiSummary) -> Result<()>;
    async fn find_summary(&self, thread_id: Uuid, hash_key: &str) -> Result<Option<AiSummary>>;
    /// All cached rows for a thread, newest first.
    async fn list_summaries(&self, thread_id: Uuid) -> Result<Vec<AiSummary>>;
}

/// Persistence contract for the moderation workflow.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait ModerationRepo: Send + Sync {
    async fn insert_report(&self, report: Report) -> Result<()>;
    async fn get_report(&self, id: Uuid) -> Result<Option<Report>>;
    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>>;
    /// Atomic open→closed check-and-set. Fails with `AlreadyResolved` when
    /// the report is closed and `NotFound` when it does not exist; an
    /// earlier resolution is never overwritten.
    async fn resolve_report(&self, id: Uuid, resolver: Uuid, at: DateTime<Utc>) -> Result<()>;
    /// Per-kind existence lookup backing the polymorphic report target.
    async fn target_exists(&self, kind: TargetKind, id: Uuid) -> Result<bool>;
}

/// The external AI collaborator. Potentially slow, potentially failing;
/// invoked only on a cache miss and never retried by the core.
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, mode: SummaryMode, model: &str, input: &str) -> Result<String>;
}

/// Credential hashing contract.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait AuthProvider: Send + Sync {
    /// Hashes a password for storage; the raw password is never persisted.
    fn hash_password(&self, password: &str) -> Result<String>;
    /// Constant-time verification against a stored hash.
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}
