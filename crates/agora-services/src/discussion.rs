//! # Discussion Service
//!
//! Thread and post orchestration over the `DiscussionRepo` port. Input is
//! sanitized and validated here; the invariants that must hold under
//! concurrent writers (locked threads, same-thread flat replies) are
//! enforced transactionally inside the storage plugin.

use std::sync::Arc;

use base64::Engine;
use chrono::Utc;
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{Post, Thread, ThreadStatus};
use agora_core::traits::DiscussionRepo;

use crate::sanitize::sanitize_text;

/// Byte length of the random share-token material (24 base64url chars).
const SHARE_TOKEN_BYTES: usize = 18;

#[derive(Clone)]
pub struct DiscussionService {
    repo: Arc<dyn DiscussionRepo>,
}

impl DiscussionService {
    pub fn new(repo: Arc<dyn DiscussionRepo>) -> Self {
        Self { repo }
    }

    /// Creates a thread (status=open) together with its opening post in a
    /// single atomic storage operation.
    pub async fn create_thread(
        &self,
        creator: Option<Uuid>,
        title: &str,
        body: &str,
    ) -> Result<(Thread, Post)> {
        let title = sanitize_text(title);
        let body = sanitize_text(body);
        if title.is_empty() || body.is_empty() {
            return Err(AppError::Validation("title and body are required".into()));
        }

        let now = Utc::now();
        let thread = Thread {
            id: Uuid::now_v7(),
            title,
            created_by: creator,
            status: ThreadStatus::Open,
            is_public: false,
            public_token: None,
            created_at: now,
        };
        let post = Post {
            id: Uuid::now_v7(),
            thread_id: thread.id,
            user_id: creator,
            parent_post_id: None,
            content: body,
            is_hidden: false,
            created_at: now,
            updated_at: now,
        };

        self.repo.create_thread(thread.clone(), post.clone()).await?;
        tracing::info!(thread_id = %thread.id, "thread created");
        Ok((thread, post))
    }

    /// Appends a post. The repo rejects writes to locked threads and
    /// replies that cross threads or nest deeper than one level.
    pub async fn append_post(
        &self,
        thread_id: Uuid,
        author: Option<Uuid>,
        parent_post_id: Option<Uuid>,
        content: &str,
    ) -> Result<Post> {
        let content = sanitize_text(content);
        if content.is_empty() {
            return Err(AppError::Validation("content is required".into()));
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::now_v7(),
            thread_id,
            user_id: author,
            parent_post_id,
            content,
            is_hidden: false,
            created_at: now,
            updated_at: now,
        };
        self.repo.append_post(post.clone()).await?;
        Ok(post)
    }

    pub async fn get_thread(&self, id: Uuid) -> Result<Thread> {
        self.repo
            .get_thread(id)
            .await?
            .ok_or_else(|| AppError::NotFound("thread".into(), id.to_string()))
    }

    /// Threads visible in normal listings (status != hidden), newest first.
    pub async fn list_threads(&self) -> Result<Vec<Thread>> {
        self.repo.list_threads().await
    }

    /// Visible posts of a thread in creation order.
    pub async fn visible_posts(&self, thread_id: Uuid) -> Result<Vec<Post>> {
        self.repo.list_posts(thread_id, false).await
    }

    /// All posts including soft-hidden ones, for moderation/audit views.
    pub async fn audit_posts(&self, thread_id: Uuid) -> Result<Vec<Post>> {
        self.repo.list_posts(thread_id, true).await
    }

    pub async fn set_status(&self, thread_id: Uuid, status: ThreadStatus) -> Result<()> {
        self.repo.set_thread_status(thread_id, status).await?;
        tracing::info!(%thread_id, status = %status, "thread status changed");
        Ok(())
    }

    pub async fn hide_post(&self, post_id: Uuid) -> Result<()> {
        self.repo.set_post_hidden(post_id, true).await
    }

    pub async fn unhide_post(&self, post_id: Uuid) -> Result<()> {
        self.repo.set_post_hidden(post_id, false).await
    }

    /// Deletes a thread; storage cascades to its posts and summaries.
    pub async fn delete_thread(&self, thread_id: Uuid) -> Result<()> {
        self.repo.delete_thread(thread_id).await?;
        tracing::info!(%thread_id, "thread deleted");
        Ok(())
    }

    /// Publishes or unpublishes a thread's read-only share link. Returns
    /// the active token when publishing. An existing token is reused so
    /// the share URL stays stable across publish cycles.
    pub async fn set_publish(&self, thread_id: Uuid, public: bool) -> Result<Option<String>> {
        if !public {
            self.repo.set_publish(thread_id, false, None).await?;
            return Ok(None);
        }
        let thread = self.get_thread(thread_id).await?;
        let token = match thread.public_token {
            Some(existing) => {
                self.repo.set_publish(thread_id, true, None).await?;
                existing
            }
            None => {
                let fresh = generate_share_token()?;
                self.repo
                    .set_publish(thread_id, true, Some(fresh.clone()))
                    .await?;
                fresh
            }
        };
        Ok(Some(token))
    }

    /// Read-only lookup of a published thread by its share token.
    pub async fn public_thread(&self, token: &str) -> Result<(Thread, Vec<Post>)> {
        let thread = self
            .repo
            .get_thread_by_token(token)
            .await?
            .ok_or_else(|| AppError::NotFound("thread".into(), token.to_string()))?;
        let posts = self.repo.list_posts(thread.id, false).await?;
        Ok((thread, posts))
    }
}

fn generate_share_token() -> Result<String> {
    let mut buf = [0u8; SHARE_TOKEN_BYTES];
    getrandom::getrandom(&mut buf)
        .map_err(|e| AppError::Internal(format!("token entropy unavailable: {e}")))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(buf))
}
