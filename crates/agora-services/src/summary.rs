//! # Summary Cache
//!
//! Content-addressable caching of AI-generated thread summaries. The cache
//! key is a SHA-256 fingerprint over the summarizable input; the storage
//! layer's UNIQUE(thread_id, hash_key) constraint is the only concurrency
//! mechanism — no lock is ever held across the (slow, unbounded)
//! summarizer call.

use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{AiSummary, Post, SummaryMode};
use agora_core::traits::{SummaryRepo, Summarizer};

/// Derives the cache key for a thread's current summarizable state.
///
/// Pure and deterministic: the same mode, model, and ordered contents
/// always yield the same key. Each content chunk is length-prefixed before
/// hashing so concatenation ambiguity cannot make two different inputs
/// collide.
pub fn fingerprint<'a, I>(mode: SummaryMode, model: &str, contents: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let mut hasher = Sha256::new();
    hasher.update(mode.as_str().as_bytes());
    hasher.update([0u8]);
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    for content in contents {
        hasher.update((content.len() as u64).to_le_bytes());
        hasher.update(content.as_bytes());
    }
    hex::encode(hasher.finalize())
}

#[derive(Clone)]
pub struct SummaryService {
    summaries: Arc<dyn SummaryRepo>,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryService {
    pub fn new(summaries: Arc<dyn SummaryRepo>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            summaries,
            summarizer,
        }
    }

    /// Summarizes the current state of a thread, reusing the cached row
    /// when the fingerprint is unchanged. Hidden posts never contribute to
    /// the fingerprint or the summarizer input.
    pub async fn summarize_thread(
        &self,
        thread_id: Uuid,
        mode: SummaryMode,
        model: &str,
        posts: &[Post],
    ) -> Result<AiSummary> {
        let contents: Vec<&str> = posts
            .iter()
            .filter(|p| !p.is_hidden)
            .map(|p| p.content.as_str())
            .collect();
        if contents.is_empty() {
            return Err(AppError::Validation(
                "thread has no visible posts to summarize".into(),
            ));
        }
        let hash_key = fingerprint(mode, model, contents.iter().copied());
        let input = contents.join("\n\n");
        self.get_or_compute(thread_id, mode, model, hash_key, &input)
            .await
    }

    /// Cache lookup with compute-on-miss. On a hit the stored row is
    /// returned unchanged and the summarizer is not invoked. On a miss the
    /// summarizer runs once and the result is inserted; a losing concurrent
    /// writer observes `DuplicateSummary` and falls back to re-reading the
    /// winner's row, so N racing callers still produce exactly one row.
    /// A summarizer failure writes nothing: retrying with the same
    /// fingerprint is idempotent.
    pub async fn get_or_compute(
        &self,
        thread_id: Uuid,
        mode: SummaryMode,
        model: &str,
        hash_key: String,
        input: &str,
    ) -> Result<AiSummary> {
        if let Some(hit) = self.summaries.find_summary(thread_id, &hash_key).await? {
            tracing::debug!(%thread_id, hash_key = %hit.hash_key, "summary cache hit");
            return Ok(hit);
        }

        let content = self.summarizer.summarize(mode, model, input).await?;

        let summary = AiSummary {
            id: Uuid::now_v7(),
            thread_id,
            model: model.to_string(),
            mode,
            content,
            hash_key: hash_key.clone(),
            created_at: Utc::now(),
        };

        match self.summaries.insert_summary(summary.clone()).await {
            Ok(()) => {
                tracing::info!(%thread_id, %hash_key, "summary cached");
                Ok(summary)
            }
            // Lost the race against a concurrent caller with the same
            // fingerprint: the winner's row is authoritative.
            Err(AppError::DuplicateSummary) => {
                tracing::debug!(%thread_id, %hash_key, "lost summary insert race, re-reading");
                self.summaries
                    .find_summary(thread_id, &hash_key)
                    .await?
                    .ok_or_else(|| {
                        AppError::Internal(
                            "summary vanished between duplicate insert and re-read".into(),
                        )
                    })
            }
            Err(other) => Err(other),
        }
    }

    /// Historical summaries of a thread, newest first.
    pub async fn history(&self, thread_id: Uuid) -> Result<Vec<AiSummary>> {
        self.summaries.list_summaries(thread_id).await
    }

    /// The most recently cached summary for a thread, if any.
    pub async fn latest(&self, thread_id: Uuid) -> Result<Option<AiSummary>> {
        Ok(self.summaries.list_summaries(thread_id).await?.into_iter().next())
    }
}
