//! Summary-cache semantics against the real SQLite store: fingerprint
//! stability, invalidation on new posts, compute-once under concurrency,
//! and failure leaving no residue.

use std::sync::Arc;
use std::time::Duration;

use agora_core::error::AppError;
use agora_core::models::SummaryMode;
use agora_core::traits::SummaryRepo;
use agora_services::{fingerprint, DiscussionService, SummaryService};
use integration_tests::{store, StubSummarizer};

#[tokio::test]
async fn unchanged_thread_state_reuses_the_cached_row() {
    let store = store().await;
    let discussions = DiscussionService::new(store.clone());
    let stub = Arc::new(StubSummarizer::new());
    let summaries = SummaryService::new(store.clone(), stub.clone());

    let (thread, _) = discussions.create_thread(None, "t", "p1").await.unwrap();
    discussions
        .append_post(thread.id, None, None, "p2")
        .await
        .unwrap();
    let posts = discussions.visible_posts(thread.id).await.unwrap();

    let first = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &posts)
        .await
        .unwrap();
    let second = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &posts)
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(stub.call_count(), 1);
    assert_eq!(summaries.history(thread.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn a_new_post_invalidates_without_evicting_the_old_summary() {
    let store = store().await;
    let discussions = DiscussionService::new(store.clone());
    let stub = Arc::new(StubSummarizer::new());
    let summaries = SummaryService::new(store.clone(), stub.clone());

    let (thread, _) = discussions.create_thread(None, "t", "p1").await.unwrap();
    discussions
        .append_post(thread.id, None, None, "p2")
        .await
        .unwrap();
    let before = discussions.visible_posts(thread.id).await.unwrap();
    let old = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &before)
        .await
        .unwrap();

    discussions
        .append_post(thread.id, None, None, "p3")
        .await
        .unwrap();
    let after = discussions.visible_posts(thread.id).await.unwrap();
    let new = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &after)
        .await
        .unwrap();

    assert_ne!(old.hash_key, new.hash_key);
    assert_eq!(stub.call_count(), 2);

    // The superseded row stays addressable under the old fingerprint.
    let old_key = fingerprint(SummaryMode::Conversation, "m", ["p1", "p2"]);
    let kept = store
        .find_summary(thread.id, &old_key)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(kept.id, old.id);
    assert_eq!(summaries.history(thread.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn modes_and_models_cache_independently() {
    let store = store().await;
    let discussions = DiscussionService::new(store.clone());
    let summaries = SummaryService::new(store.clone(), Arc::new(StubSummarizer::new()));

    let (thread, _) = discussions.create_thread(None, "t", "p1").await.unwrap();
    let posts = discussions.visible_posts(thread.id).await.unwrap();

    let conv = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &posts)
        .await
        .unwrap();
    let analysis = summaries
        .summarize_thread(thread.id, SummaryMode::Analysis, "m", &posts)
        .await
        .unwrap();

    assert_ne!(conv.hash_key, analysis.hash_key);
    assert_eq!(summaries.history(thread.id).await.unwrap().len(), 2);
    assert_eq!(summaries.latest(thread.id).await.unwrap().unwrap().id, analysis.id);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn racing_callers_produce_exactly_one_row() {
    let store = store().await;
    let discussions = DiscussionService::new(store.clone());
    // Slow enough that every task sees a cache miss before the first insert.
    let stub = Arc::new(StubSummarizer::with_delay(Duration::from_millis(50)));
    let summaries = SummaryService::new(store.clone(), stub.clone());

    let (thread, _) = discussions.create_thread(None, "t", "p1").await.unwrap();
    let posts = discussions.visible_posts(thread.id).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = summaries.clone();
        let posts = posts.clone();
        let thread_id = thread.id;
        handles.push(tokio::spawn(async move {
            svc.summarize_thread(thread_id, SummaryMode::Conversation, "m", &posts)
                .await
        }));
    }

    let mut rows = Vec::new();
    for handle in handles {
        rows.push(handle.await.unwrap().unwrap());
    }

    // Every caller converged on the winner's row.
    let winner = &rows[0];
    assert!(rows.iter().all(|r| r.id == winner.id));
    assert_eq!(summaries.history(thread.id).await.unwrap().len(), 1);
    assert!(stub.call_count() >= 1);
}

#[tokio::test]
async fn summarizer_failure_leaves_no_row_and_a_retry_succeeds() {
    let store = store().await;
    let discussions = DiscussionService::new(store.clone());
    let stub = Arc::new(StubSummarizer::new());
    let summaries = SummaryService::new(store.clone(), stub.clone());

    let (thread, _) = discussions.create_thread(None, "t", "p1").await.unwrap();
    let posts = discussions.visible_posts(thread.id).await.unwrap();

    stub.fail_next.store(true, std::sync::atomic::Ordering::SeqCst);
    let err = summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &posts)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::SummarizerFailed(_)));
    assert!(summaries.history(thread.id).await.unwrap().is_empty());

    // Same fingerprint, clean retry.
    summaries
        .summarize_thread(thread.id, SummaryMode::Conversation, "m", &posts)
        .await
        .unwrap();
    assert_eq!(summaries.history(thread.id).await.unwrap().len(), 1);
}
