//! # agora-db-sqlite
//!
//! SQLite implementation of the `agora-core` repository ports, mapping the
//! relational model to the domain models. This plugin is the consistency
//! arbiter: thread locking and reply validation run inside the insert
//! transaction, summary uniqueness is the UNIQUE(thread_id, hash_key)
//! index, report resolution is a conditional UPDATE, and thread deletion
//! cascades through `ON DELETE CASCADE` with foreign keys enabled on every
//! connection.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{
    AiSummary, Post, Report, ReportStatus, Role, TargetKind, Thread, ThreadStatus, User,
};
use agora_core::traits::{DiscussionRepo, ModerationRepo, SummaryRepo, UserRepo};

/// Schema statements run on startup. `IF NOT EXISTS` keeps them idempotent
/// so a restart against an existing database is a no-op.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS users (
        id            BLOB PRIMARY KEY,
        email         TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        display_name  TEXT,
        avatar_url    TEXT,
        role          TEXT NOT NULL DEFAULT 'user',
        created_at    TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS threads (
        id           BLOB PRIMARY KEY,
        title        TEXT NOT NULL,
        created_by   BLOB REFERENCES users(id),
        status       TEXT NOT NULL DEFAULT 'open',
        is_public    INTEGER NOT NULL DEFAULT 0,
        public_token TEXT,
        created_at   TEXT NOT NULL
    )",
    "CREATE TABLE IF NOT EXISTS posts (
        id             BLOB PRIMARY KEY,
        thread_id      BLOB NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
        user_id        BLOB REFERENCES users(id),
        parent_post_id BLOB REFERENCES posts(id),
        content        TEXT NOT NULL,
        is_hidden      INTEGER NOT NULL DEFAULT 0,
        created_at     TEXT NOT NULL,
        updated_at     TEXT NOT NULL
    )",
    // The read path for a thread is always (thread_id, created_at) order.
    "CREATE INDEX IF NOT EXISTS idx_posts_thread_time ON posts(thread_id, created_at)",
    "CREATE TABLE IF NOT EXISTS ai_summaries (
        id         BLOB PRIMARY KEY,
        thread_id  BLOB NOT NULL REFERENCES threads(id) ON DELETE CASCADE,
        model      TEXT NOT NULL,
        mode       TEXT NOT NULL,
        content    TEXT NOT NULL,
        hash_key   TEXT NOT NULL,
        created_at TEXT NOT NULL
    )",
    // At most one cached summary per distinct input state of a thread.
    "CREATE UNIQUE INDEX IF NOT EXISTS uq_ai_summaries_thread_hash
        ON ai_summaries(thread_id, hash_key)",
    "CREATE TABLE IF NOT EXISTS reports (
        id          BLOB PRIMARY KEY,
        target_type TEXT NOT NULL,
        target_id   BLOB NOT NULL,
        reported_by BLOB NOT NULL REFERENCES users(id),
        reason      TEXT NOT NULL,
        status      TEXT NOT NULL DEFAULT 'open',
        created_at  TEXT NOT NULL,
        resolved_by BLOB REFERENCES users(id),
        resolved_at TEXT
    )",
];

pub struct SqliteStore {
    pool: SqlitePool,
}

// Helpers for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn opt_blob(id: Option<Uuid>) -> Option<Vec<u8>> {
    id.map(uuid_to_blob)
}

fn opt_uuid(blob: Option<Vec<u8>>) -> Option<Uuid> {
    blob.map(|b| blob_to_uuid(&b))
}

fn db_err(err: sqlx::Error) -> AppError {
    AppError::Internal(format!("database error: {err}"))
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation
    )
}

impl SqliteStore {
    /// Opens (creating if missing) the database at `url` and applies the
    /// schema. Foreign keys are switched on for every pooled connection —
    /// SQLite defaults them off, and the thread cascade depends on them.
    pub async fn new(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(opts)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// An in-memory store for tests. A single pooled connection keeps the
    /// in-memory database alive for the store's whole lifetime.
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(db_err)?
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new()
            .min_connections(1)
            .max_connections(1)
            .connect_with(opts)
            .await
            .map_err(db_err)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for stmt in SCHEMA {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        tracing::debug!("sqlite schema ready");
        Ok(())
    }
}

fn map_user(row: &SqliteRow) -> Result<User> {
    Ok(User {
        id: blob_to_uuid(&row.get::<Vec<u8>, _>("id")),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        display_name: row.get("display_name"),
        avatar_url: row.get("avatar_url"),
        role: row.get::<String, _>("role").parse()?,
        created_at: row.get("created_at"),
    })
}

fn map_thread(row: &SqliteRow) -> Result<Thread> {
    Ok(Thread {
        id: blob_to_uuid(&row.get::<Vec<u8>, _>("id")),
        title: row.get("title"),
        created_by: opt_uuid(row.get("created_by")),
        status: row.get::<String, _>("status").parse()?,
        is_public: row.get("is_public"),
        public_token: row.get("public_token"),
        created_at: row.get("created_at"),
    })
}

fn map_post(row: &SqliteRow) -> Result<Post> {
    Ok(Post {
        id: blob_to_uuid(&row.get::<Vec<u8>, _>("id")),
        thread_id: blob_to_uuid(&row.get::<Vec<u8>, _>("thread_id")),
        user_id: opt_uuid(row.get("user_id")),
        parent_post_id: opt_uuid(row.get("parent_post_id")),
        content: row.get("content"),
        is_hidden: row.get("is_hidden"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn map_summary(row: &SqliteRow) -> Result<AiSummary> {
    Ok(AiSummary {
        id: blob_to_uuid(&row.get::<Vec<u8>, _>("id")),
        thread_id: blob_to_uuid(&row.get::<Vec<u8>, _>("thread_id")),
        model: row.get("model"),
        mode: row.get::<String, _>("mode").parse()?,
        content: row.get("content"),
        hash_key: row.get("hash_key"),
        created_at: row.get("created_at"),
    })
}

fn map_report(row: &SqliteRow) -> Result<Report> {
    Ok(Report {
        id: blob_to_uuid(&row.get::<Vec<u8>, _>("id")),
        target_type: row.get::<String, _>("target_type").parse()?,
        target_id: blob_to_uuid(&row.get::<Vec<u8>, _>("target_id")),
        reported_by: blob_to_uuid(&row.get::<Vec<u8>, _>("reported_by")),
        reason: row.get("reason"),
        status: row.get::<String, _>("status").parse()?,
        created_at: row.get("created_at"),
        resolved_by: opt_uuid(row.get("resolved_by")),
        resolved_at: row.get::<Option<DateTime<Utc>>, _>("resolved_at"),
    })
}

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: User) -> Result<()> {
        let res = sqlx::query(
            "INSERT INTO users (id, email, password_hash, display_name, avatar_url, role, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(user.id))
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.display_name)
        .bind(&user.avatar_url)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AppError::EmailTaken(user.email)),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_user(&row))
            .transpose()
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_user(&row))
            .transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<()> {
        let res = sqlx::query("UPDATE users SET role = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("user".into(), id.to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl DiscussionRepo for SqliteStore {
    /// Atomic operation to create a thread and its opening post. The
    /// transaction prevents "ghost threads" with no first post if the
    /// second insert fails.
    async fn create_thread(&self, thread: Thread, first_post: Post) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        sqlx::query(
            "INSERT INTO threads (id, title, created_by, status, is_public, public_token, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(thread.id))
        .bind(&thread.title)
        .bind(opt_blob(thread.created_by))
        .bind(thread.status.as_str())
        .bind(thread.is_public)
        .bind(&thread.public_token)
        .bind(thread.created_at)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        insert_post(&mut tx, &first_post).await?;

        tx.commit().await.map_err(db_err)
    }

    async fn get_thread(&self, id: Uuid) -> Result<Option<Thread>> {
        sqlx::query("SELECT * FROM threads WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_thread(&row))
            .transpose()
    }

    async fn list_threads(&self) -> Result<Vec<Thread>> {
        sqlx::query("SELECT * FROM threads WHERE status != 'hidden' ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(map_thread)
            .collect()
    }

    async fn delete_thread(&self, id: Uuid) -> Result<()> {
        // Posts and summaries go with the thread via ON DELETE CASCADE;
        // the single DELETE is the transactional boundary.
        let res = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("thread".into(), id.to_string()));
        }
        Ok(())
    }

    async fn set_thread_status(&self, id: Uuid, status: ThreadStatus) -> Result<()> {
        let res = sqlx::query("UPDATE threads SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("thread".into(), id.to_string()));
        }
        Ok(())
    }

    async fn set_publish(&self, id: Uuid, public: bool, token: Option<String>) -> Result<()> {
        let res = match token {
            Some(token) => {
                sqlx::query("UPDATE threads SET is_public = ?, public_token = ? WHERE id = ?")
                    .bind(public)
                    .bind(token)
                    .bind(uuid_to_blob(id))
                    .execute(&self.pool)
                    .await
            }
            // Keep the stored token so re-publishing reuses the same URL.
            None => {
                sqlx::query("UPDATE threads SET is_public = ? WHERE id = ?")
                    .bind(public)
                    .bind(uuid_to_blob(id))
                    .execute(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("thread".into(), id.to_string()));
        }
        Ok(())
    }

    async fn get_thread_by_token(&self, token: &str) -> Result<Option<Thread>> {
        sqlx::query("SELECT * FROM threads WHERE public_token = ? AND is_public = 1")
            .bind(token)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_thread(&row))
            .transpose()
    }

    /// Write-time validation and insert in one transaction, so a
    /// concurrent lock or parent change cannot slip between check and
    /// write.
    async fn append_post(&self, post: Post) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let thread_row = sqlx::query("SELECT status FROM threads WHERE id = ?")
            .bind(uuid_to_blob(post.thread_id))
            .fetch_optional(&mut *tx)
            .await
            .map_err(db_err)?;
        let status: ThreadStatus = match thread_row {
            Some(row) => row.get::<String, _>("status").parse()?,
            None => {
                return Err(AppError::NotFound(
                    "thread".into(),
                    post.thread_id.to_string(),
                ))
            }
        };
        if status == ThreadStatus::Locked {
            return Err(AppError::ThreadLocked(post.thread_id));
        }

        if let Some(parent_id) = post.parent_post_id {
            let parent = sqlx::query("SELECT thread_id, parent_post_id FROM posts WHERE id = ?")
                .bind(uuid_to_blob(parent_id))
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?
                .ok_or_else(|| {
                    AppError::InvalidParent(format!("parent post {parent_id} does not exist"))
                })?;
            let parent_thread = blob_to_uuid(&parent.get::<Vec<u8>, _>("thread_id"));
            if parent_thread != post.thread_id {
                return Err(AppError::InvalidParent(format!(
                    "parent post {parent_id} belongs to thread {parent_thread}"
                )));
            }
            // Replies stay one level deep: a reply to a reply is rejected.
            if parent.get::<Option<Vec<u8>>, _>("parent_post_id").is_some() {
                return Err(AppError::InvalidParent(format!(
                    "parent post {parent_id} is itself a reply"
                )));
            }
        }

        insert_post(&mut tx, &post).await?;
        tx.commit().await.map_err(db_err)
    }

    async fn get_post(&self, id: Uuid) -> Result<Option<Post>> {
        sqlx::query("SELECT * FROM posts WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_post(&row))
            .transpose()
    }

    async fn list_posts(&self, thread_id: Uuid, include_hidden: bool) -> Result<Vec<Post>> {
        let sql = if include_hidden {
            "SELECT * FROM posts WHERE thread_id = ? ORDER BY created_at ASC, id ASC"
        } else {
            "SELECT * FROM posts WHERE thread_id = ? AND is_hidden = 0 ORDER BY created_at ASC, id ASC"
        };
        sqlx::query(sql)
            .bind(uuid_to_blob(thread_id))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(map_post)
            .collect()
    }

    async fn set_post_hidden(&self, id: Uuid, hidden: bool) -> Result<()> {
        let res = sqlx::query("UPDATE posts SET is_hidden = ?, updated_at = ? WHERE id = ?")
            .bind(hidden)
            .bind(Utc::now())
            .bind(uuid_to_blob(id))
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        if res.rows_affected() == 0 {
            return Err(AppError::NotFound("post".into(), id.to_string()));
        }
        Ok(())
    }
}

async fn insert_post(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    post: &Post,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO posts (id, thread_id, user_id, parent_post_id, content, is_hidden, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(uuid_to_blob(post.id))
    .bind(uuid_to_blob(post.thread_id))
    .bind(opt_blob(post.user_id))
    .bind(opt_blob(post.parent_post_id))
    .bind(&post.content)
    .bind(post.is_hidden)
    .bind(post.created_at)
    .bind(post.updated_at)
    .execute(&mut **tx)
    .await
    .map_err(db_err)?;
    Ok(())
}

#[async_trait]
impl SummaryRepo for SqliteStore {
    async fn insert_summary(&self, summary: AiSummary) -> Result<()> {
        let res = sqlx::query(
            "INSERT INTO ai_summaries (id, thread_id, model, mode, content, hash_key, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(summary.id))
        .bind(uuid_to_blob(summary.thread_id))
        .bind(&summary.model)
        .bind(summary.mode.as_str())
        .bind(&summary.content)
        .bind(&summary.hash_key)
        .bind(summary.created_at)
        .execute(&self.pool)
        .await;

        match res {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateSummary),
            Err(e) => Err(db_err(e)),
        }
    }

    async fn find_summary(&self, thread_id: Uuid, hash_key: &str) -> Result<Option<AiSummary>> {
        sqlx::query("SELECT * FROM ai_summaries WHERE thread_id = ? AND hash_key = ?")
            .bind(uuid_to_blob(thread_id))
            .bind(hash_key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_summary(&row))
            .transpose()
    }

    async fn list_summaries(&self, thread_id: Uuid) -> Result<Vec<AiSummary>> {
        // The id tiebreak keeps "latest" deterministic when two rows land
        // in the same clock tick (v7 ids order by creation).
        sqlx::query("SELECT * FROM ai_summaries WHERE thread_id = ? ORDER BY created_at DESC, id DESC")
            .bind(uuid_to_blob(thread_id))
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?
            .iter()
            .map(map_summary)
            .collect()
    }
}

#[async_trait]
impl ModerationRepo for SqliteStore {
    async fn insert_report(&self, report: Report) -> Result<()> {
        sqlx::query(
            "INSERT INTO reports (id, target_type, target_id, reported_by, reason, status, created_at, resolved_by, resolved_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(uuid_to_blob(report.id))
        .bind(report.target_type.as_str())
        .bind(uuid_to_blob(report.target_id))
        .bind(uuid_to_blob(report.reported_by))
        .bind(&report.reason)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .bind(opt_blob(report.resolved_by))
        .bind(report.resolved_at)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_report(&self, id: Uuid) -> Result<Option<Report>> {
        sqlx::query("SELECT * FROM reports WHERE id = ?")
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .map(|row| map_report(&row))
            .transpose()
    }

    async fn list_reports(&self, status: Option<ReportStatus>) -> Result<Vec<Report>> {
        let rows = match status {
            Some(status) => {
                sqlx::query("SELECT * FROM reports WHERE status = ? ORDER BY created_at DESC")
                    .bind(status.as_str())
                    .fetch_all(&self.pool)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM reports ORDER BY created_at DESC")
                    .fetch_all(&self.pool)
                    .await
            }
        }
        .map_err(db_err)?;
        rows.iter().map(map_report).collect()
    }

    /// Conditional update keyed on status=open: of two racing moderators,
    /// exactly one flips the row and the loser's metadata never lands.
    async fn resolve_report(&self, id: Uuid, resolver: Uuid, at: DateTime<Utc>) -> Result<()> {
        let res = sqlx::query(
            "UPDATE reports SET status = 'closed', resolved_by = ?, resolved_at = ?
             WHERE id = ? AND status = 'open'",
        )
        .bind(uuid_to_blob(resolver))
        .bind(at)
        .bind(uuid_to_blob(id))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;

        if res.rows_affected() == 0 {
            return match self.get_report(id).await? {
                Some(_) => Err(AppError::AlreadyResolved(id)),
                None => Err(AppError::NotFound("report".into(), id.to_string())),
            };
        }
        Ok(())
    }

    async fn target_exists(&self, kind: TargetKind, id: Uuid) -> Result<bool> {
        let sql = match kind {
            TargetKind::Post => "SELECT 1 FROM posts WHERE id = ?",
            TargetKind::Thread => "SELECT 1 FROM threads WHERE id = ?",
            TargetKind::User => "SELECT 1 FROM users WHERE id = ?",
        };
        Ok(sqlx::query(sql)
            .bind(uuid_to_blob(id))
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?
            .is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user(email: &str) -> User {
        User {
            id: Uuid::now_v7(),
            email: email.into(),
            password_hash: "hash".into(),
            display_name: None,
            avatar_url: None,
            role: Role::User,
            created_at: Utc::now(),
        }
    }

    fn thread(creator: Option<Uuid>) -> (Thread, Post) {
        let t = Thread {
            id: Uuid::now_v7(),
            title: "Topic".into(),
            created_by: creator,
            status: ThreadStatus::Open,
            is_public: false,
            public_token: None,
            created_at: Utc::now(),
        };
        let p = post(t.id, None);
        (t, p)
    }

    fn post(thread_id: Uuid, parent: Option<Uuid>) -> Post {
        let now = Utc::now();
        Post {
            id: Uuid::now_v7(),
            thread_id,
            user_id: None,
            parent_post_id: parent,
            content: "content".into(),
            is_hidden: false,
            created_at: now,
            updated_at: now,
        }
    }

    fn summary(thread_id: Uuid, hash_key: &str) -> AiSummary {
        AiSummary {
            id: Uuid::now_v7(),
            thread_id,
            model: "test-model".into(),
            mode: agora_core::models::SummaryMode::Conversation,
            content: "a summary".into(),
            hash_key: hash_key.into(),
            created_at: Utc::now(),
        }
    }

    async fn store_with_thread() -> (SqliteStore, Thread) {
        let store = SqliteStore::in_memory().await.unwrap();
        let (t, p) = thread(None);
        store.create_thread(t.clone(), p).await.unwrap();
        (store, t)
    }

    #[tokio::test]
    async fn duplicate_email_is_rejected() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.create_user(user("a@example.com")).await.unwrap();
        let err = store.create_user(user("a@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailTaken(email) if email == "a@example.com"));
    }

    #[tokio::test]
    async fn posting_to_a_locked_thread_fails_and_writes_nothing() {
        let (store, t) = store_with_thread().await;
        store
            .set_thread_status(t.id, ThreadStatus::Locked)
            .await
            .unwrap();
        let err = store.append_post(post(t.id, None)).await.unwrap_err();
        assert!(matches!(err, AppError::ThreadLocked(id) if id == t.id));
        assert_eq!(store.list_posts(t.id, true).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cross_thread_parents_are_rejected() {
        let (store, t1) = store_with_thread().await;
        let (t2, p2) = thread(None);
        store.create_thread(t2.clone(), p2.clone()).await.unwrap();

        let err = store.append_post(post(t1.id, Some(p2.id))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidParent(_)));
    }

    #[tokio::test]
    async fn replies_deeper_than_one_level_are_rejected() {
        let (store, t) = store_with_thread().await;
        let first = store.list_posts(t.id, true).await.unwrap().remove(0);
        let reply = post(t.id, Some(first.id));
        store.append_post(reply.clone()).await.unwrap();

        let err = store.append_post(post(t.id, Some(reply.id))).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidParent(_)));
    }

    #[tokio::test]
    async fn missing_parents_are_rejected() {
        let (store, t) = store_with_thread().await;
        let err = store
            .append_post(post(t.id, Some(Uuid::now_v7())))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidParent(_)));
    }

    #[tokio::test]
    async fn posts_come_back_in_creation_order() {
        let (store, t) = store_with_thread().await;
        let base = Utc::now();
        for i in [3i64, 1, 2] {
            let mut p = post(t.id, None);
            p.content = format!("post {i}");
            p.created_at = base + Duration::seconds(i);
            p.updated_at = p.created_at;
            store.append_post(p).await.unwrap();
        }
        let contents: Vec<String> = store
            .list_posts(t.id, true)
            .await
            .unwrap()
            .into_iter()
            .skip(1) // opening post
            .map(|p| p.content)
            .collect();
        assert_eq!(contents, ["post 1", "post 2", "post 3"]);
    }

    #[tokio::test]
    async fn hidden_posts_are_filtered_but_retained() {
        let (store, t) = store_with_thread().await;
        let p = post(t.id, None);
        store.append_post(p.clone()).await.unwrap();
        store.set_post_hidden(p.id, true).await.unwrap();

        assert_eq!(store.list_posts(t.id, false).await.unwrap().len(), 1);
        assert_eq!(store.list_posts(t.id, true).await.unwrap().len(), 2);
        // Content survives the soft-hide for audit replay.
        let hidden = store.get_post(p.id).await.unwrap().unwrap();
        assert!(hidden.is_hidden);
        assert_eq!(hidden.content, "content");

        store.set_post_hidden(p.id, false).await.unwrap();
        assert_eq!(store.list_posts(t.id, false).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn hidden_threads_leave_the_listing_but_stay_readable() {
        let (store, t) = store_with_thread().await;
        store
            .set_thread_status(t.id, ThreadStatus::Hidden)
            .await
            .unwrap();
        assert!(store.list_threads().await.unwrap().is_empty());
        assert!(store.get_thread(t.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_thread_cascades_to_posts_and_summaries() {
        let (store, t) = store_with_thread().await;
        store.append_post(post(t.id, None)).await.unwrap();
        store.insert_summary(summary(t.id, "f1")).await.unwrap();

        store.delete_thread(t.id).await.unwrap();

        assert!(store.get_thread(t.id).await.unwrap().is_none());
        assert!(store.list_posts(t.id, true).await.unwrap().is_empty());
        assert!(store.list_summaries(t.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_summary_for_the_same_fingerprint_is_a_duplicate() {
        let (store, t) = store_with_thread().await;
        store.insert_summary(summary(t.id, "f1")).await.unwrap();
        let err = store.insert_summary(summary(t.id, "f1")).await.unwrap_err();
        assert!(matches!(err, AppError::DuplicateSummary));
        // A different fingerprint for the same thread is a new cache entry.
        store.insert_summary(summary(t.id, "f2")).await.unwrap();
        assert_eq!(store.list_summaries(t.id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn resolving_twice_fails_and_keeps_the_first_resolution() {
        let store = SqliteStore::in_memory().await.unwrap();
        let reporter = user("r@example.com");
        store.create_user(reporter.clone()).await.unwrap();
        let report = Report {
            id: Uuid::now_v7(),
            target_type: TargetKind::User,
            target_id: reporter.id,
            reported_by: reporter.id,
            reason: "spam".into(),
            status: ReportStatus::Open,
            created_at: Utc::now(),
            resolved_by: None,
            resolved_at: None,
        };
        store.insert_report(report.clone()).await.unwrap();

        let first_mod = user("m1@example.com");
        let second_mod = user("m2@example.com");
        store.create_user(first_mod.clone()).await.unwrap();
        store.create_user(second_mod.clone()).await.unwrap();

        store
            .resolve_report(report.id, first_mod.id, Utc::now())
            .await
            .unwrap();
        let err = store
            .resolve_report(report.id, second_mod.id, Utc::now())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::AlreadyResolved(id) if id == report.id));

        let stored = store.get_report(report.id).await.unwrap().unwrap();
        assert_eq!(stored.status, ReportStatus::Closed);
        assert_eq!(stored.resolved_by, Some(first_mod.id));
    }

    #[tokio::test]
    async fn target_lookup_covers_every_kind() {
        let (store, t) = store_with_thread().await;
        let u = user("t@example.com");
        store.create_user(u.clone()).await.unwrap();
        let p = store.list_posts(t.id, true).await.unwrap().remove(0);

        assert!(store.target_exists(TargetKind::Thread, t.id).await.unwrap());
        assert!(store.target_exists(TargetKind::Post, p.id).await.unwrap());
        assert!(store.target_exists(TargetKind::User, u.id).await.unwrap());
        assert!(!store
            .target_exists(TargetKind::Post, Uuid::now_v7())
            .await
            .unwrap());
    }
}
