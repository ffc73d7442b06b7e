//! # Domain Models
//!
//! These structs represent the core entities of Agora.
//! We use UUID v7 for time-ordered, globally unique identification.
//! All enum-like columns are stored as lowercase TEXT; the enums below own
//! the string mapping so the storage plugins never hand-roll it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::AppError;

macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(AppError::Validation(format!(
                        "unknown {}: {other:?}", stringify!($name)
                    ))),
                }
            }
        }
    };
}

/// Privilege level of a user. Mutated only by a moderator/admin action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Mod,
    Admin,
}

text_enum!(Role { User => "user", Mod => "mod", Admin => "admin" });

impl Role {
    /// Whether this role may perform moderation actions
    /// (thread status changes, hide/unhide, report resolution).
    pub fn can_moderate(&self) -> bool {
        matches!(self, Role::Mod | Role::Admin)
    }
}

/// Visibility/write state of a thread. Any transition is legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreadStatus {
    Open,
    Locked,
    Hidden,
}

text_enum!(ThreadStatus { Open => "open", Locked => "locked", Hidden => "hidden" });

/// Flavor of AI output cached for a thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    Conversation,
    Analysis,
}

text_enum!(SummaryMode { Conversation => "conversation", Analysis => "analysis" });

/// Lifecycle of a report: open until resolved, exactly once, irreversibly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Open,
    Closed,
}

text_enum!(ReportStatus { Open => "open", Closed => "closed" });

/// Discriminator for the polymorphic report target. The target is a weak
/// reference resolved by a per-kind lookup, never a structural foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Post,
    Thread,
    User,
}

text_enum!(TargetKind { Post => "post", Thread => "thread", User => "user" });

/// A registered identity. Never hard-deleted: posts and reports keep
/// referencing it after the account goes dormant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    /// Argon2 PHC string; never serialized outward.
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A discussion container. Owns its posts and cached summaries:
/// deleting a thread cascades to both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: Uuid,
    pub title: String,
    /// Weak reference to the creator; survives user loss.
    pub created_by: Option<Uuid>,
    pub status: ThreadStatus,
    /// Read-only share link state. The token outlives unpublishing so a
    /// re-publish keeps the same URL.
    pub is_public: bool,
    pub public_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// The fundamental unit of conversation. Belongs to exactly one thread;
/// optionally a one-level reply to another post in the same thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub thread_id: Uuid,
    /// Weak reference to the author; survives user loss.
    pub user_id: Option<Uuid>,
    pub parent_post_id: Option<Uuid>,
    pub content: String,
    /// Soft-hide flag: content is retained for audit replay.
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cached AI summary, keyed by (thread_id, hash_key). Append-only per
/// key, never mutated, removed only by thread cascade. Historical rows are
/// kept on purpose: each one records what the thread looked like at the
/// time it was fingerprinted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSummary {
    pub id: Uuid,
    pub thread_id: Uuid,
    /// Identifier of the generating model (e.g., "gpt-4o-mini").
    pub model: String,
    pub mode: SummaryMode,
    pub content: String,
    /// Caller-computed fingerprint over the summarized input.
    pub hash_key: String,
    pub created_at: DateTime<Utc>,
}

/// A moderation ticket against a post, thread, or user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    pub target_type: TargetKind,
    pub target_id: Uuid,
    pub reported_by: Uuid,
    pub reason: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
    /// Resolution metadata; both null until the report is closed.
    pub resolved_by: Option<Uuid>,
    pub resolved_at: Option<DateTime<Utc>>,
}
