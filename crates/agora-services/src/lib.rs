//! # agora-services
//!
//! Domain services orchestrating the storage and summarizer ports.
//! Each service is a thin, cloneable handle around `Arc`'d ports so the
//! web layer can share one instance across workers.

pub mod discussion;
pub mod identity;
pub mod moderation;
pub mod sanitize;
pub mod summary;

pub use discussion::DiscussionService;
pub use identity::IdentityService;
pub use moderation::ModerationService;
pub use summary::{fingerprint, SummaryService};
