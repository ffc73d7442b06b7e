//! # Identity Service
//!
//! Registration, login, and role management over the `UserRepo` and
//! `AuthProvider` ports. Session/cookie handling is a collaborator concern
//! and lives outside this crate.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use agora_core::error::{AppError, Result};
use agora_core::models::{Role, User};
use agora_core::traits::{AuthProvider, UserRepo};

use crate::sanitize::sanitize_text;

#[derive(Clone)]
pub struct IdentityService {
    users: Arc<dyn UserRepo>,
    auth: Arc<dyn AuthProvider>,
}

impl IdentityService {
    pub fn new(users: Arc<dyn UserRepo>, auth: Arc<dyn AuthProvider>) -> Self {
        Self { users, auth }
    }

    /// Registers a new user with role=user. Emails are normalized to
    /// lowercase; the unique-email constraint is enforced by storage.
    pub async fn register(
        &self,
        email: &str,
        display_name: Option<&str>,
        password: &str,
    ) -> Result<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("email and password are required".into()));
        }
        let display_name = display_name
            .map(sanitize_text)
            .filter(|name| !name.is_empty());

        let user = User {
            id: Uuid::now_v7(),
            email,
            password_hash: self.auth.hash_password(password)?,
            display_name,
            avatar_url: None,
            role: Role::User,
            created_at: Utc::now(),
        };
        self.users.create_user(user.clone()).await?;
        tracing::info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Verifies credentials. The same error is returned for an unknown
    /// email and a wrong password, so login probes cannot enumerate
    /// accounts.
    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        let email = email.trim().to_lowercase();
        let denied = || AppError::Unauthorized("invalid email or password".into());
        let user = self
            .users
            .get_user_by_email(&email)
            .await?
            .ok_or_else(denied)?;
        if !self.auth.verify_password(password, &user.password_hash) {
            return Err(denied());
        }
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users
            .get_user(id)
            .await?
            .ok_or_else(|| AppError::NotFound("user".into(), id.to_string()))
    }

    /// Loads the acting user and checks it may moderate. The caller's
    /// identity itself comes from the external auth layer.
    pub async fn require_moderator(&self, id: Uuid) -> Result<User> {
        let user = self.get_user(id).await?;
        if !user.role.can_moderate() {
            return Err(AppError::Unauthorized(format!(
                "user {} lacks moderation rights",
                user.id
            )));
        }
        Ok(user)
    }

    /// Changes a user's role. `acting` must already be vetted by
    /// `require_moderator`.
    pub async fn set_role(&self, acting: &User, target: Uuid, role: Role) -> Result<()> {
        self.users.set_role(target, role).await?;
        tracing::info!(target_user = %target, new_role = %role, changed_by = %acting.id, "role changed");
        Ok(())
    }
}
