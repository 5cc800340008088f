//! Credential store over the relational database.

use super::traits::{Account, AccountDraft, CredentialStore};
use super::turso::{NewAccountRow, TursoClient};
use crate::auth::password::PasswordHasher;
use crate::types::{AppError, ProfileUpdate, Result, Role};
use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

/// Trim and lowercase. Applied once at the store boundary so every
/// comparison downstream is an exact match.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Accounts persisted in SQLite, with passwords hashed before they are written.
pub struct AccountStore {
    db: Arc<TursoClient>,
    hasher: PasswordHasher,
}

impl AccountStore {
    pub fn new(db: Arc<TursoClient>, hasher: PasswordHasher) -> Self {
        Self { db, hasher }
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    async fn require(&self, id: &str) -> Result<Account> {
        self.db
            .get_user_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }
}

#[async_trait]
impl CredentialStore for AccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>> {
        self.db.get_user_by_email(&normalize_email(email)).await
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>> {
        self.db.get_user_by_id(id).await
    }

    async fn create(&self, draft: AccountDraft) -> Result<Account> {
        let email = normalize_email(&draft.email);

        // Cheap pre-check so duplicates don't pay for a hash; the UNIQUE
        // constraint still decides races.
        if self.db.get_user_by_email(&email).await?.is_some() {
            return Err(AppError::DuplicateIdentity);
        }

        let password_hash = self.hasher.hash_blocking(&draft.password).await?;
        let id = Uuid::new_v4().to_string();

        let account = self
            .db
            .insert_user(&NewAccountRow {
                id: &id,
                email: &email,
                password_hash: &password_hash,
                role: draft.role,
                name: draft.name.trim(),
                student_id: draft.student_id.as_deref(),
                course: draft.course.as_deref(),
                year: draft.year.as_deref(),
                photo: draft.photo.as_deref(),
            })
            .await?;

        tracing::info!(user_id = %account.id, role = %account.role, "Account created");
        Ok(account)
    }

    async fn update_secret(&self, id: &str, new_plaintext: &str) -> Result<()> {
        let password_hash = self.hasher.hash_blocking(new_plaintext).await?;
        if !self.db.update_password_hash(id, &password_hash).await? {
            return Err(AppError::NotFound("User".to_string()));
        }
        tracing::info!(user_id = %id, "Password updated");
        Ok(())
    }

    async fn update_profile(&self, id: &str, changes: &ProfileUpdate) -> Result<Account> {
        if !self.db.update_profile(id, changes).await? {
            return Err(AppError::NotFound("User".to_string()));
        }
        self.require(id).await
    }

    async fn set_role(&self, id: &str, role: Role) -> Result<Account> {
        if !self.db.update_role(id, role).await? {
            return Err(AppError::NotFound("User".to_string()));
        }
        self.require(id).await
    }

    async fn list(&self) -> Result<Vec<Account>> {
        self.db.list_users().await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.db.delete_user_cascade(id).await?;
        if removed {
            tracing::info!(user_id = %id, "Account deleted");
        }
        Ok(removed)
    }
}
