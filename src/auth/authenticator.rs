//! Registration and login orchestration.

use crate::auth::jwt::TokenIssuer;
use crate::auth::password::PasswordHasher;
use crate::db::{Account, AccountDraft, CredentialStore, SessionLedger};
use crate::types::{AccountView, AppError, RegisterRequest, Result, Role};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// Lifetimes and input rules applied to every authentication event.
#[derive(Debug, Clone)]
pub struct SessionPolicy {
    /// TTL for ordinary login/registration sessions
    pub session_ttl: Duration,
    /// TTL for sessions opened through the admin login path
    pub admin_session_ttl: Duration,
    pub min_password_length: usize,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            session_ttl: Duration::days(7),
            admin_session_ttl: Duration::hours(24),
            min_password_length: 6,
        }
    }
}

/// Outcome of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: AccountView,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct Authenticator {
    accounts: Arc<dyn CredentialStore>,
    ledger: Arc<dyn SessionLedger>,
    tokens: Arc<TokenIssuer>,
    hasher: PasswordHasher,
    policy: SessionPolicy,
    /// Verified against when the email is unknown, so both failure paths cost
    /// one Argon2 verification.
    dummy_digest: String,
}

impl Authenticator {
    pub fn new(
        accounts: Arc<dyn CredentialStore>,
        ledger: Arc<dyn SessionLedger>,
        tokens: Arc<TokenIssuer>,
        hasher: PasswordHasher,
        policy: SessionPolicy,
    ) -> Result<Self> {
        let dummy_digest = hasher.hash("memberhub-timing-equalizer")?;
        Ok(Self {
            accounts,
            ledger,
            tokens,
            hasher,
            policy,
            dummy_digest,
        })
    }

    /// Create a student account and open its first session.
    pub async fn register(&self, input: RegisterRequest) -> Result<AuthSession> {
        let draft = AccountDraft {
            name: input.name,
            email: input.email,
            password: input.password,
            role: Role::Student,
            student_id: non_blank(input.student_id),
            course: non_blank(input.course),
            year: non_blank(input.year),
            photo: non_blank(input.photo),
        };
        self.validate_draft(&draft)?;

        let account = self.accounts.create(draft).await?;
        self.open_session(&account, self.policy.session_ttl).await
    }

    /// Create an account without opening a session. Used to bootstrap admins.
    pub async fn provision(&self, draft: AccountDraft) -> Result<AccountView> {
        self.validate_draft(&draft)?;
        let account = self.accounts.create(draft).await?;
        Ok(account.view())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let account = self.check_credentials(email, password).await?;
        self.open_session(&account, self.policy.session_ttl).await
    }

    /// Elevated login path: admins only, shorter-lived session. Non-admins get
    /// the same `InvalidCredentials` as a wrong password.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthSession> {
        let account = self.check_credentials(email, password).await?;
        if account.role != Role::Admin {
            tracing::warn!(user_id = %account.id, "Non-admin attempted admin login");
            return Err(AppError::InvalidCredentials);
        }
        self.open_session(&account, self.policy.admin_session_ttl)
            .await
    }

    /// Revoke the session bound to `token`.
    pub async fn logout(&self, token: &str) -> Result<()> {
        if !self.ledger.revoke(token).await? {
            tracing::debug!("Logout for a session that was already gone");
        }
        Ok(())
    }

    /// Change the password of `user_id` and revoke every other session it holds.
    /// `current_token` is the session making the request and stays live.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
        current_token: &str,
    ) -> Result<u64> {
        self.validate_password(new_password)?;

        let account = self
            .accounts
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        if !self
            .hasher
            .verify_blocking(current_password, account.secret.as_str())
            .await
        {
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        self.accounts.update_secret(&account.id, new_password).await?;
        let revoked = self
            .ledger
            .revoke_all_for(&account.id, Some(current_token))
            .await?;

        tracing::info!(user_id = %account.id, revoked, "Password changed, other sessions revoked");
        Ok(revoked)
    }

    async fn check_credentials(&self, email: &str, password: &str) -> Result<Account> {
        let account = match self.accounts.find_by_email(email).await? {
            Some(account) => account,
            None => {
                self.hasher
                    .verify_blocking(password, &self.dummy_digest)
                    .await;
                tracing::debug!("Login for unknown email");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self
            .hasher
            .verify_blocking(password, account.secret.as_str())
            .await
        {
            tracing::debug!(user_id = %account.id, "Login with wrong password");
            return Err(AppError::InvalidCredentials);
        }

        Ok(account)
    }

    async fn open_session(&self, account: &Account, ttl: Duration) -> Result<AuthSession> {
        let issued = self.tokens.issue(&account.id, Some(account.role), ttl)?;

        // No success without a ledger entry.
        self.ledger
            .record(&issued.token, &account.id, issued.expires_at)
            .await?;

        tracing::info!(user_id = %account.id, expires_at = %issued.expires_at, "Session opened");

        Ok(AuthSession {
            user: account.view(),
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    fn validate_draft(&self, draft: &AccountDraft) -> Result<()> {
        if draft.name.trim().is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }
        validate_email(&draft.email)?;
        self.validate_password(&draft.password)
    }

    fn validate_password(&self, password: &str) -> Result<()> {
        let password = password.trim();
        if password.is_empty() {
            return Err(AppError::Validation("Password is required".to_string()));
        }
        if password.chars().count() < self.policy.min_password_length {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                self.policy.min_password_length
            )));
        }
        Ok(())
    }
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    if email.is_empty() {
        return Err(AppError::Validation("Email is required".to_string()));
    }

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(AppError::Validation("Email is invalid".to_string()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{AccountStore, TursoClient};

    struct Harness {
        auth: Authenticator,
        db: Arc<TursoClient>,
        tokens: Arc<TokenIssuer>,
    }

    async fn harness() -> Harness {
        let db = Arc::new(TursoClient::new_memory().await.expect("memory db"));
        let hasher = PasswordHasher::new(1024, 1, 1).expect("params");
        let accounts = Arc::new(AccountStore::new(db.clone(), hasher.clone()));
        let tokens = Arc::new(TokenIssuer::new(b"authenticator-test-secret-32-bytes!!"));
        let auth = Authenticator::new(
            accounts,
            db.clone(),
            tokens.clone(),
            hasher,
            SessionPolicy::default(),
        )
        .expect("authenticator");
        Harness { auth, db, tokens }
    }

    fn registration(email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: "A".to_string(),
            email: email.to_string(),
            password: password.to_string(),
            student_id: None,
            course: Some("  ".to_string()),
            year: None,
            photo: None,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("x@y.com").is_ok());
        assert!(validate_email(" x@y.com ").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@y.com").is_err());
        assert!(validate_email("x@").is_err());
        assert!(validate_email("x@y@z").is_err());
        assert!(validate_email("x y@z.com").is_err());
    }

    #[tokio::test]
    async fn test_register_opens_live_session() {
        let h = harness().await;
        let session = h
            .auth
            .register(registration("X@Y.com", "secret1"))
            .await
            .expect("register");

        assert_eq!(session.user.email, "x@y.com");
        assert_eq!(session.user.role, Role::Student);
        assert!(session.user.course.is_none(), "blank fields are dropped");

        let claims = h.tokens.verify(&session.token).expect("token verifies");
        assert_eq!(claims.sub, session.user.id);
        assert!(h.db.is_live(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_distinct_registrations_both_live() {
        let h = harness().await;
        let first = h
            .auth
            .register(registration("first@example.com", "secret1"))
            .await
            .expect("first register");
        let second = h
            .auth
            .register(registration("second@example.com", "secret2"))
            .await
            .expect("second register");

        assert_ne!(first.user.id, second.user.id);
        for session in [&first, &second] {
            let claims = h.tokens.verify(&session.token).expect("token verifies");
            assert_eq!(claims.sub, session.user.id);
            assert!(h.db.is_live(&session.token).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_register_validation() {
        let h = harness().await;

        let mut missing_name = registration("a@b.com", "secret1");
        missing_name.name = "   ".to_string();
        assert!(matches!(
            h.auth.register(missing_name).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.auth.register(registration("", "secret1")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.auth.register(registration("a@b.com", "")).await,
            Err(AppError::Validation(_))
        ));
        assert!(matches!(
            h.auth.register(registration("a@b.com", "abc")).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_identity() {
        let h = harness().await;
        h.auth
            .register(registration("X@Y.com", "secret1"))
            .await
            .expect("first register");

        let second = h.auth.register(registration(" x@y.com ", "secret2")).await;
        assert!(matches!(second, Err(AppError::DuplicateIdentity)));
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let h = harness().await;
        h.auth
            .register(registration("x@y.com", "secret1"))
            .await
            .expect("register");

        let wrong_password = h.auth.login("x@y.com", "wrong").await.unwrap_err();
        let unknown_email = h.auth.login("nobody@y.com", "secret1").await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.status(), unknown_email.status());
        assert_eq!(
            wrong_password.public_message(),
            unknown_email.public_message()
        );
    }

    #[tokio::test]
    async fn test_login_normalizes_email_and_trims_password() {
        let h = harness().await;
        h.auth
            .register(registration("x@y.com", "secret1"))
            .await
            .expect("register");

        let session = h
            .auth
            .login("  X@Y.COM", " secret1 ")
            .await
            .expect("login");
        assert!(h.db.is_live(&session.token).await.unwrap());
    }

    #[tokio::test]
    async fn test_admin_login_requires_admin_role() {
        let h = harness().await;
        let student = h
            .auth
            .register(registration("s@y.com", "secret1"))
            .await
            .expect("register");

        assert!(matches!(
            h.auth.admin_login("s@y.com", "secret1").await,
            Err(AppError::InvalidCredentials)
        ));

        h.auth
            .provision(AccountDraft {
                name: "Admin".to_string(),
                email: "admin@y.com".to_string(),
                password: "adminpass".to_string(),
                role: Role::Admin,
                ..Default::default()
            })
            .await
            .expect("provision admin");

        let session = h
            .auth
            .admin_login("admin@y.com", "adminpass")
            .await
            .expect("admin login");
        let lifetime = session.expires_at - Utc::now();
        assert!(lifetime <= Duration::hours(24));
        assert!(lifetime > Duration::hours(23));
        assert_ne!(session.user.id, student.user.id);
    }

    #[tokio::test]
    async fn test_logout_revokes_only_that_session() {
        let h = harness().await;
        let first = h
            .auth
            .register(registration("x@y.com", "secret1"))
            .await
            .expect("register");
        let second = h.auth.login("x@y.com", "secret1").await.expect("login");

        h.auth.logout(&first.token).await.expect("logout");

        assert!(!h.db.is_live(&first.token).await.unwrap());
        assert!(h.db.is_live(&second.token).await.unwrap());
        // Logging out twice is harmless.
        h.auth.logout(&first.token).await.expect("second logout");
    }

    #[tokio::test]
    async fn test_change_password_revokes_other_sessions() {
        let h = harness().await;
        let t1 = h
            .auth
            .register(registration("x@y.com", "secret1"))
            .await
            .expect("register");
        let t2 = h.auth.login("x@y.com", "secret1").await.expect("login");

        let revoked = h
            .auth
            .change_password(&t2.user.id, "secret1", "secret2", &t2.token)
            .await
            .expect("change password");

        assert_eq!(revoked, 1);
        assert!(!h.db.is_live(&t1.token).await.unwrap());
        assert!(h.db.is_live(&t2.token).await.unwrap());
        assert!(h.auth.login("x@y.com", "secret1").await.is_err());
        assert!(h.auth.login("x@y.com", "secret2").await.is_ok());
    }

    #[tokio::test]
    async fn test_change_password_checks_current() {
        let h = harness().await;
        let session = h
            .auth
            .register(registration("x@y.com", "secret1"))
            .await
            .expect("register");

        let result = h
            .auth
            .change_password(&session.user.id, "nope", "secret2", &session.token)
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(h.auth.login("x@y.com", "secret1").await.is_ok());
    }
}
