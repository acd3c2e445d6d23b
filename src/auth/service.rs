//! Credential Service
//! Mission: Register accounts and authenticate returning users

use crate::auth::{
    jwt::JwtHandler,
    models::{AccountResponse, LoginResponse, NewAccount, RegisterRequest},
    password::{PasswordHasher, MAX_PASSWORD_BYTES},
    user_store::{AccountStore, RoleDirectory, StoreError},
};
use crate::config::AuthConfig;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

/// Message shared by every credential failure.
pub const INVALID_CREDENTIALS: &str = "Invalid Credentials";

/// Verified against on unknown usernames so both login failures cost one bcrypt check.
const DUMMY_PASSWORD: &str = "authgate-unknown-user";

/// Domain error taxonomy for register and login
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    /// Unknown username and wrong password collapse into this one variant.
    #[error("Invalid Credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Conflict(String),
    #[error("infrastructure failure: {0:#}")]
    Infrastructure(#[from] anyhow::Error),
}

/// Register + login over an injected store and role directory
pub struct AuthService {
    accounts: Arc<dyn AccountStore>,
    roles: Arc<dyn RoleDirectory>,
    hasher: PasswordHasher,
    jwt: Arc<JwtHandler>,
    dummy_hash: Option<String>,
}

impl AuthService {
    pub fn new(
        accounts: Arc<dyn AccountStore>,
        roles: Arc<dyn RoleDirectory>,
        config: &AuthConfig,
    ) -> Self {
        let hasher = PasswordHasher::new(config.bcrypt_cost());
        let dummy_hash = hasher.hash(DUMMY_PASSWORD).ok();
        if dummy_hash.is_none() {
            warn!("Could not prepare dummy hash; unknown-user logins will skip bcrypt");
        }

        Self {
            accounts,
            roles,
            hasher,
            jwt: Arc::new(JwtHandler::new(config.jwt_secret())),
            dummy_hash,
        }
    }

    /// Token handler sharing this service's signing key
    pub fn jwt_handler(&self) -> Arc<JwtHandler> {
        self.jwt.clone()
    }

    /// Register a new account.
    ///
    /// Input is validated and the role checked before any hashing or store
    /// write happens.
    pub async fn register(&self, candidate: RegisterRequest) -> Result<AccountResponse, AuthError> {
        let role_name = self.validate_registration(&candidate).await?;
        let username = candidate.username.trim().to_string();

        let password_hash = self.hasher.hash_blocking(candidate.password).await?;

        let account = self
            .accounts
            .insert_account(NewAccount {
                username,
                password_hash,
                role_name,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateUsername => {
                    AuthError::Conflict("Username already exists".to_string())
                }
                StoreError::Other(err) => AuthError::Infrastructure(err),
            })?;

        info!(
            "📝 Registered user: {} ({})",
            account.username, account.role_name
        );

        Ok(AccountResponse::from_account(&account))
    }

    /// Returns the normalized role name
    async fn validate_registration(&self, candidate: &RegisterRequest) -> Result<String, AuthError> {
        if candidate.username.trim().is_empty() {
            return Err(AuthError::Validation("username is required".to_string()));
        }
        if candidate.password.is_empty() {
            return Err(AuthError::Validation("password is required".to_string()));
        }
        if candidate.password.len() > MAX_PASSWORD_BYTES {
            return Err(AuthError::Validation(format!(
                "password must be at most {} bytes",
                MAX_PASSWORD_BYTES
            )));
        }

        let role_name = candidate.role_name.trim();
        if role_name.is_empty() {
            return Err(AuthError::Validation("role_name is required".to_string()));
        }

        if !self.roles.role_exists(role_name).await? {
            warn!("Rejected registration with unknown role: {}", role_name);
            return Err(AuthError::Validation(format!(
                "role_name '{}' does not exist",
                role_name
            )));
        }

        Ok(role_name.to_string())
    }

    /// Verify credentials and issue a 24-hour token
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, AuthError> {
        let username = username.trim();
        info!("🔐 Login attempt: {}", username);

        let Some(account) = self.accounts.find_by_username(username).await? else {
            if let Some(dummy_hash) = &self.dummy_hash {
                let _ = self
                    .hasher
                    .verify_blocking(password.to_string(), dummy_hash.clone())
                    .await;
            }
            warn!("❌ Failed login attempt: {}", username);
            return Err(AuthError::InvalidCredentials);
        };

        let valid = self
            .hasher
            .verify_blocking(password.to_string(), account.password_hash.clone())
            .await
            .map_err(|e| {
                error!("Stored hash for {} could not be verified", account.username);
                AuthError::Infrastructure(e)
            })?;

        if !valid {
            warn!("❌ Failed login attempt: {}", username);
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.jwt.generate_token(&account)?;

        info!(
            "✅ Login successful: {} ({})",
            account.username, account.role_name
        );

        Ok(LoginResponse::welcome_back(&account.username, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::Account;
    use crate::auth::user_store::UserStore;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::NamedTempFile;

    fn test_config() -> AuthConfig {
        AuthConfig::new("test-secret-key-12345".to_string(), 4).unwrap()
    }

    async fn create_test_service() -> (AuthService, Arc<UserStore>, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = Arc::new(UserStore::new(temp_file.path().to_str().unwrap()).unwrap());
        store.seed_roles(&["angel", "student"]).await.unwrap();
        let service = AuthService::new(store.clone(), store.clone(), &test_config());
        (service, store, temp_file)
    }

    fn anna() -> RegisterRequest {
        RegisterRequest {
            username: "anna".to_string(),
            password: "1234".to_string(),
            role_name: "angel".to_string(),
        }
    }

    /// Counts store calls; every role lookup answers "missing".
    #[derive(Default)]
    struct RecordingStore {
        lookups: AtomicUsize,
        inserts: AtomicUsize,
        fail_lookups: bool,
    }

    #[async_trait]
    impl AccountStore for RecordingStore {
        async fn find_by_username(&self, _username: &str) -> anyhow::Result<Option<Account>> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            if self.fail_lookups {
                return Err(anyhow!("database is locked"));
            }
            Ok(None)
        }

        async fn insert_account(&self, _account: NewAccount) -> Result<Account, StoreError> {
            self.inserts.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Other(anyhow!("insert should not be reached")))
        }
    }

    #[async_trait]
    impl RoleDirectory for RecordingStore {
        async fn role_exists(&self, _role_name: &str) -> anyhow::Result<bool> {
            Ok(false)
        }
    }

    #[tokio::test]
    async fn test_register_returns_sanitized_account() {
        let (service, store, _temp) = create_test_service().await;

        let created = service.register(anna()).await.unwrap();
        assert!(created.user_id > 0);
        assert_eq!(created.username, "anna");
        assert_eq!(created.role_name, "angel");

        let stored = store.find_by_username("anna").await.unwrap().unwrap();
        assert_eq!(stored.user_id, created.user_id);
        assert_ne!(stored.password_hash, "1234");
        assert!(PasswordHasher::new(4)
            .verify("1234", &stored.password_hash)
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_trims_role_name() {
        let (service, _store, _temp) = create_test_service().await;

        let mut candidate = anna();
        candidate.role_name = "  angel ".to_string();
        let created = service.register(candidate).await.unwrap();
        assert_eq!(created.role_name, "angel");
    }

    #[tokio::test]
    async fn test_duplicate_register_is_conflict() {
        let (service, _store, _temp) = create_test_service().await;

        service.register(anna()).await.unwrap();
        let err = service.register(anna()).await.unwrap_err();

        assert!(matches!(err, AuthError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_unknown_role_is_validation_without_store_write() {
        let store = Arc::new(RecordingStore::default());
        let service = AuthService::new(store.clone(), store.clone(), &test_config());

        let err = service.register(anna()).await.unwrap_err();

        assert!(matches!(err, AuthError::Validation(_)));
        assert_eq!(store.inserts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_blank_fields_are_validation_errors() {
        let (service, store, _temp) = create_test_service().await;

        for (username, password, role_name) in
            [("", "1234", "angel"), ("anna", "", "angel"), ("anna", "1234", "  ")]
        {
            let err = service
                .register(RegisterRequest {
                    username: username.to_string(),
                    password: password.to_string(),
                    role_name: role_name.to_string(),
                })
                .await
                .unwrap_err();
            assert!(matches!(err, AuthError::Validation(_)));
        }

        assert!(store.find_by_username("anna").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_login_issues_token_for_stored_account() {
        let (service, _store, _temp) = create_test_service().await;
        let created = service.register(anna()).await.unwrap();

        let response = service.login("anna", "1234").await.unwrap();
        assert_eq!(response.message, "anna is back!");

        let claims = service.jwt_handler().validate_token(&response.token).unwrap();
        assert_eq!(claims.subject, created.user_id);
        assert_eq!(claims.username, "anna");
        assert_eq!(claims.role_name, "angel");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let (service, _store, _temp) = create_test_service().await;
        service.register(anna()).await.unwrap();

        let wrong_password = service.login("anna", "wrong").await.unwrap_err();
        let unknown_user = service.login("nobody", "1234").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_user, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
        assert_eq!(wrong_password.to_string(), INVALID_CREDENTIALS);
    }

    #[tokio::test]
    async fn test_store_failure_on_login_is_infrastructure() {
        let store = Arc::new(RecordingStore {
            fail_lookups: true,
            ..Default::default()
        });
        let service = AuthService::new(store.clone(), store.clone(), &test_config());

        let err = service.login("anna", "1234").await.unwrap_err();

        assert!(matches!(err, AuthError::Infrastructure(_)));
        assert_eq!(store.lookups.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_password_past_bcrypt_limit_is_rejected() {
        let (service, store, _temp) = create_test_service().await;

        let mut candidate = anna();
        candidate.password = format!("{}A", "x".repeat(MAX_PASSWORD_BYTES));
        let err = service.register(candidate).await.unwrap_err();

        assert!(matches!(err, AuthError::Validation(_)));
        assert!(store.find_by_username("anna").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_longer_password_sharing_prefix_cannot_log_in() {
        let (service, _store, _temp) = create_test_service().await;

        let base = "x".repeat(MAX_PASSWORD_BYTES);
        let mut candidate = anna();
        candidate.password = base.clone();
        service.register(candidate).await.unwrap();

        assert!(service.login("anna", &base).await.is_ok());
        let err = service
            .login("anna", &format!("{}B", base))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_username_is_trimmed_on_register_and_login() {
        let (service, _store, _temp) = create_test_service().await;

        let mut candidate = anna();
        candidate.username = " anna ".to_string();
        let created = service.register(candidate).await.unwrap();
        assert_eq!(created.username, "anna");

        let err = service.register(anna()).await.unwrap_err();
        assert!(matches!(err, AuthError::Conflict(_)));

        let response = service.login("  anna", "1234").await.unwrap();
        assert_eq!(response.message, "anna is back!");
    }

    #[tokio::test]
    async fn test_unknown_user_still_runs_bcrypt_check() {
        let (service, _store, _temp) = create_test_service().await;

        let dummy_hash = service.dummy_hash.clone().unwrap();
        assert!(dummy_hash.contains("$04$"));
        assert!(service.hasher.verify(DUMMY_PASSWORD, &dummy_hash).unwrap());

        let err = service.login("nobody", "1234").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
