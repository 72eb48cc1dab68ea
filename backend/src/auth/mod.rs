// Auth gateway: credential checks against the user store and token issuance.
// States: anonymous -> authenticated, only through a successful register/login.

mod token;

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use rover_telemetry_core::model::{AuthResponse, Role};

use crate::error::{AuthError, AuthResult};
use crate::users::{
    hash_password_blocking, normalize_email, verify_password_blocking, SharedUserStore, UserRecord,
};
use crate::utils::now_epoch_ms;

pub use token::{Claims, TokenIssuer};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Clone)]
pub struct AuthService {
    users: SharedUserStore,
    tokens: Arc<TokenIssuer>,
}

impl AuthService {
    pub fn new(users: SharedUserStore, tokens: Arc<TokenIssuer>) -> Self {
        Self { users, tokens }
    }

    pub fn users(&self) -> &SharedUserStore {
        &self.users
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    pub async fn register(&self, request: RegisterRequest) -> AuthResult<AuthResponse> {
        let username = request.username.trim();
        let email = normalize_email(&request.email);
        if username.is_empty() || email.is_empty() || request.password.is_empty() {
            return Err(AuthError::InvalidUserData);
        }

        if self.users.find_by_email(&email).await?.is_some() {
            info!(%email, "register rejected, user exists");
            return Err(AuthError::UserExists);
        }

        let record = UserRecord {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            email,
            password_hash: hash_password_blocking(request.password.clone()).await?,
            role: request.role.unwrap_or_default(),
            created_at_ms: now_epoch_ms(),
        };
        let token = self.tokens.issue(&record.id)?;
        self.users.insert(record.clone()).await?;
        info!(id = %record.id, role = %record.role, "user registered");

        Ok(response_for(record, token))
    }

    pub async fn login(&self, request: LoginRequest) -> AuthResult<AuthResponse> {
        let user = self.users.find_by_email(&request.email).await?;
        let stored = user.as_ref().map(|user| user.password_hash.clone());
        let verified = verify_password_blocking(request.password, stored).await;

        match user {
            Some(user) if verified => {
                let token = self.tokens.issue(&user.id)?;
                info!(id = %user.id, "login accepted");
                Ok(response_for(user, token))
            }
            _ => {
                info!("login rejected");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Resolves a bearer token to its stored user.
    pub async fn authenticate(&self, token: &str) -> AuthResult<UserRecord> {
        let claims = self.tokens.verify(token)?;
        self.users
            .find_by_id(&claims.id)
            .await?
            .ok_or(AuthError::InvalidToken)
    }
}

fn response_for(user: UserRecord, token: String) -> AuthResponse {
    AuthResponse {
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
        token,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::users::{MemoryUserStore, UnavailableUserStore};

    fn service() -> AuthService {
        AuthService::new(
            Arc::new(MemoryUserStore::default()),
            Arc::new(TokenIssuer::new("test", Duration::from_secs(30 * 24 * 3600))),
        )
    }

    fn register_request(email: &str) -> RegisterRequest {
        RegisterRequest {
            username: "ops".to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role: None,
        }
    }

    #[tokio::test]
    async fn register_defaults_to_operator_and_issues_token() {
        let auth = service();
        let response = auth.register(register_request("ops@rover.io")).await.unwrap();
        assert_eq!(response.role, Role::Operator);
        let claims = auth.tokens().verify(&response.token).unwrap();
        assert_eq!(claims.id, response.id);
    }

    #[tokio::test]
    async fn register_duplicate_email_does_not_mutate_store() {
        let auth = service();
        auth.register(register_request("ops@rover.io")).await.unwrap();
        let err = auth
            .register(register_request("Ops@Rover.io"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::UserExists));
        assert_eq!(auth.users().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn register_rejects_blank_fields() {
        let auth = service();
        let mut request = register_request("ops@rover.io");
        request.password.clear();
        assert!(matches!(
            auth.register(request).await,
            Err(AuthError::InvalidUserData)
        ));
        assert_eq!(auth.users().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn login_round_trip_and_wrong_password() {
        let auth = service();
        let mut request = register_request("ops@rover.io");
        request.role = Some(Role::Admin);
        let registered = auth.register(request).await.unwrap();

        let ok = auth
            .login(LoginRequest {
                email: "ops@rover.io".to_string(),
                password: "correct horse".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(ok.id, registered.id);
        assert_eq!(ok.role, Role::Admin);
        assert_eq!(auth.authenticate(&ok.token).await.unwrap().id, registered.id);

        let bad = auth
            .login(LoginRequest {
                email: "ops@rover.io".to_string(),
                password: "battery staple".to_string(),
            })
            .await;
        assert!(matches!(bad, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn login_unknown_email_is_invalid_credentials() {
        let auth = service();
        let result = auth
            .login(LoginRequest {
                email: "ghost@rover.io".to_string(),
                password: "x".to_string(),
            })
            .await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn unavailable_store_fails_per_request() {
        let auth = AuthService::new(
            Arc::new(UnavailableUserStore::new("no database")),
            Arc::new(TokenIssuer::new("test", Duration::from_secs(60))),
        );
        let err = auth.register(register_request("a@rover.io")).await.unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn token_for_deleted_user_is_rejected() {
        let auth = service();
        let token = auth.tokens().issue("no-such-user").unwrap();
        assert!(matches!(
            auth.authenticate(&token).await,
            Err(AuthError::InvalidToken)
        ));
    }
}
