// Client session context and the store that obtains it from an auth gateway.
// Invariants: a session exists only between login/register and logout/expiry;
// demo sessions are only fabricated in explicit offline mode and stay labeled.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{AuthResponse, Role};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GatewayError {
    /// The gateway answered and refused the request.
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("gateway unreachable: {0}")]
    Unreachable(String),
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for SessionError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::Rejected { status, message } => SessionError::Rejected { status, message },
            GatewayError::Unreachable(reason) => SessionError::Unavailable(reason),
        }
    }
}

#[async_trait]
pub trait AuthGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError>;

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, GatewayError>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionOrigin {
    Gateway,
    Demo,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OfflineMode {
    #[default]
    Disabled,
    /// Fabricate a labeled demo session when the gateway cannot be reached.
    Demo,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub token: String,
    pub origin: SessionOrigin,
    pub expires_at_ms: Option<u64>,
}

impl Session {
    pub fn from_response(response: AuthResponse) -> Self {
        let expires_at_ms = token_expiry_ms(&response.token);
        Self {
            id: response.id,
            username: response.username,
            email: response.email,
            role: response.role,
            token: response.token,
            origin: SessionOrigin::Gateway,
            expires_at_ms,
        }
    }

    pub fn demo(username: Option<&str>, email: &str, now_ms: u64) -> Self {
        let username = match username {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => demo_username(email),
        };
        Self {
            id: format!("demo-{now_ms}"),
            username,
            email: email.to_string(),
            role: Role::Admin,
            token: format!("demo-token-{now_ms}"),
            origin: SessionOrigin::Demo,
            expires_at_ms: None,
        }
    }

    /// False for fabricated demo sessions: their role was never checked by a server.
    pub fn is_authoritative(&self) -> bool {
        self.origin == SessionOrigin::Gateway
    }

    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.expires_at_ms.map(|exp| now_ms >= exp).unwrap_or(false)
    }

    pub fn can_view_admin(&self) -> bool {
        matches!(self.role, Role::Admin | Role::Operator)
    }

    pub fn label(&self) -> String {
        match self.origin {
            SessionOrigin::Gateway => format!("{} ({})", self.username, self.role),
            SessionOrigin::Demo => format!("{} ({}, DEMO MODE)", self.username, self.role),
        }
    }
}

fn demo_username(email: &str) -> String {
    match email.split('@').next() {
        Some(local) if !local.is_empty() => local.to_string(),
        _ => "Operator".to_string(),
    }
}

/// Reads the `exp` claim without verifying the signature.
pub fn token_expiry_ms(token: &str) -> Option<u64> {
    let payload = token.split('.').nth(1)?;
    let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
    let claims: serde_json::Value = serde_json::from_slice(&bytes).ok()?;
    claims
        .get("exp")
        .and_then(|exp| exp.as_u64())
        .map(|secs| secs.saturating_mul(1000))
}

pub struct SessionStore<G> {
    gateway: G,
    offline: OfflineMode,
    current: Option<Session>,
}

impl<G: AuthGateway> SessionStore<G> {
    pub fn new(gateway: G, offline: OfflineMode) -> Self {
        Self {
            gateway,
            offline,
            current: None,
        }
    }

    pub fn offline_mode(&self) -> OfflineMode {
        self.offline
    }

    pub async fn login(
        &mut self,
        email: &str,
        password: &str,
        now_ms: u64,
    ) -> Result<&Session, SessionError> {
        let result = self.gateway.login(email, password).await;
        let session = self.resolve(result, None, email, now_ms)?;
        let session: &Session = self.current.insert(session);
        Ok(session)
    }

    pub async fn register(
        &mut self,
        username: &str,
        email: &str,
        password: &str,
        now_ms: u64,
    ) -> Result<&Session, SessionError> {
        let result = self.gateway.register(username, email, password).await;
        let session = self.resolve(result, Some(username), email, now_ms)?;
        let session: &Session = self.current.insert(session);
        Ok(session)
    }

    fn resolve(
        &self,
        result: Result<AuthResponse, GatewayError>,
        username: Option<&str>,
        email: &str,
        now_ms: u64,
    ) -> Result<Session, SessionError> {
        match result {
            Ok(response) => Ok(Session::from_response(response)),
            Err(GatewayError::Unreachable(_)) if self.offline == OfflineMode::Demo => {
                Ok(Session::demo(username, email, now_ms))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub fn logout(&mut self) -> Option<Session> {
        self.current.take()
    }

    /// Current session, dropping it once its token has expired.
    pub fn current(&mut self, now_ms: u64) -> Option<&Session> {
        if self
            .current
            .as_ref()
            .map(|session| session.is_expired(now_ms))
            .unwrap_or(false)
        {
            self.current = None;
        }
        self.current.as_ref()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGateway {
        login: Result<AuthResponse, GatewayError>,
    }

    #[async_trait]
    impl AuthGateway for FixedGateway {
        async fn login(&self, _email: &str, _password: &str) -> Result<AuthResponse, GatewayError> {
            self.login.clone()
        }

        async fn register(
            &self,
            _username: &str,
            _email: &str,
            _password: &str,
        ) -> Result<AuthResponse, GatewayError> {
            self.login.clone()
        }
    }

    fn token_with_exp(exp_secs: u64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let claims = URL_SAFE_NO_PAD.encode(format!(r#"{{"id":"u1","iat":1,"exp":{exp_secs}}}"#));
        format!("{header}.{claims}.sig")
    }

    fn response(token: String) -> AuthResponse {
        AuthResponse {
            id: "u1".to_string(),
            username: "ops".to_string(),
            email: "ops@rover.io".to_string(),
            role: Role::Operator,
            token,
        }
    }

    #[tokio::test]
    async fn login_stores_gateway_session() {
        let gateway = FixedGateway {
            login: Ok(response(token_with_exp(2_000))),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Disabled);
        let session = store.login("ops@rover.io", "pw", 0).await.unwrap();
        assert_eq!(session.origin, SessionOrigin::Gateway);
        assert!(session.is_authoritative());
        assert_eq!(session.expires_at_ms, Some(2_000_000));
        assert!(store.current(1_000).is_some());
    }

    #[tokio::test]
    async fn expired_session_is_dropped() {
        let gateway = FixedGateway {
            login: Ok(response(token_with_exp(10))),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Disabled);
        store.login("ops@rover.io", "pw", 0).await.unwrap();
        assert!(store.current(9_999).is_some());
        assert!(store.current(10_000).is_none());
        assert!(store.current(0).is_none());
    }

    #[tokio::test]
    async fn rejection_is_never_masked_by_demo_mode() {
        let gateway = FixedGateway {
            login: Err(GatewayError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string(),
            }),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Demo);
        let err = store.login("ops@rover.io", "bad", 0).await.unwrap_err();
        assert_eq!(
            err,
            SessionError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string()
            }
        );
        assert!(store.current(0).is_none());
    }

    #[tokio::test]
    async fn unreachable_gateway_fails_without_demo_mode() {
        let gateway = FixedGateway {
            login: Err(GatewayError::Unreachable("connection refused".to_string())),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Disabled);
        let err = store.login("ops@rover.io", "pw", 0).await.unwrap_err();
        assert!(matches!(err, SessionError::Unavailable(_)));
        assert!(store.current(0).is_none());
    }

    #[tokio::test]
    async fn demo_mode_fabricates_labeled_session() {
        let gateway = FixedGateway {
            login: Err(GatewayError::Unreachable("connection refused".to_string())),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Demo);
        let session = store.login("nova@rover.io", "pw", 42).await.unwrap().clone();
        assert_eq!(session.origin, SessionOrigin::Demo);
        assert!(!session.is_authoritative());
        assert_eq!(session.username, "nova");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.id, "demo-42");
        assert_eq!(session.token, "demo-token-42");
        assert!(session.label().contains("DEMO MODE"));
        assert!(store.current(u64::MAX).is_some());
    }

    #[tokio::test]
    async fn demo_register_keeps_requested_username() {
        let gateway = FixedGateway {
            login: Err(GatewayError::Unreachable("timeout".to_string())),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Demo);
        let session = store
            .register("Rover Ops", "x@rover.io", "pw", 7)
            .await
            .unwrap();
        assert_eq!(session.username, "Rover Ops");
    }

    #[tokio::test]
    async fn logout_destroys_session() {
        let gateway = FixedGateway {
            login: Ok(response(token_with_exp(u64::MAX / 2_000))),
        };
        let mut store = SessionStore::new(gateway, OfflineMode::Disabled);
        store.login("ops@rover.io", "pw", 0).await.unwrap();
        let previous = store.logout().unwrap();
        assert_eq!(previous.username, "ops");
        assert!(store.current(0).is_none());
    }

    #[test]
    fn demo_username_falls_back_to_operator() {
        assert_eq!(Session::demo(None, "@rover.io", 1).username, "Operator");
        assert_eq!(Session::demo(None, "", 1).username, "Operator");
    }

    #[test]
    fn malformed_token_has_no_expiry() {
        assert_eq!(token_expiry_ms("not-a-jwt"), None);
        assert_eq!(token_expiry_ms("a.!!!.c"), None);
    }
}
