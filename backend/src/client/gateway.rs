// HTTP implementation of the session store's auth gateway.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rover_telemetry_core::model::{AuthResponse, ErrorMessage};
use rover_telemetry_core::session::{AuthGateway, GatewayError};

use super::{base_url, ClientError};
use crate::constants::CLIENT_TIMEOUT_SECS;

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct AdminStats {
    pub users: usize,
    pub uptime_secs: u64,
    pub store: String,
    pub active_connections: u64,
}

#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
}

impl HttpGateway {
    pub fn new(server: &str) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url(server)?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn admin_stats(&self, token: &str) -> Result<AdminStats, GatewayError> {
        let response = self
            .client
            .get(format!("{}/api/admin/stats", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .send()
            .await
            .map_err(unreachable)?;
        read_json(response).await
    }

    async fn post_auth<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<AuthResponse, GatewayError> {
        let response = self
            .client
            .post(format!("{}{path}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(unreachable)?;
        read_json(response).await
    }
}

#[async_trait]
impl AuthGateway for HttpGateway {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, GatewayError> {
        #[derive(Serialize)]
        struct LoginBody<'a> {
            email: &'a str,
            password: &'a str,
        }

        self.post_auth("/api/auth/login", &LoginBody { email, password })
            .await
    }

    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthResponse, GatewayError> {
        #[derive(Serialize)]
        struct RegisterBody<'a> {
            username: &'a str,
            email: &'a str,
            password: &'a str,
        }

        self.post_auth(
            "/api/auth/register",
            &RegisterBody {
                username,
                email,
                password,
            },
        )
        .await
    }
}

fn unreachable(err: reqwest::Error) -> GatewayError {
    debug!(%err, "gateway request failed");
    GatewayError::Unreachable(err.to_string())
}

/// Any answer from the server is a rejection unless it is a 2xx with the expected body.
async fn read_json<T: for<'de> Deserialize<'de>>(response: Response) -> Result<T, GatewayError> {
    let status = response.status();
    if status.is_success() {
        return response
            .json::<T>()
            .await
            .map_err(|err| GatewayError::Rejected {
                status: status.as_u16(),
                message: format!("invalid response: {err}"),
            });
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorMessage>(&text)
        .map(|body| body.message)
        .unwrap_or_else(|_| format!("status {status}"));
    Err(GatewayError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[cfg(test)]
mod tests {
    use rover_telemetry_core::model::Role;
    use rover_telemetry_core::session::{OfflineMode, SessionError, SessionOrigin, SessionStore};

    use super::*;
    use crate::client::test_server;

    #[tokio::test]
    async fn register_then_login_through_session_store() {
        let (addr, _) = test_server::spawn(1_000).await;
        let gateway = HttpGateway::new(&addr.to_string()).unwrap();
        let mut sessions = SessionStore::new(gateway, OfflineMode::Demo);

        let registered = sessions
            .register("ops", "ops@rover.io", "correct horse", 0)
            .await
            .unwrap()
            .clone();
        assert_eq!(registered.origin, SessionOrigin::Gateway);
        assert_eq!(registered.role, Role::Operator);
        assert!(registered.expires_at_ms.is_some());

        sessions.logout();
        let session = sessions
            .login("ops@rover.io", "correct horse", 0)
            .await
            .unwrap();
        assert_eq!(session.id, registered.id);
        assert!(session.is_authoritative());
    }

    #[tokio::test]
    async fn rejection_carries_server_message() {
        let (addr, _) = test_server::spawn(1_000).await;
        let gateway = HttpGateway::new(&addr.to_string()).unwrap();
        gateway
            .register("ops", "ops@rover.io", "correct horse")
            .await
            .unwrap();

        let err = gateway.login("ops@rover.io", "wrong").await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                status: 401,
                message: "Invalid email or password".to_string()
            }
        );

        let err = gateway
            .register("ops", "ops@rover.io", "again")
            .await
            .unwrap_err();
        assert_eq!(
            err,
            GatewayError::Rejected {
                status: 400,
                message: "User already exists".to_string()
            }
        );
    }

    #[tokio::test]
    async fn demo_mode_never_masks_a_rejection() {
        let (addr, _) = test_server::spawn(1_000).await;
        let gateway = HttpGateway::new(&addr.to_string()).unwrap();
        let mut sessions = SessionStore::new(gateway, OfflineMode::Demo);
        let err = sessions
            .login("ghost@rover.io", "pw", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Rejected { status: 401, .. }));
    }

    #[tokio::test]
    async fn closed_port_is_unreachable() {
        let gateway = HttpGateway::new(&test_server::closed_addr().to_string()).unwrap();
        let err = gateway.login("ops@rover.io", "pw").await.unwrap_err();
        assert!(matches!(err, GatewayError::Unreachable(_)));

        let mut sessions = SessionStore::new(gateway, OfflineMode::Demo);
        let session = sessions.login("ops@rover.io", "pw", 5).await.unwrap();
        assert_eq!(session.origin, SessionOrigin::Demo);
        assert_eq!(session.username, "ops");
    }

    #[tokio::test]
    async fn admin_stats_with_session_token() {
        let (addr, _) = test_server::spawn(1_000).await;
        let gateway = HttpGateway::new(&addr.to_string()).unwrap();
        let response = gateway
            .register("ops", "ops@rover.io", "correct horse")
            .await
            .unwrap();

        let stats = gateway.admin_stats(&response.token).await.unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.store, "connected");

        let err = gateway.admin_stats("bogus").await.unwrap_err();
        assert!(matches!(err, GatewayError::Rejected { status: 401, .. }));
    }
}
