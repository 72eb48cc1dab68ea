// Application state shared by HTTP handlers and socket connections.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::auth::{AuthService, TokenIssuer};
use crate::config::ServerConfig;
use crate::users::SharedUserStore;

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub telemetry_interval: Duration,
    pub start_instant: Instant,
    pub connections: Arc<ConnectionCounter>,
}

impl AppState {
    pub fn new(config: &ServerConfig, users: SharedUserStore) -> Self {
        let tokens = Arc::new(TokenIssuer::new(&config.jwt_secret, config.token_ttl()));
        Self {
            auth: AuthService::new(users, tokens),
            telemetry_interval: config.telemetry_interval(),
            start_instant: Instant::now(),
            connections: Arc::new(ConnectionCounter::default()),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionCounter {
    active: AtomicU64,
    total: AtomicU64,
    commands: AtomicU64,
}

impl ConnectionCounter {
    /// Registers a connection; the returned guard deregisters it on drop.
    pub fn open(self: &Arc<Self>) -> ConnectionGuard {
        self.active.fetch_add(1, Ordering::Relaxed);
        let id = self.total.fetch_add(1, Ordering::Relaxed) + 1;
        ConnectionGuard {
            counter: Arc::clone(self),
            id,
        }
    }

    pub fn active(&self) -> u64 {
        self.active.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> u64 {
        self.total.load(Ordering::Relaxed)
    }

    pub fn record_command(&self) {
        self.commands.fetch_add(1, Ordering::Relaxed);
    }

    pub fn commands(&self) -> u64 {
        self.commands.load(Ordering::Relaxed)
    }
}

pub struct ConnectionGuard {
    counter: Arc<ConnectionCounter>,
    id: u64,
}

impl ConnectionGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.counter.active.fetch_sub(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_tracks_active_connections() {
        let counter = Arc::new(ConnectionCounter::default());
        let first = counter.open();
        let second = counter.open();
        assert_eq!(counter.active(), 2);
        assert_eq!((first.id(), second.id()), (1, 2));
        drop(first);
        assert_eq!(counter.active(), 1);
        drop(second);
        assert_eq!(counter.active(), 0);
        assert_eq!(counter.total(), 2);
    }

    #[test]
    fn commands_are_counted() {
        let counter = ConnectionCounter::default();
        counter.record_command();
        counter.record_command();
        assert_eq!(counter.commands(), 2);
    }
}
