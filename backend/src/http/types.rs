// HTTP response payload types.

use serde::Serialize;

use crate::users::StoreStatus;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct RootResponse {
    pub status: &'static str,
    pub system: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct AdminStatsResponse {
    pub users: usize,
    pub uptime_secs: u64,
    pub store: StoreStatus,
    pub active_connections: u64,
    pub total_connections: u64,
    pub commands_received: u64,
}
