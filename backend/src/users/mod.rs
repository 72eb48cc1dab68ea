// User records and the document stores that persist them.

mod mongo;
mod password;
mod store;

use serde::{Deserialize, Serialize};

use rover_telemetry_core::model::Role;

pub use password::{
    hash_password, hash_password_blocking, verify_password, verify_password_blocking,
};
pub use mongo::MongoUserStore;
pub use store::{
    open_user_store, JsonFileUserStore, MemoryUserStore, SharedUserStore, StoreStatus,
    UnavailableUserStore, UserStore, UserStoreConfig,
};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at_ms: u64,
}

/// Emails are matched case-insensitively and without surrounding whitespace.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}
