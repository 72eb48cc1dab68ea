// User document stores: in-memory, single JSON file, and an unavailable stand-in.
// Backend selection lives here too; MongoDB is in `mongo`.
// Invariants: emails are unique; a failed insert leaves the store unchanged.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::mongo::MongoUserStore;
use super::{normalize_email, UserRecord};
use crate::error::StoreError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Connected,
    Unavailable,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError>;

    /// Fails with `UserExists` when the email is already registered.
    async fn insert(&self, record: UserRecord) -> Result<(), StoreError>;

    async fn count(&self) -> Result<usize, StoreError>;

    fn status(&self) -> StoreStatus;
}

pub type SharedUserStore = Arc<dyn UserStore>;

/// Where user records are kept.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserStoreConfig {
    Memory,
    JsonFile(PathBuf),
    Mongo(String),
}

/// Opens the configured store. A store that fails to open is logged and
/// replaced by one that fails every request, so the server still boots.
pub async fn open_user_store(config: &UserStoreConfig) -> SharedUserStore {
    let opened: Result<SharedUserStore, StoreError> = match config {
        UserStoreConfig::Memory => {
            info!("user store: in-memory");
            Ok(Arc::new(MemoryUserStore::default()))
        }
        UserStoreConfig::JsonFile(path) => JsonFileUserStore::open(path).await.map(|store| {
            info!(path = %path.display(), "user store: json document");
            Arc::new(store) as SharedUserStore
        }),
        UserStoreConfig::Mongo(uri) => MongoUserStore::connect(uri).await.map(|store| {
            info!("user store: mongodb");
            Arc::new(store) as SharedUserStore
        }),
    };

    opened.unwrap_or_else(|err| {
        warn!(%err, "user store failed to open, serving without it");
        Arc::new(UnavailableUserStore::new(err.to_string()))
    })
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(&normalize_email(email)).cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.values().find(|user| user.id == id).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let key = normalize_email(&record.email);
        if users.contains_key(&key) {
            return Err(StoreError::UserExists);
        }
        users.insert(key, record);
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().await.len())
    }

    fn status(&self) -> StoreStatus {
        StoreStatus::Connected
    }
}

#[derive(Default, Serialize, Deserialize)]
struct UserDocument {
    #[serde(default)]
    users: Vec<UserRecord>,
}

pub struct JsonFileUserStore {
    path: PathBuf,
    users: RwLock<Vec<UserRecord>>,
}

impl JsonFileUserStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let document = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.iter().all(u8::is_ascii_whitespace) => UserDocument::default(),
            Ok(bytes) => serde_json::from_slice::<UserDocument>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    tokio::fs::create_dir_all(parent).await?;
                }
                UserDocument::default()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            users: RwLock::new(document.users),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    async fn persist(&self, users: &[UserRecord]) -> Result<(), StoreError> {
        #[derive(Serialize)]
        struct DocumentRef<'a> {
            users: &'a [UserRecord],
        }

        let payload = serde_json::to_vec_pretty(&DocumentRef { users })?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, payload).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl UserStore for JsonFileUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let key = normalize_email(email);
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|user| normalize_email(&user.email) == key)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|user| user.id == id).cloned())
    }

    async fn insert(&self, record: UserRecord) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        let key = normalize_email(&record.email);
        if users.iter().any(|user| normalize_email(&user.email) == key) {
            return Err(StoreError::UserExists);
        }
        users.push(record);
        if let Err(err) = self.persist(&users).await {
            users.pop();
            return Err(err);
        }
        Ok(())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.read().await.len())
    }

    fn status(&self) -> StoreStatus {
        StoreStatus::Connected
    }
}

pub struct UnavailableUserStore {
    reason: String,
}

impl UnavailableUserStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    fn error(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

#[async_trait]
impl UserStore for UnavailableUserStore {
    async fn find_by_email(&self, _email: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(self.error())
    }

    async fn find_by_id(&self, _id: &str) -> Result<Option<UserRecord>, StoreError> {
        Err(self.error())
    }

    async fn insert(&self, _record: UserRecord) -> Result<(), StoreError> {
        Err(self.error())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Err(self.error())
    }

    fn status(&self) -> StoreStatus {
        StoreStatus::Unavailable
    }
}

#[cfg(test)]
mod tests {
    use rover_telemetry_core::model::Role;

    use super::*;

    fn record(id: &str, email: &str) -> UserRecord {
        UserRecord {
            id: id.to_string(),
            username: id.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$stub".to_string(),
            role: Role::Operator,
            created_at_ms: 1,
        }
    }

    #[tokio::test]
    async fn memory_store_rejects_duplicate_email() {
        let store = MemoryUserStore::default();
        store.insert(record("a", "ops@rover.io")).await.unwrap();
        let err = store.insert(record("b", "OPS@rover.io")).await.unwrap_err();
        assert!(matches!(err, StoreError::UserExists));
        assert_eq!(store.count().await.unwrap(), 1);
        let found = store.find_by_email("ops@rover.io").await.unwrap().unwrap();
        assert_eq!(found.id, "a");
        assert_eq!(store.find_by_id("a").await.unwrap().unwrap().email, "ops@rover.io");
        assert!(store.find_by_id("b").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn json_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("users.json");
        {
            let store = JsonFileUserStore::open(&path).await.unwrap();
            store.insert(record("a", "a@rover.io")).await.unwrap();
            store.insert(record("b", "b@rover.io")).await.unwrap();
        }
        let reopened = JsonFileUserStore::open(&path).await.unwrap();
        assert_eq!(reopened.count().await.unwrap(), 2);
        assert_eq!(
            reopened.find_by_email("b@rover.io").await.unwrap().unwrap().id,
            "b"
        );
    }

    #[tokio::test]
    async fn json_store_duplicate_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        let store = JsonFileUserStore::open(&path).await.unwrap();
        store.insert(record("a", "a@rover.io")).await.unwrap();
        let before = std::fs::read(&path).unwrap();
        assert!(matches!(
            store.insert(record("z", "a@rover.io")).await,
            Err(StoreError::UserExists)
        ));
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn corrupt_document_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            JsonFileUserStore::open(&path).await,
            Err(StoreError::Corrupt(_))
        ));
    }

    #[tokio::test]
    async fn open_user_store_degrades_to_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.json");
        std::fs::write(&path, "[1, 2, 3]").unwrap();
        let store = open_user_store(&UserStoreConfig::JsonFile(path)).await;
        assert_eq!(store.status(), StoreStatus::Unavailable);
        assert!(matches!(
            store.find_by_email("a@rover.io").await,
            Err(StoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn open_user_store_defaults_to_memory() {
        let store = open_user_store(&UserStoreConfig::Memory).await;
        assert_eq!(store.status(), StoreStatus::Connected);
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn unreachable_mongo_degrades_to_unavailable() {
        let config = UserStoreConfig::Mongo(
            "mongodb://127.0.0.1:1/rover?serverSelectionTimeoutMS=200".to_string(),
        );
        let store = open_user_store(&config).await;
        assert_eq!(store.status(), StoreStatus::Unavailable);
        assert!(matches!(store.count().await, Err(StoreError::Unavailable(_))));

        let store = open_user_store(&UserStoreConfig::Mongo("not a uri".to_string())).await;
        assert_eq!(store.status(), StoreStatus::Unavailable);
    }
}
