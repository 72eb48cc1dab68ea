// MongoDB-backed user store; records live in the `users` collection keyed by a unique email index.

use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::{ClientOptions, IndexOptions};
use mongodb::{Client, Collection, IndexModel};
use tracing::debug;

use super::store::{StoreStatus, UserStore};
use super::{normalize_email, UserRecord};
use crate::constants::{MONGO_CONNECT_TIMEOUT_MS, MONGO_DEFAULT_DATABASE};
use crate::error::StoreError;

const DUPLICATE_KEY: i32 = 11000;

pub struct MongoUserStore {
    users: Collection<UserRecord>,
}

impl MongoUserStore {
    /// Connects, pings the server and ensures the email index exists.
    pub async fn connect(uri: &str) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(uri).await?;
        if options.server_selection_timeout.is_none() {
            options.server_selection_timeout =
                Some(Duration::from_millis(MONGO_CONNECT_TIMEOUT_MS));
        }
        let client = Client::with_options(options)?;
        let database = client
            .default_database()
            .unwrap_or_else(|| client.database(MONGO_DEFAULT_DATABASE));
        database.run_command(doc! { "ping": 1 }, None).await?;
        debug!(database = database.name(), "mongodb ping ok");

        let users = database.collection::<UserRecord>("users");
        let unique_email = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(unique_email, None).await?;
        Ok(Self { users })
    }
}

fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let filter = doc! { "email": normalize_email(email) };
        Ok(self.users.find_one(filter, None).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.find_one(doc! { "id": id }, None).await?)
    }

    async fn insert(&self, mut record: UserRecord) -> Result<(), StoreError> {
        record.email = normalize_email(&record.email);
        match self.users.insert_one(&record, None).await {
            Ok(_) => Ok(()),
            Err(err) if is_duplicate_key(&err) => Err(StoreError::UserExists),
            Err(err) => Err(err.into()),
        }
    }

    async fn count(&self) -> Result<usize, StoreError> {
        let count = self.users.count_documents(None, None).await?;
        Ok(count as usize)
    }

    fn status(&self) -> StoreStatus {
        StoreStatus::Connected
    }
}
