use async_trait::async_trait;
use mongodb::bson::doc;
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::Collection;

use super::{MongoDB, USERS_COLLECTION};
use crate::models::User;
use crate::utils::{AppError, AppResult};

const DUPLICATE_KEY: i32 = 11000;

/// Persistence seam for user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>>;

    /// Fails with `Conflict` when email or username is already taken.
    async fn insert(&self, user: &User) -> AppResult<()>;

    /// Returns false when no user matched.
    async fn set_profile_picture(&self, user_id: &str, path: Option<&str>) -> AppResult<bool>;

    /// Returns false when no user matched.
    async fn delete(&self, user_id: &str) -> AppResult<bool>;

    /// Backing store reachability.
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

pub struct MongoUserStore {
    db: MongoDB,
    users: Collection<User>,
}

impl MongoUserStore {
    pub fn new(db: MongoDB) -> Self {
        let users = db.collection::<User>(USERS_COLLECTION);
        Self { db, users }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) if write_error.code == DUPLICATE_KEY
    )
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self.users.find_one(doc! { "username": username }).await?)
    }

    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.find_one(doc! { "user_id": user_id }).await?)
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        // Uniqueness relies on the indexes
        self.db.ready().await?;

        match self.users.insert_one(user).await {
            Ok(_) => Ok(()),
            // Lost a race against a concurrent registration
            Err(e) if is_duplicate_key(&e) => {
                Err(AppError::Conflict("User already exists".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn set_profile_picture(&self, user_id: &str, path: Option<&str>) -> AppResult<bool> {
        let result = self
            .users
            .update_one(
                doc! { "user_id": user_id },
                doc! { "$set": { "profile_picture": path } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, user_id: &str) -> AppResult<bool> {
        let result = self.users.delete_one(doc! { "user_id": user_id }).await?;
        Ok(result.deleted_count > 0)
    }

    async fn ping(&self) -> AppResult<()> {
        self.db.ping().await?;
        self.db.ready().await
    }
}
