use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use super::UserStore;
use crate::models::User;
use crate::utils::{AppError, AppResult};

/// In-process user store with the same uniqueness rules as the MongoDB indexes.
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, User>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.users.lock().unwrap().len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let users = self.users.lock().unwrap();
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: &str) -> AppResult<Option<User>> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        let taken = users
            .values()
            .any(|u| u.email == user.email || u.username == user.username);
        if taken || users.contains_key(&user.user_id) {
            return Err(AppError::Conflict("User already exists".to_string()));
        }
        users.insert(user.user_id.clone(), user.clone());
        Ok(())
    }

    async fn set_profile_picture(&self, user_id: &str, path: Option<&str>) -> AppResult<bool> {
        let mut users = self.users.lock().unwrap();
        match users.get_mut(user_id) {
            Some(user) => {
                user.profile_picture = path.map(str::to_string);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str) -> AppResult<bool> {
        Ok(self.users.lock().unwrap().remove(user_id).is_some())
    }
}
