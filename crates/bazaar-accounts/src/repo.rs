//! Repository contracts for users and goods, with in-memory backends.
//!
//! The relational schema lives outside this workspace; anything that
//! implements these traits can back the usecases.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bazaar_core::{ActiveWindow, BazaarError, Good, Result, User};
use uuid::Uuid;

#[async_trait]
pub trait UserRepo: Send + Sync {
    async fn add_nonactive(&self, user: User) -> Result<User>;
    async fn activate(&self, id: Uuid) -> Result<User>;
    async fn is_mail_used(&self, email: &str) -> Result<bool>;
    async fn is_telegram_used(&self, telegram: &str) -> Result<bool>;
    async fn get_user(&self, id: Uuid) -> Result<User>;
    async fn get_by_username(&self, username: &str) -> Result<User>;
    async fn update_user_info(
        &self,
        id: Uuid,
        name: Option<String>,
        active_time: Option<ActiveWindow>,
    ) -> Result<User>;
    async fn update_user(&self, user: User) -> Result<User>;
}

#[async_trait]
pub trait GoodRepo: Send + Sync {
    async fn get_good(&self, id: Uuid) -> Result<Good>;
}

fn lock_err<T>(e: std::sync::PoisonError<T>) -> BazaarError {
    BazaarError::Other(format!("Lock: {e}"))
}

#[derive(Default)]
pub struct MemoryUserRepo {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepo for MemoryUserRepo {
    async fn add_nonactive(&self, mut user: User) -> Result<User> {
        let mut users = self.users.lock().map_err(lock_err)?;
        if users.values().any(|u| u.name == user.name) {
            return Err(BazaarError::Validation(format!("username '{}' is taken", user.name)));
        }
        user.active = false;
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn activate(&self, id: Uuid) -> Result<User> {
        let mut users = self.users.lock().map_err(lock_err)?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| BazaarError::UserNotFound(id.to_string()))?;
        user.active = true;
        Ok(user.clone())
    }

    async fn is_mail_used(&self, email: &str) -> Result<bool> {
        let users = self.users.lock().map_err(lock_err)?;
        Ok(users
            .values()
            .any(|u| u.email.as_deref().is_some_and(|e| e.eq_ignore_ascii_case(email))))
    }

    async fn is_telegram_used(&self, telegram: &str) -> Result<bool> {
        let users = self.users.lock().map_err(lock_err)?;
        Ok(users.values().any(|u| u.telegram.as_deref() == Some(telegram)))
    }

    async fn get_user(&self, id: Uuid) -> Result<User> {
        self.users
            .lock()
            .map_err(lock_err)?
            .get(&id)
            .cloned()
            .ok_or_else(|| BazaarError::UserNotFound(id.to_string()))
    }

    async fn get_by_username(&self, username: &str) -> Result<User> {
        self.users
            .lock()
            .map_err(lock_err)?
            .values()
            .find(|u| u.name == username)
            .cloned()
            .ok_or_else(|| BazaarError::UserNotFound(username.to_string()))
    }

    async fn update_user_info(
        &self,
        id: Uuid,
        name: Option<String>,
        active_time: Option<ActiveWindow>,
    ) -> Result<User> {
        let mut users = self.users.lock().map_err(lock_err)?;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| BazaarError::UserNotFound(id.to_string()))?;
        if let Some(name) = name {
            user.name = name;
        }
        if active_time.is_some() {
            user.active_time = active_time;
        }
        Ok(user.clone())
    }

    async fn update_user(&self, user: User) -> Result<User> {
        let mut users = self.users.lock().map_err(lock_err)?;
        if !users.contains_key(&user.id) {
            return Err(BazaarError::UserNotFound(user.id.to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[derive(Default)]
pub struct MemoryGoodRepo {
    goods: Mutex<HashMap<Uuid, Good>>,
}

impl MemoryGoodRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, good: Good) -> Result<()> {
        self.goods.lock().map_err(lock_err)?.insert(good.id, good);
        Ok(())
    }
}

#[async_trait]
impl GoodRepo for MemoryGoodRepo {
    async fn get_good(&self, id: Uuid) -> Result<Good> {
        self.goods
            .lock()
            .map_err(lock_err)?
            .get(&id)
            .cloned()
            .ok_or_else(|| BazaarError::GoodNotFound(id.to_string()))
    }
}
