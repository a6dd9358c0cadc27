//! In-memory user store and a ready-made service
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, SubsecRound, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use users_service::config::JwtConfig;
use users_service::db::UserStore;
use users_service::models::User;
use users_service::security::JwtManager;
use users_service::services::UserService;
use uuid::Uuid;

pub const TEST_SECRET: &str = "users-service-test-secret";

/// Name uniqueness and the conditional password update are checked under
/// one lock, as the unique index and `WHERE` clause do in PostgreSQL
#[derive(Default)]
pub struct InMemoryUserStore {
    users: Mutex<Vec<User>>,
    pub unavailable: AtomicBool,
}

impl InMemoryUserStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.users.lock().len()
    }

    pub fn get(&self, user_name: &str) -> Option<User> {
        self.users
            .lock()
            .iter()
            .find(|u| u.user_name == user_name)
            .cloned()
    }

    pub fn remove(&self, user_name: &str) {
        self.users.lock().retain(|u| u.user_name != user_name);
    }

    fn check(&self) -> Result<(), sqlx::Error> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(sqlx::Error::PoolTimedOut);
        }
        Ok(())
    }
}

fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create_if_absent(
        &self,
        user_name: &str,
        password_hash: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        let mut users = self.users.lock();
        if users.iter().any(|u| u.user_name == user_name) {
            return Ok(None);
        }

        let user = User {
            id: Uuid::new_v4(),
            user_name: user_name.to_string(),
            password_hash: password_hash.to_string(),
            password_changed_at: now(),
            created_at: now(),
        };
        users.push(user.clone());
        Ok(Some(user))
    }

    async fn find_by_user_name(&self, user_name: &str) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self.get(user_name))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        Ok(self.users.lock().iter().find(|u| u.id == id).cloned())
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: &str,
        changed_at: DateTime<Utc>,
    ) -> Result<Option<User>, sqlx::Error> {
        self.check()?;
        let mut users = self.users.lock();
        let user = match users
            .iter_mut()
            .find(|u| u.id == id && u.password_changed_at == changed_at)
        {
            Some(user) => user,
            None => return Ok(None),
        };

        user.password_hash = password_hash.to_string();
        user.password_changed_at = now().max(changed_at + Duration::microseconds(1));
        Ok(Some(user.clone()))
    }

    async fn ping(&self) -> Result<(), sqlx::Error> {
        self.check()
    }
}

pub fn jwt() -> JwtManager {
    JwtManager::new(&JwtConfig {
        secret: TEST_SECRET.to_string(),
        access_ttl_secs: 7_200,
        reset_ttl_secs: 900,
    })
}

pub fn service() -> (Arc<InMemoryUserStore>, UserService) {
    let store = InMemoryUserStore::new();
    let service = UserService::new(store.clone(), jwt());
    (store, service)
}
