//! In-memory user store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use visitdesk_core::error::AppError;
use visitdesk_core::result::AppResult;
use visitdesk_core::types::{PageRequest, PageResponse};
use visitdesk_entity::user::{CreateUser, UpdateUser, User, UserRole, UserStatus};

use crate::store::UserStore;

/// User store held in a process-local map.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    async fn modify<T>(&self, id: Uuid, f: impl FnOnce(&mut User) -> T) -> AppResult<T> {
        let mut map = self.users.write().await;
        let user = map
            .get_mut(&id)
            .ok_or_else(|| AppError::not_found(format!("User {id} not found")))?;
        let out = f(user);
        user.updated_at = Utc::now();
        Ok(out)
    }
}

fn same(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create(&self, data: CreateUser) -> AppResult<User> {
        let mut map = self.users.write().await;
        if map.values().any(|u| same(&u.username, &data.username)) {
            return Err(AppError::conflict(format!(
                "Username '{}' is already taken",
                data.username
            )));
        }
        if let Some(email) = &data.email {
            if map
                .values()
                .any(|u| u.email.as_deref().is_some_and(|e| same(e, email)))
            {
                return Err(AppError::conflict(format!(
                    "Email '{email}' is already registered"
                )));
            }
        }
        let user = User::from_create(data, Utc::now());
        map.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| same(&u.username, username))
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|u| u.email.as_deref().is_some_and(|e| same(e, email)))
            .cloned())
    }

    async fn list(&self, page: &PageRequest) -> AppResult<PageResponse<User>> {
        let mut all = self.find_all().await?;
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(PageResponse::from_vec(all, page))
    }

    async fn find_all(&self) -> AppResult<Vec<User>> {
        Ok(self.users.read().await.values().cloned().collect())
    }

    async fn update_profile(&self, id: Uuid, data: &UpdateUser) -> AppResult<User> {
        self.modify(id, |u| {
            if data.email.is_some() {
                u.email = data.email.clone();
            }
            if data.display_name.is_some() {
                u.display_name = data.display_name.clone();
            }
            if data.job_title.is_some() {
                u.job_title = data.job_title.clone();
            }
            u.clone()
        })
        .await
    }

    async fn update_role(&self, id: Uuid, role: UserRole) -> AppResult<User> {
        self.modify(id, |u| {
            u.role = role;
            u.clone()
        })
        .await
    }

    async fn update_status(&self, id: Uuid, status: UserStatus) -> AppResult<User> {
        self.modify(id, |u| {
            u.status = status;
            if status == UserStatus::Active {
                u.failed_login_attempts = 0;
                u.locked_until = None;
            }
            u.clone()
        })
        .await
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        self.modify(id, |u| u.password_hash = password_hash.to_string())
            .await
    }

    async fn record_failed_login(&self, id: Uuid) -> AppResult<i32> {
        self.modify(id, |u| {
            u.failed_login_attempts += 1;
            u.failed_login_attempts
        })
        .await
    }

    async fn lock_until(&self, id: Uuid, until: DateTime<Utc>) -> AppResult<()> {
        self.modify(id, |u| u.locked_until = Some(until)).await
    }

    async fn record_login(&self, id: Uuid) -> AppResult<()> {
        self.modify(id, |u| {
            u.failed_login_attempts = 0;
            u.locked_until = None;
            u.last_login_at = Some(Utc::now());
        })
        .await
    }

    async fn delete(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.users.write().await.remove(&id).is_some())
    }

    async fn count(&self) -> AppResult<u64> {
        Ok(self.users.read().await.len() as u64)
    }

    async fn count_active_by_role(&self, role: UserRole) -> AppResult<u64> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .filter(|u| u.role == role && u.status == UserStatus::Active)
            .count() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitdesk_core::error::ErrorKind;

    fn create(name: &str) -> CreateUser {
        CreateUser {
            username: name.into(),
            email: Some(format!("{name}@example.org")),
            password_hash: "hash".into(),
            display_name: None,
            job_title: None,
            role: UserRole::Staff,
            created_by: None,
        }
    }

    #[tokio::test]
    async fn username_is_unique_case_insensitively() {
        let store = MemoryUserStore::new();
        store.create(create("desk")).await.unwrap();
        let err = store.create(create("DESK")).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(store.find_by_username("Desk").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn failed_logins_accumulate_and_reset() {
        let store = MemoryUserStore::new();
        let user = store.create(create("desk")).await.unwrap();
        assert_eq!(store.record_failed_login(user.id).await.unwrap(), 1);
        assert_eq!(store.record_failed_login(user.id).await.unwrap(), 2);
        store.record_login(user.id).await.unwrap();
        let user = store.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.failed_login_attempts, 0);
        assert!(user.last_login_at.is_some());
    }

    #[tokio::test]
    async fn modify_missing_user_is_not_found() {
        let store = MemoryUserStore::new();
        let err = store
            .update_role(Uuid::new_v4(), UserRole::Admin)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }
}
