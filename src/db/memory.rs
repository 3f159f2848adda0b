use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{Change, StoreError, UserStore};
use crate::models::{NewUser, Role, User};

/// Process-local store. Records are lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<Uuid, User>,
    /// email -> id; the entry lock on this map serializes inserts per email.
    emails: DashMap<String, Uuid>,
    /// Held across the last-admin check and the write that follows it.
    admin_writes: Mutex<()>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_last_admin(&self, id: Uuid) -> Option<Change> {
        let target_is_admin = self.users.get(&id)?.is_admin();
        let admins = self.users.iter().filter(|u| u.is_admin()).count();
        (target_is_admin && admins <= 1).then_some(Change::LastAdmin)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let created = User {
                    id: Uuid::now_v7(),
                    email: user.email,
                    password_hash: user.password_hash,
                    role: user.role,
                    created_at: Utc::now(),
                };
                self.users.insert(created.id, created.clone());
                slot.insert(created.id);
                Ok(created)
            }
        }
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&id).map(|u| u.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let Some(id) = self.emails.get(email).map(|e| *e.value()) else {
            return Ok(None);
        };
        self.find_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.iter().map(|u| u.value().clone()).collect();
        users.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(users)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Change, StoreError> {
        let _guard = self.admin_writes.lock().unwrap_or_else(|e| e.into_inner());
        if role != Role::Admin {
            if let Some(blocked) = self.check_last_admin(id) {
                return Ok(blocked);
            }
        }
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.role = role;
                Ok(Change::Applied)
            }
            None => Ok(Change::Missing),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<Change, StoreError> {
        let _guard = self.admin_writes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(blocked) = self.check_last_admin(id) {
            return Ok(blocked);
        }
        let Some((_, user)) = self.users.remove(&id) else {
            return Ok(Change::Missing);
        };
        self.emails.remove(&user.email);
        Ok(Change::Applied)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, StoreError> {
        Ok(self.users.iter().filter(|u| u.role == role).count() as i64)
    }
}
