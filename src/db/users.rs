use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Change, StoreError, UserStore};
use crate::models::{NewUser, Role, User};

const USER_COLUMNS: &str = "id, email, password_hash, role, created_at";

/// Lock every admin row plus the target, then decide whether the target may
/// lose its admin role. Concurrent callers queue on the row locks, so the
/// second one sees the first one's write. Returns `None` when the write may
/// proceed.
async fn check_last_admin(
    tx: &mut Transaction<'static, Postgres>,
    id: Uuid,
) -> Result<Option<Change>, StoreError> {
    let admins: Vec<Uuid> =
        sqlx::query_scalar("SELECT id FROM users WHERE role = 'admin' ORDER BY id FOR UPDATE")
            .fetch_all(&mut **tx)
            .await?;

    let target: Option<String> =
        sqlx::query_scalar("SELECT role FROM users WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;

    Ok(match target {
        None => Some(Change::Missing),
        Some(role) if role == Role::Admin.as_str() && admins.len() <= 1 => {
            Some(Change::LastAdmin)
        }
        Some(_) => None,
    })
}

/// PostgreSQL-backed store. Uniqueness comes from the `users.email` index.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, role, created_at)
             VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::now_v7())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at, id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Change, StoreError> {
        if role == Role::Admin {
            let result = sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
                .bind(id)
                .bind(role.as_str())
                .execute(&self.pool)
                .await?;
            return Ok(if result.rows_affected() > 0 {
                Change::Applied
            } else {
                Change::Missing
            });
        }

        let mut tx = self.pool.begin().await?;
        if let Some(blocked) = check_last_admin(&mut tx, id).await? {
            return Ok(blocked);
        }
        sqlx::query("UPDATE users SET role = $2 WHERE id = $1")
            .bind(id)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Change::Applied)
    }

    async fn delete(&self, id: Uuid) -> Result<Change, StoreError> {
        let mut tx = self.pool.begin().await?;
        if let Some(blocked) = check_last_admin(&mut tx, id).await? {
            return Ok(blocked);
        }
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Change::Applied)
    }

    async fn count_by_role(&self, role: Role) -> Result<i64, StoreError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_one(&self.pool)
            .await?;
        Ok(row.0)
    }
}
