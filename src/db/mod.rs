pub mod memory;
pub mod users;

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{NewUser, Role, User};

pub use memory::MemoryUserStore;
pub use users::PgUserStore;

#[derive(Debug)]
pub enum StoreError {
    /// The email is already taken.
    Duplicate,
    Database(sqlx::Error),
    /// A stored record could not be turned back into a `User`.
    Corrupt(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Duplicate => write!(f, "duplicate email"),
            StoreError::Database(err) => write!(f, "database error: {err}"),
            StoreError::Corrupt(msg) => write!(f, "corrupt record: {msg}"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::Duplicate
            }
            sqlx::Error::ColumnDecode { .. } => StoreError::Corrupt(err.to_string()),
            _ => StoreError::Database(err),
        }
    }
}

/// Result of a write that may not leave the system without an admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Applied,
    /// No user has this id.
    Missing,
    /// The target is the only admin; nothing was written.
    LastAdmin,
}

/// Persistence for user records. Emails are unique; implementations must
/// reject a second insert with the same email with `StoreError::Duplicate`
/// even when the two inserts race. Neither `set_role` nor `delete` may remove
/// the last admin, including when two such writes race.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// All users, oldest first.
    async fn list(&self) -> Result<Vec<User>, StoreError>;

    /// Taking the admin role away from the last admin is refused with
    /// `Change::LastAdmin`. The check and the write are one atomic step.
    async fn set_role(&self, id: Uuid, role: Role) -> Result<Change, StoreError>;

    /// Same last-admin rule as `set_role`.
    async fn delete(&self, id: Uuid) -> Result<Change, StoreError>;

    async fn count_by_role(&self, role: Role) -> Result<i64, StoreError>;
}
